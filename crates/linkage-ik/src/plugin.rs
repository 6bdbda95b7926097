//! Bevy ECS integration for the FABRIK solver.
//!
//! Provides [`LinkageIkPlugin`] which builds the [`IkChain`] resource from
//! [`LinkageConfig`] at startup and solves it toward [`IkTarget`] every frame.
//!
//! # Usage
//!
//! 1. Add [`LinkageCorePlugin`](linkage_core::LinkageCorePlugin) and
//!    [`LinkageIkPlugin`] to your app.
//! 2. Optionally insert your own [`IkChain`] before the first update.
//! 3. Write [`IkTarget`] from input code; read [`IkChain`] from render code.
//!
//! The solve system runs in [`LinkageSet::Solve`], after input and before
//! rendering.
//!
//! An invalid [`LinkageConfig`] at startup panics. Later changes to the
//! solver section are validated before they take effect; a rejected change
//! is logged and the previous solver is kept.

use bevy::prelude::*;
use nalgebra::Point2;

use linkage_core::LinkageSet;
use linkage_core::config::LinkageConfig;
use linkage_core::error::ConfigError;
use linkage_core::types::IkTarget;

use crate::chain::Chain;
use crate::solver::{FabrikSolver, IkResult, SolveBranch};

/// Bevy plugin that solves the chain each frame.
pub struct LinkageIkPlugin;

impl Plugin for LinkageIkPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (init_chain_system, seed_target_system).chain())
            .add_systems(
                Update,
                (
                    sync_solver_system.run_if(resource_changed::<LinkageConfig>),
                    ik_solve_system,
                )
                    .chain()
                    .in_set(LinkageSet::Solve),
            );
    }
}

/// The solved chain plus the report of its latest solve.
#[derive(Resource, Debug, Clone)]
pub struct IkChain {
    /// The chain (positions updated in place every frame).
    pub chain: Chain,
    /// Result of the most recent solve, `None` before the first one.
    pub last_result: Option<IkResult>,
}

impl IkChain {
    /// Wrap a chain that has not been solved yet.
    pub const fn new(chain: Chain) -> Self {
        Self {
            chain,
            last_result: None,
        }
    }
}

/// The validated solver used by [`ik_solve_system`].
#[derive(Resource, Debug, Clone, Default)]
pub struct IkSolver(pub FabrikSolver);

/// Startup system: validate [`LinkageConfig`], insert [`IkSolver`] and build
/// [`IkChain`] unless one was inserted already.
///
/// # Panics
///
/// Panics if the configuration is invalid.
#[allow(clippy::needless_pass_by_value)]
pub fn init_chain_system(
    mut commands: Commands,
    config: Res<LinkageConfig>,
    existing: Option<Res<IkChain>>,
) {
    if let Err(e) = config.validate() {
        panic!("linkage-ik: invalid configuration: {e}");
    }
    commands.insert_resource(IkSolver(FabrikSolver::new(config.solver.clone())));

    if existing.is_some() {
        return;
    }

    match Chain::from_config(&config.chain) {
        Ok(chain) => {
            debug!(
                "linkage-ik: built chain of {} segments, reach {:.1}",
                chain.segment_count(),
                chain.total_reach()
            );
            commands.insert_resource(IkChain::new(chain));
        }
        Err(e) => panic!("linkage-ik: invalid configuration: {e}"),
    }
}

/// System that picks up solver changes in [`LinkageConfig`].
///
/// Invalid changes are logged and ignored.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_solver_system(config: Res<LinkageConfig>, solver: Option<ResMut<IkSolver>>) {
    let Some(mut solver) = solver else {
        return;
    };
    if solver.0.config() == &config.solver {
        return;
    }

    match config.solver.validate() {
        Ok(()) => {
            debug!("linkage-ik: solver configuration updated");
            solver.0 = FabrikSolver::new(config.solver.clone());
        }
        Err(e) => error!("linkage-ik: keeping previous solver, rejected configuration: {e}"),
    }
}

/// Startup system: point an unset target at the current end effector so the
/// chain starts at rest.
#[allow(clippy::needless_pass_by_value)]
pub fn seed_target_system(chain: Option<Res<IkChain>>, mut target: ResMut<IkTarget>) {
    if target.is_set() {
        return;
    }
    if let Some(chain) = chain {
        target.set(chain.chain.end_effector());
    }
}

/// System that moves the chain toward the current target.
///
/// Skips the frame when there is no chain, solver or target. Logs only when
/// the solve branch changes, so a steady drag does not flood the log.
#[allow(clippy::needless_pass_by_value)]
pub fn ik_solve_system(
    solver: Option<Res<IkSolver>>,
    target: Res<IkTarget>,
    chain: Option<ResMut<IkChain>>,
) {
    let (Some(solver), Some(mut ik_chain)) = (solver, chain) else {
        return;
    };
    let Some(point) = target.get() else {
        return;
    };

    let result = solver.0.solve(&mut ik_chain.chain, point);

    let previous = ik_chain.last_result.map(|r| r.branch);
    if previous != Some(result.branch) {
        match result.branch {
            SolveBranch::InvalidTarget => {
                warn!("linkage-ik: ignoring non-finite target ({}, {})", point.x, point.y);
            }
            SolveBranch::Unreachable => debug!(
                "linkage-ik: target ({:.1}, {:.1}) out of reach {:.1}, stretching",
                point.x,
                point.y,
                ik_chain.chain.total_reach()
            ),
            SolveBranch::Reachable => debug!(
                "linkage-ik: target ({:.1}, {:.1}) in reach, error {:.3} after {} sweeps",
                point.x, point.y, result.error, result.iterations
            ),
        }
    }

    ik_chain.last_result = Some(result);
}

/// Convenience: build a chain from config and solve it once, without the ECS.
///
/// # Errors
///
/// Returns the chain configuration's validation error.
pub fn solve_chain(
    config: &LinkageConfig,
    target: Point2<f64>,
) -> Result<(Chain, IkResult), ConfigError> {
    config.solver.validate()?;
    let mut chain = Chain::from_config(&config.chain)?;
    let result = FabrikSolver::new(config.solver.clone()).solve(&mut chain, target);
    Ok((chain, result))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
