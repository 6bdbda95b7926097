//! FABRIK (Forward And Backward Reaching Inverse Kinematics) solver.
//!
//! Moves the chain's joints along straight lines so the end effector reaches
//! a target while every segment keeps its length. Targets beyond the chain's
//! reach get a straight stretch along the base-to-target bearing instead.

use nalgebra::{Point2, Vector2};

use linkage_core::config::FabrikConfig;

use crate::chain::Chain;

/// Distances at or below this are treated as coincident joints.
const DEGENERATE_DISTANCE: f64 = 1e-9;

/// Perpendicular joint offset, relative to the total reach, below which a
/// chain counts as straight.
const STRAIGHT_EPSILON: f64 = 1e-9;

/// Target offset from a straight chain's line, as a fraction of the shortest
/// segment, within which the sweeps cannot fold the chain in time.
const ON_LINE_FRACTION: f64 = 0.25;

/// Which path a solve took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveBranch {
    /// Target within reach: FABRIK sweeps, or a straight pose when the
    /// target is within tolerance of the reach.
    ///
    /// Just inside that band the chain is nearly straight and the sweeps
    /// close the gap slowly, so a solve from a distant pose may end with
    /// `converged == false`; the next solves keep closing in.
    Reachable,
    /// Target beyond reach: the chain was stretched toward it.
    Unreachable,
    /// Target had a non-finite coordinate; the chain was not touched.
    InvalidTarget,
}

/// Report of a single solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IkResult {
    /// Path taken.
    pub branch: SolveBranch,
    /// Whether the end effector ended within tolerance of the target.
    pub converged: bool,
    /// Backward/forward sweep pairs performed.
    pub iterations: u32,
    /// Final end-effector distance to the target.
    pub error: f64,
}

/// FABRIK solver.
#[derive(Debug, Clone, Default)]
pub struct FabrikSolver {
    config: FabrikConfig,
}

impl FabrikSolver {
    /// Create a new solver with the given configuration.
    pub const fn new(config: FabrikConfig) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(FabrikConfig::default())
    }

    /// Solver configuration.
    pub const fn config(&self) -> &FabrikConfig {
        &self.config
    }

    /// Move `chain` toward `target` in place.
    ///
    /// The chain's current pose is the warm start; calling this again with
    /// the same target after convergence leaves the pose unchanged. Never
    /// writes a non-finite coordinate.
    pub fn solve(&self, chain: &mut Chain, target: Point2<f64>) -> IkResult {
        if !is_finite(&target) {
            return IkResult {
                branch: SolveBranch::InvalidTarget,
                converged: false,
                iterations: 0,
                error: f64::INFINITY,
            };
        }

        let tolerance = self.config.tolerance;
        let base = chain.base();
        let reach = chain.total_reach();
        let distance = nalgebra::distance(&base, &target);

        if distance > reach {
            stretch_toward(chain, target);
            return Self::report(SolveBranch::Unreachable, chain, target, tolerance, 0);
        }

        // On the reach boundary only the straight pose gets within tolerance,
        // and the sweeps approach it too slowly to get there in time.
        if distance >= reach - tolerance {
            stretch_toward(chain, target);
            return Self::report(SolveBranch::Reachable, chain, target, tolerance, 0);
        }

        chain.joints_mut()[0].position = base;
        let mut error = end_effector_error(chain, target);

        if error > tolerance {
            if let Some(offset) = stalling_offset(chain, target) {
                bow(chain, self.config.bow, offset);
            }
        }

        let mut iterations = 0;
        while error > tolerance && iterations < self.config.max_iterations {
            iterations += 1;
            backward_pass(chain, target);
            forward_pass(chain);
            error = end_effector_error(chain, target);
        }

        Self::report(SolveBranch::Reachable, chain, target, tolerance, iterations)
    }

    fn report(
        branch: SolveBranch,
        chain: &Chain,
        target: Point2<f64>,
        tolerance: f64,
        iterations: u32,
    ) -> IkResult {
        let error = end_effector_error(chain, target);
        IkResult {
            branch,
            converged: error <= tolerance,
            iterations,
            error,
        }
    }
}

/// Solve with the default configuration (10 sweeps, tolerance 0.5).
pub fn solve(chain: &mut Chain, target: Point2<f64>) -> IkResult {
    FabrikSolver::with_defaults().solve(chain, target)
}

fn is_finite(point: &Point2<f64>) -> bool {
    point.coords.iter().all(|c| c.is_finite())
}

/// End-effector distance to the target; infinite if the chain is corrupt.
fn end_effector_error(chain: &Chain, target: Point2<f64>) -> f64 {
    let error = nalgebra::distance(&chain.end_effector(), &target);
    if error.is_finite() {
        error
    } else {
        f64::INFINITY
    }
}

/// Bearing from `from` to `to`, or +x (0) when the direction is undefined.
fn bearing(from: Point2<f64>, to: Point2<f64>) -> f64 {
    let delta = to - from;
    let length = delta.norm();
    if length.is_finite() && length > DEGENERATE_DISTANCE {
        delta.y.atan2(delta.x)
    } else {
        0.0
    }
}

/// Place `current` exactly `length` from `anchor`, keeping its direction.
///
/// Coincident points fall back to +x.
fn rescale(anchor: Point2<f64>, current: Point2<f64>, length: f64) -> Point2<f64> {
    let delta = current - anchor;
    let distance = delta.norm();
    if distance.is_finite() && distance > DEGENERATE_DISTANCE {
        anchor + delta * (length / distance)
    } else {
        anchor + Vector2::x() * length
    }
}

/// Lay the chain out straight from the base along the bearing to `target`.
fn stretch_toward(chain: &mut Chain, target: Point2<f64>) {
    let base = chain.base();
    let (sin, cos) = bearing(base, target).sin_cos();
    let direction = Vector2::new(cos, sin);

    let joints = chain.joints_mut();
    joints[0].position = base;
    for i in 1..joints.len() {
        joints[i].position = joints[i - 1].position + direction * joints[i - 1].segment_length();
    }
}

/// Backward sweep: pin the end effector on the target and pull each joint
/// toward its successor.
fn backward_pass(chain: &mut Chain, target: Point2<f64>) {
    let joints = chain.joints_mut();
    let last = joints.len() - 1;
    joints[last].position = target;
    for i in (0..last).rev() {
        joints[i].position = rescale(
            joints[i + 1].position,
            joints[i].position,
            joints[i].segment_length(),
        );
    }
}

/// Forward sweep: pin joint 0 back on the base and push each joint out from
/// its predecessor.
fn forward_pass(chain: &mut Chain) {
    let base = chain.base();
    let joints = chain.joints_mut();
    joints[0].position = base;
    for i in 1..joints.len() {
        joints[i].position = rescale(
            joints[i - 1].position,
            joints[i].position,
            joints[i - 1].segment_length(),
        );
    }
}

/// Signed offset of `target` from the line of a straight chain (positive on
/// the left of the first segment), when the target is close enough to that
/// line for the sweeps to stall.
///
/// `None` if the chain is bent or the target is well off its line.
fn stalling_offset(chain: &Chain, target: Point2<f64>) -> Option<f64> {
    let joints = chain.joints();
    let origin = joints[0].position;
    let delta = joints[1].position - origin;
    let length = delta.norm();
    if !(length.is_finite() && length > DEGENERATE_DISTANCE) {
        return None;
    }
    let normal = Vector2::new(-delta.y, delta.x) / length;

    let slack = STRAIGHT_EPSILON * chain.total_reach();
    let straight = joints[2..]
        .iter()
        .all(|j| (j.position - origin).dot(&normal).abs() <= slack);
    if !straight {
        return None;
    }

    let offset = (target - origin).dot(&normal);
    let shortest = chain.segment_lengths().fold(f64::INFINITY, f64::min);
    (offset.abs() <= ON_LINE_FRACTION * shortest).then_some(offset)
}

/// Push the interior joints of a straight chain sideways into a shallow arc,
/// away from the side `target_offset` puts the target on (left when on the
/// line).
///
/// The base and end effector stay put; the next sweep restores lengths.
fn bow(chain: &mut Chain, amount: f64, target_offset: f64) {
    let joints = chain.joints_mut();
    let direction = joints[1].position - joints[0].position;
    let side = if target_offset > 0.0 { -1.0 } else { 1.0 };
    let normal = Vector2::new(-direction.y, direction.x).normalize() * side;
    let last = joints.len() - 1;

    #[allow(clippy::cast_precision_loss)]
    let span = last as f64;
    for (i, joint) in joints.iter_mut().enumerate().take(last).skip(1) {
        #[allow(clippy::cast_precision_loss)]
        let phase = std::f64::consts::PI * i as f64 / span;
        let offset = amount * joint.segment_length() * phase.sin();
        joint.position += normal * offset;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::build_chain;
    use approx::assert_relative_eq;

    fn segment_errors(chain: &Chain) -> Vec<f64> {
        let joints = chain.joints();
        joints
            .windows(2)
            .map(|pair| {
                (nalgebra::distance(&pair[0].position, &pair[1].position)
                    - pair[0].segment_length())
                .abs()
            })
            .collect()
    }

    fn max_segment_error(chain: &Chain) -> f64 {
        segment_errors(chain).into_iter().fold(0.0, f64::max)
    }

    /// Chain bent away from its straight start pose.
    fn bent_chain() -> Chain {
        let mut chain = build_chain(4, 50.0).unwrap();
        let result = solve(&mut chain, Point2::new(60.0, 90.0));
        assert!(result.converged);
        chain
    }

    #[test]
    fn reaches_target_straight_ahead() {
        let mut chain = build_chain(5, 80.0).unwrap();
        let target = Point2::new(100.0, 0.0);
        let result = solve(&mut chain, target);

        assert_eq!(result.branch, SolveBranch::Reachable);
        assert!(result.converged, "error={}", result.error);
        assert!(result.iterations <= 10);
        assert!(nalgebra::distance(&chain.end_effector(), &target) <= 0.5);
        assert!(max_segment_error(&chain) < 1e-9);
        assert_eq!(chain.joints()[0].position, Point2::origin());
    }

    #[test]
    fn reaches_off_axis_target() {
        let mut chain = build_chain(5, 80.0).unwrap();
        let target = Point2::new(0.0, 100.0);
        let result = solve(&mut chain, target);

        assert!(result.converged, "error={}", result.error);
        assert!(result.error <= 0.5);
        assert!(max_segment_error(&chain) < 1e-9);
    }

    #[test]
    fn reaches_target_at_base() {
        let mut chain = build_chain(5, 80.0).unwrap();
        let result = solve(&mut chain, Point2::origin());
        assert!(result.converged, "error={}", result.error);
        assert!(chain.is_finite());
    }

    #[test]
    fn reaches_target_behind_base() {
        let mut chain = build_chain(5, 80.0).unwrap();
        let result = solve(&mut chain, Point2::new(-100.0, 0.0));
        assert!(result.converged, "error={}", result.error);
        assert!(max_segment_error(&chain) < 1e-9);
    }

    #[test]
    fn unreachable_stretches_along_x() {
        let mut chain = build_chain(5, 80.0).unwrap();
        let result = solve(&mut chain, Point2::new(1000.0, 0.0));

        assert_eq!(result.branch, SolveBranch::Unreachable);
        assert_eq!(result.iterations, 0);
        assert!(!result.converged);
        assert_relative_eq!(result.error, 600.0, epsilon = 1e-9);

        let ee = chain.end_effector();
        assert_relative_eq!(ee.x, 400.0, epsilon = 1e-9);
        assert_relative_eq!(ee.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn unreachable_stretch_is_colinear_with_bearing() {
        let base = Point2::new(10.0, -20.0);
        let mut chain = Chain::from_lengths(base, &[30.0, 20.0, 10.0]).unwrap();
        let target = Point2::new(-200.0, 150.0);
        solve(&mut chain, target);

        let angle = (target.y - base.y).atan2(target.x - base.x);
        let direction = Vector2::new(angle.cos(), angle.sin());
        let mut along = 0.0;
        for (i, joint) in chain.joints().iter().enumerate() {
            let expected = base + direction * along;
            assert_relative_eq!(joint.position.x, expected.x, epsilon = 1e-9);
            assert_relative_eq!(joint.position.y, expected.y, epsilon = 1e-9);
            if i < chain.segment_count() {
                along += joint.segment_length();
            }
        }
        assert_relative_eq!(
            nalgebra::distance(&base, &chain.end_effector()),
            chain.total_reach(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn boundary_target_is_reached_straight() {
        let mut chain = build_chain(5, 80.0).unwrap();
        let target = Point2::new(0.0, 400.0);
        let result = solve(&mut chain, target);

        assert_eq!(result.branch, SolveBranch::Reachable);
        assert!(result.converged);
        assert!(result.error <= 0.5);
        assert!(max_segment_error(&chain) < 1e-9);
    }

    #[test]
    fn just_inside_boundary_is_reached() {
        let mut chain = bent_chain();
        let target = Point2::new(-120.0, -159.8);
        let result = solve(&mut chain, target);

        assert_eq!(result.branch, SolveBranch::Reachable);
        assert!(result.converged, "error={}", result.error);
        assert_relative_eq!(
            nalgebra::distance(&chain.base(), &chain.end_effector()),
            200.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn base_never_drifts() {
        let base = Point2::new(400.0, 300.0);
        let mut chain = Chain::from_lengths(base, &[80.0; 5]).unwrap();
        for target in [
            Point2::new(450.0, 350.0),
            Point2::new(2000.0, -5.0),
            Point2::new(400.0, 300.0),
            Point2::new(100.0, 300.0),
        ] {
            solve(&mut chain, target);
            assert_eq!(chain.joints()[0].position, base);
        }
    }

    #[test]
    fn converged_solve_is_idempotent() {
        let mut chain = build_chain(5, 80.0).unwrap();
        let target = Point2::new(100.0, 0.0);
        solve(&mut chain, target);
        let before = chain.end_effector();

        let second = solve(&mut chain, target);
        assert_eq!(second.iterations, 0);
        assert!(nalgebra::distance(&before, &chain.end_effector()) < 0.5);
    }

    #[test]
    fn unreachable_solve_is_idempotent() {
        let mut chain = build_chain(5, 80.0).unwrap();
        let target = Point2::new(300.0, 700.0);
        solve(&mut chain, target);
        let before = chain.clone();
        solve(&mut chain, target);
        assert_eq!(chain, before);
    }

    #[test]
    fn iterations_are_bounded() {
        // Without the bow a straight chain cannot fold toward a target on
        // its own line, so every sweep is spent.
        let solver = FabrikSolver::new(FabrikConfig {
            bow: 0.0,
            ..FabrikConfig::default()
        });
        let mut chain = build_chain(5, 80.0).unwrap();
        let result = solver.solve(&mut chain, Point2::new(100.0, 0.0));

        assert_eq!(result.iterations, 10);
        assert!(!result.converged);
        assert!(chain.is_finite());
    }

    #[test]
    fn max_iterations_is_configurable() {
        let solver = FabrikSolver::new(FabrikConfig {
            max_iterations: 1,
            ..FabrikConfig::default()
        });
        let mut chain = build_chain(5, 80.0).unwrap();
        let result = solver.solve(&mut chain, Point2::new(-150.0, 120.0));
        assert!(result.iterations <= 1);
    }

    #[test]
    fn non_uniform_lengths_converge() {
        let mut chain = Chain::from_lengths(Point2::origin(), &[100.0, 50.0, 25.0]).unwrap();
        let result = solve(&mut chain, Point2::new(60.0, 80.0));
        assert!(result.converged, "error={}", result.error);
        assert!(max_segment_error(&chain) < 1e-9);
    }

    #[test]
    fn invalid_target_leaves_chain_untouched() {
        let mut chain = bent_chain();
        let before = chain.clone();

        let result = solve(&mut chain, Point2::new(f64::NAN, 1.0));
        assert_eq!(result.branch, SolveBranch::InvalidTarget);
        assert!(!result.converged);
        assert_eq!(chain, before);

        let result = solve(&mut chain, Point2::new(0.0, f64::INFINITY));
        assert_eq!(result.branch, SolveBranch::InvalidTarget);
        assert_eq!(chain, before);
    }

    #[test]
    fn coincident_joints_stay_finite() {
        let mut chain = build_chain(4, 50.0).unwrap();
        for joint in chain.joints_mut() {
            joint.position = Point2::origin();
        }
        let result = solve(&mut chain, Point2::new(50.0, 50.0));

        assert!(chain.is_finite());
        assert_eq!(chain.joints()[0].position, Point2::origin());
        assert!(result.error.is_finite());
    }

    #[test]
    fn corrupt_positions_are_repaired() {
        let mut chain = build_chain(4, 50.0).unwrap();
        chain.joints_mut()[2].position = Point2::new(f64::NAN, f64::NAN);
        chain.joints_mut()[4].position = Point2::new(f64::INFINITY, 0.0);

        solve(&mut chain, Point2::new(20.0, 70.0));
        assert!(chain.is_finite());
        assert!(max_segment_error(&chain) < 1e-9);
    }

    #[test]
    fn rescale_preserves_direction() {
        let p = rescale(Point2::new(1.0, 1.0), Point2::new(4.0, 5.0), 10.0);
        assert_relative_eq!(p.x, 7.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 9.0, epsilon = 1e-12);
    }

    #[test]
    fn rescale_coincident_falls_back_to_x() {
        let anchor = Point2::new(3.0, -2.0);
        let p = rescale(anchor, anchor, 7.0);
        assert_eq!(p, Point2::new(10.0, -2.0));
    }

    #[test]
    fn bearing_of_zero_vector_is_x() {
        let p = Point2::new(5.0, 5.0);
        assert_relative_eq!(bearing(p, p), 0.0);
        assert_relative_eq!(
            bearing(Point2::origin(), Point2::new(0.0, 2.0)),
            std::f64::consts::FRAC_PI_2
        );
    }

    #[test]
    fn backward_pass_restores_each_length() {
        let mut chain = bent_chain();
        let target = Point2::new(-30.0, 40.0);
        backward_pass(&mut chain, target);

        assert_eq!(chain.end_effector(), target);
        assert!(max_segment_error(&chain) < 1e-9);
    }

    #[test]
    fn forward_pass_restores_each_length() {
        let mut chain = bent_chain();
        backward_pass(&mut chain, Point2::new(-30.0, 40.0));
        forward_pass(&mut chain);

        assert_eq!(chain.joints()[0].position, chain.base());
        assert!(max_segment_error(&chain) < 1e-9);
    }

    #[test]
    fn stalling_offset_detection() {
        let chain = build_chain(3, 10.0).unwrap();
        assert_eq!(stalling_offset(&chain, Point2::new(5.0, 0.0)), Some(0.0));
        assert_eq!(stalling_offset(&chain, Point2::new(-5.0, 0.0)), Some(0.0));
        assert_eq!(stalling_offset(&chain, Point2::new(5.0, 1.0)), Some(1.0));
        assert_eq!(stalling_offset(&chain, Point2::new(5.0, -2.5)), Some(-2.5));
        assert!(stalling_offset(&chain, Point2::new(5.0, 3.0)).is_none());
        assert!(stalling_offset(&bent_chain(), Point2::new(5.0, 0.0)).is_none());
    }

    #[test]
    fn near_line_targets_converge() {
        for dy in [1e-7, 1e-5, 1e-3, 0.1, 1.0] {
            for target in [Point2::new(100.0, dy), Point2::new(100.0, -dy)] {
                let mut chain = build_chain(5, 80.0).unwrap();
                let result = solve(&mut chain, target);
                assert!(result.converged, "target={target:?} error={}", result.error);
                assert!(max_segment_error(&chain) < 1e-9);

                let settled = chain.end_effector();
                let second = solve(&mut chain, target);
                assert_eq!(second.iterations, 0);
                assert!(nalgebra::distance(&settled, &chain.end_effector()) < 0.5);
            }
        }
    }

    #[test]
    fn bow_keeps_ends_fixed() {
        let mut chain = build_chain(4, 50.0).unwrap();
        bow(&mut chain, 0.4, 0.0);

        assert_eq!(chain.joints()[0].position, Point2::origin());
        assert_eq!(chain.end_effector(), Point2::new(200.0, 0.0));
        // Middle joint is pushed furthest: 0.4 * 50 * sin(pi / 2).
        assert_relative_eq!(chain.joints()[2].position.y, 20.0, epsilon = 1e-12);
        assert!(chain.joints()[1].position.y > 0.0);
        assert!(chain.joints()[3].position.y > 0.0);
    }

    #[test]
    fn bow_leans_away_from_target() {
        let mut chain = build_chain(4, 50.0).unwrap();
        bow(&mut chain, 0.4, 1.0);
        assert_relative_eq!(chain.joints()[2].position.y, -20.0, epsilon = 1e-12);

        let mut chain = build_chain(4, 50.0).unwrap();
        bow(&mut chain, 0.4, -1.0);
        assert_relative_eq!(chain.joints()[2].position.y, 20.0, epsilon = 1e-12);
    }

    #[test]
    fn reach_band_edge_is_straight() {
        let mut chain = bent_chain();
        let target = Point2::new(0.0, 199.6);
        let result = solve(&mut chain, target);

        assert_eq!(result.branch, SolveBranch::Reachable);
        assert_eq!(result.iterations, 0);
        assert!(result.converged);
        assert_relative_eq!(result.error, 0.4, epsilon = 1e-9);
    }
}
