//! linkage-core: shared types, configuration, errors and frame ordering for
//! the linkage FABRIK chain.
//!
//! Every other linkage crate depends on this one. [`LinkageCorePlugin`]
//! registers the [`LinkageSet`] ordering that the input, solver and render
//! systems slot into, plus the [`LinkageConfig`](config::LinkageConfig) and
//! [`IkTarget`](types::IkTarget) resources they share.

pub mod config;
pub mod error;
pub mod types;

use bevy::prelude::*;

use crate::config::LinkageConfig;
use crate::types::IkTarget;

// ---------------------------------------------------------------------------
// LinkageSet
// ---------------------------------------------------------------------------

/// Per-frame phases, run in declaration order within [`Update`].
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkageSet {
    /// Pointer input is applied to the target.
    Input,
    /// The solver moves the chain toward the target.
    Solve,
    /// Renderers read the solved chain.
    Render,
}

// ---------------------------------------------------------------------------
// LinkageCorePlugin
// ---------------------------------------------------------------------------

/// Registers [`LinkageSet`] ordering and the shared resources.
///
/// A [`LinkageConfig`] inserted before this plugin is kept; otherwise the
/// default configuration is used.
pub struct LinkageCorePlugin;

impl Plugin for LinkageCorePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LinkageConfig>()
            .init_resource::<IkTarget>()
            .configure_sets(
                Update,
                (LinkageSet::Input, LinkageSet::Solve, LinkageSet::Render).chain(),
            );
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        LinkageCorePlugin, LinkageSet,
        config::{ChainConfig, FabrikConfig, LinkageConfig},
        error::{ConfigError, LinkageError},
        types::IkTarget,
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
