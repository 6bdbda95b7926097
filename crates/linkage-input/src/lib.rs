//! Pointer input for the linkage chain.
//!
//! This crate is the input collaborator of the IK solver:
//!
//! - [`PointerInput`]: resource buffering raw pointer events from any source
//! - [`DragState`]: press/move/release state machine owning the drag flag
//! - [`LinkageInputPlugin`]: Bevy plugin that applies buffered events to
//!   [`IkTarget`](linkage_core::types::IkTarget) each frame
//!
//! Capturing events (window cursor, touch, replay) is left to the host,
//! which only has to push into [`PointerInput`].
//!
//! # Example
//!
//! ```no_run
//! use bevy::prelude::*;
//! use linkage_input::prelude::*;
//!
//! App::new()
//!     .add_plugins(linkage_core::LinkageCorePlugin)
//!     .add_plugins(LinkageInputPlugin)
//!     .run();
//! ```

pub mod drag;
pub mod pointer;
pub mod systems;

use bevy::prelude::*;
use linkage_core::LinkageSet;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use drag::DragState;
pub use pointer::{PointerEvent, PointerInput};

// ---------------------------------------------------------------------------
// LinkageInputPlugin
// ---------------------------------------------------------------------------

/// Bevy plugin that applies pointer events to the IK target.
///
/// Runs in [`LinkageSet::Input`], so a pointer event queued before a frame
/// is seen by that same frame's solve.
pub struct LinkageInputPlugin;

impl Plugin for LinkageInputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PointerInput>()
            .init_resource::<DragState>()
            .add_systems(
                Update,
                systems::apply_pointer_input.in_set(LinkageSet::Input),
            );
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{DragState, LinkageInputPlugin, PointerEvent, PointerInput};
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
