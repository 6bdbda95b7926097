//! Drag state machine.
//!
//! A press moves the target and starts a drag, moves update the target only
//! while dragging, and a release freezes the target where it last was.

use bevy::prelude::*;

use linkage_core::types::IkTarget;

use crate::pointer::PointerEvent;

/// Whether the pointer is currently dragging the target.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DragState {
    /// `true` between a press and the following release.
    pub dragging: bool,
}

impl DragState {
    /// Apply one pointer event, updating `target` when it should move.
    ///
    /// Returns `true` if the target changed.
    pub fn apply(&mut self, event: PointerEvent, target: &mut IkTarget) -> bool {
        match event {
            PointerEvent::Pressed(point) => {
                self.dragging = true;
                target.set(point);
                true
            }
            PointerEvent::Moved(point) if self.dragging => {
                target.set(point);
                true
            }
            PointerEvent::Moved(_) => false,
            PointerEvent::Released => {
                self.dragging = false;
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
