//! Bevy systems for applying pointer input to the IK target.

use bevy::prelude::*;

use linkage_core::types::IkTarget;

use crate::drag::DragState;
use crate::pointer::PointerInput;

// ---------------------------------------------------------------------------
// apply_pointer_input
// ---------------------------------------------------------------------------

/// System that drains [`PointerInput`] and applies each event through
/// [`DragState`] to [`IkTarget`].
///
/// Skips work entirely on frames with no queued events, so [`IkTarget`] is
/// only marked changed when the pointer actually moved it.
pub fn apply_pointer_input(
    mut input: ResMut<PointerInput>,
    mut drag: ResMut<DragState>,
    mut target: ResMut<IkTarget>,
) {
    if input.is_empty() {
        return;
    }

    let mut next = *target;
    let mut moved = false;
    for event in input.drain() {
        moved |= drag.apply(event, &mut next);
    }

    if moved {
        *target = next;
        if let Some(point) = next.get() {
            trace!("linkage-input: target -> ({:.1}, {:.1})", point.x, point.y);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
