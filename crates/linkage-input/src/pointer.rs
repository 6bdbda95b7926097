//! Pointer event buffer.
//!
//! [`PointerInput`] is a Bevy resource that queues pointer events from any
//! source (window cursor, touch, scripted playback, network). The input
//! system drains it once per frame and applies the events in order.

use bevy::prelude::*;
use nalgebra::Point2;

// ---------------------------------------------------------------------------
// PointerEvent
// ---------------------------------------------------------------------------

/// A single pointer event in chain coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Button pressed at a point: start dragging there.
    Pressed(Point2<f64>),
    /// Pointer moved to a point.
    Moved(Point2<f64>),
    /// Button released: stop dragging.
    Released,
}

// ---------------------------------------------------------------------------
// PointerInput
// ---------------------------------------------------------------------------

/// Resource that buffers pointer events until the next frame.
///
/// # Example
///
/// ```
/// use linkage_input::{PointerEvent, PointerInput};
/// use nalgebra::Point2;
///
/// let mut input = PointerInput::new();
/// input.press(Point2::new(10.0, 20.0));
/// input.move_to(Point2::new(15.0, 25.0));
/// input.release();
///
/// assert_eq!(input.len(), 3);
/// let events: Vec<PointerEvent> = input.drain().collect();
/// assert_eq!(events[2], PointerEvent::Released);
/// assert!(input.is_empty());
/// ```
#[derive(Resource, Clone, Debug, Default)]
pub struct PointerInput {
    events: Vec<PointerEvent>,
}

impl PointerInput {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event.
    pub fn push(&mut self, event: PointerEvent) {
        self.events.push(event);
    }

    /// Queue a press at `point`.
    pub fn press(&mut self, point: Point2<f64>) {
        self.push(PointerEvent::Pressed(point));
    }

    /// Queue a move to `point`.
    pub fn move_to(&mut self, point: Point2<f64>) {
        self.push(PointerEvent::Moved(point));
    }

    /// Queue a release.
    pub fn release(&mut self) {
        self.push(PointerEvent::Released);
    }

    /// Take all queued events in arrival order.
    pub fn drain(&mut self) -> impl Iterator<Item = PointerEvent> + '_ {
        self.events.drain(..)
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
