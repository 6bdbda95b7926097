use bevy::prelude::Resource;
use nalgebra::Point2;

// ---------------------------------------------------------------------------
// IkTarget
// ---------------------------------------------------------------------------

/// The point the chain's end effector is driven toward.
///
/// Written only by input handling, read only by the solver. `None` means no
/// target has been set yet and the chain holds its pose.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct IkTarget(pub Option<Point2<f64>>);

impl IkTarget {
    /// Target at a fixed point.
    #[must_use]
    pub const fn at(point: Point2<f64>) -> Self {
        Self(Some(point))
    }

    /// Current target, if any.
    #[must_use]
    pub const fn get(&self) -> Option<Point2<f64>> {
        self.0
    }

    /// Move the target.
    pub fn set(&mut self, point: Point2<f64>) {
        self.0 = Some(point);
    }

    /// Forget the target; the solver stops moving the chain.
    pub fn clear(&mut self) {
        self.0 = None;
    }

    /// Whether a target has been set.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.0.is_some()
    }
}
