//! Scripted pointer drags for headless runs.

use std::f64::consts::TAU;

use clap::ValueEnum;
use nalgebra::{Point2, Vector2};

use linkage_input::PointerInput;

/// Shape of the scripted drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DragPath {
    /// One lap of a circle around the base, at three quarters of the reach.
    #[default]
    Circle,
    /// A horizontal pass above the base that starts and ends out of reach.
    Sweep,
}

/// Press at the start of the path, drag along it, release at the end.
#[derive(Debug, Clone, Copy)]
pub struct ScriptedDrag {
    path: DragPath,
    frames: u32,
    base: Point2<f64>,
    reach: f64,
}

impl ScriptedDrag {
    pub const fn new(path: DragPath, frames: u32, base: Point2<f64>, reach: f64) -> Self {
        Self {
            path,
            frames,
            base,
            reach,
        }
    }

    /// Pointer position on `frame`.
    pub fn point_at(&self, frame: u32) -> Point2<f64> {
        let t = f64::from(frame) / f64::from(self.frames.max(1));
        match self.path {
            DragPath::Circle => {
                let angle = TAU * t;
                self.base + Vector2::new(angle.cos(), angle.sin()) * (0.75 * self.reach)
            }
            DragPath::Sweep => {
                let x = (3.0 * t - 1.5) * self.reach;
                self.base + Vector2::new(x, 0.5 * self.reach)
            }
        }
    }

    /// Queue this frame's pointer events.
    pub fn feed(&self, frame: u32, input: &mut PointerInput) {
        if frame >= self.frames {
            return;
        }
        let point = self.point_at(frame);
        if frame == 0 {
            input.press(point);
        } else {
            input.move_to(point);
        }
        if frame + 1 == self.frames {
            input.release();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
