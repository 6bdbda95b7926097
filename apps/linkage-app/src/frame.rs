//! Serializable chain snapshots and the render-phase system that records them.
//!
//! Each update the recorder captures one [`ChainFrame`] into [`FrameLog`];
//! the host drains the log and writes every frame as a JSON line.

use std::io::Write;

use bevy::prelude::*;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use linkage_core::error::LinkageError;
use linkage_core::types::IkTarget;
use linkage_core::LinkageSet;
use linkage_ik::{Chain, IkChain, IkResult, SolveBranch};

// ---------------------------------------------------------------------------
// ChainFrame
// ---------------------------------------------------------------------------

/// Solve path, as written to the frame stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameBranch {
    Reachable,
    Unreachable,
    InvalidTarget,
}

impl From<SolveBranch> for FrameBranch {
    fn from(branch: SolveBranch) -> Self {
        match branch {
            SolveBranch::Reachable => Self::Reachable,
            SolveBranch::Unreachable => Self::Unreachable,
            SolveBranch::InvalidTarget => Self::InvalidTarget,
        }
    }
}

/// Outcome of the solve that produced a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[allow(clippy::derive_partial_eq_without_eq)] // f64 fields prevent Eq
pub struct FrameSolve {
    pub branch: FrameBranch,
    pub converged: bool,
    pub iterations: u32,
    /// End-effector distance to the target.
    pub error: f64,
}

impl From<IkResult> for FrameSolve {
    fn from(result: IkResult) -> Self {
        Self {
            branch: result.branch.into(),
            converged: result.converged,
            iterations: result.iterations,
            error: result.error,
        }
    }
}

/// Snapshot of the chain after one frame's solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::derive_partial_eq_without_eq)] // f64 fields prevent Eq
pub struct ChainFrame {
    /// Frame index, starting at 0.
    pub frame: u64,
    /// Target the chain was solved toward, if any.
    pub target: Option<[f64; 2]>,
    /// Joint positions from base to end effector.
    pub joints: Vec<[f64; 2]>,
    /// Sum of segment lengths.
    pub reach: f64,
    /// Latest solve report, absent before the first solve.
    pub solve: Option<FrameSolve>,
}

impl ChainFrame {
    /// Capture `chain` as frame number `frame`.
    pub fn capture(
        frame: u64,
        chain: &Chain,
        target: Option<Point2<f64>>,
        result: Option<IkResult>,
    ) -> Self {
        Self {
            frame,
            target: target.map(|p| [p.x, p.y]),
            joints: chain.positions().map(|p| [p.x, p.y]).collect(),
            reach: chain.total_reach(),
            solve: result.map(FrameSolve::from),
        }
    }

    /// End-effector position, if the frame has any joints.
    pub fn end_effector(&self) -> Option<Point2<f64>> {
        self.joints.last().map(|&[x, y]| Point2::new(x, y))
    }

    /// Write the frame as a single JSON line.
    ///
    /// # Errors
    ///
    /// Returns the underlying write error (serialization failures are
    /// reported as I/O errors by `serde_json`).
    pub fn write_json_line(&self, out: &mut impl Write) -> Result<(), LinkageError> {
        serde_json::to_writer(&mut *out, self).map_err(std::io::Error::from)?;
        writeln!(out)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FrameLog
// ---------------------------------------------------------------------------

/// Frames recorded since the host last drained the log.
#[derive(Resource, Debug, Default)]
pub struct FrameLog {
    next_frame: u64,
    frames: Vec<ChainFrame>,
}

impl FrameLog {
    /// Number of frames recorded so far, drained or not.
    pub const fn recorded(&self) -> u64 {
        self.next_frame
    }

    /// Frames waiting to be drained.
    pub fn pending(&self) -> &[ChainFrame] {
        &self.frames
    }

    /// Take all pending frames in order.
    pub fn drain(&mut self) -> impl Iterator<Item = ChainFrame> + '_ {
        self.frames.drain(..)
    }

    fn push(&mut self, chain: &IkChain, target: Option<Point2<f64>>) {
        let frame = ChainFrame::capture(self.next_frame, &chain.chain, target, chain.last_result);
        self.frames.push(frame);
        self.next_frame += 1;
    }
}

// ---------------------------------------------------------------------------
// Recording
// ---------------------------------------------------------------------------

/// Registers [`FrameLog`] and records a frame in [`LinkageSet::Render`].
pub struct FrameRecordPlugin;

impl Plugin for FrameRecordPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FrameLog>()
            .add_systems(Update, record_frame_system.in_set(LinkageSet::Render));
    }
}

/// Render-phase system: snapshot the solved chain into [`FrameLog`].
#[allow(clippy::needless_pass_by_value)] // Bevy system parameters are extracted by value
pub fn record_frame_system(
    chain: Option<Res<IkChain>>,
    target: Res<IkTarget>,
    mut log: ResMut<FrameLog>,
) {
    let Some(chain) = chain else {
        return;
    };
    log.push(&chain, target.get());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
