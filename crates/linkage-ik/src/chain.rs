//! Planar joint chain anchored at a fixed base.
//!
//! A [`Chain`] is an ordered list of joints from the base (index 0) to the
//! end effector (last index). Each joint stores the length of the segment
//! leaving it; those lengths are fixed at construction and only positions
//! move afterwards.

use nalgebra::{Point2, Vector2};

use linkage_core::config::{validate_segment_lengths, ChainConfig};
use linkage_core::error::ConfigError;

/// A single articulation point in the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joint {
    /// Current position.
    pub position: Point2<f64>,
    /// Length of the segment to the next joint. Zero for the end effector.
    segment_length: f64,
}

impl Joint {
    /// Length of the outgoing segment (zero for the end effector).
    pub const fn segment_length(&self) -> f64 {
        self.segment_length
    }
}

/// An ordered open chain from a fixed base to a free end effector.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    joints: Vec<Joint>,
    base: Point2<f64>,
    total_reach: f64,
}

impl Chain {
    /// Build a straight chain of `joint_count` segments of `segment_length`,
    /// anchored at the origin and laid out along +x.
    ///
    /// The chain holds `joint_count + 1` joints: the base plus one joint at
    /// the end of every segment.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidJointCount`] if `joint_count < 2`,
    /// [`ConfigError::InvalidSegmentLength`] if the length is not finite and
    /// positive.
    pub fn new(joint_count: usize, segment_length: f64) -> Result<Self, ConfigError> {
        Self::from_lengths(Point2::origin(), &vec![segment_length; joint_count])
    }

    /// Build a straight chain along +x from `base` with per-segment lengths.
    ///
    /// # Errors
    ///
    /// Fails on fewer than two segments or any non-positive length.
    pub fn from_lengths(base: Point2<f64>, lengths: &[f64]) -> Result<Self, ConfigError> {
        validate_segment_lengths(lengths)?;
        if !base.coords.iter().all(|c| c.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "base".into(),
                message: "must be finite".into(),
            });
        }

        let mut joints = Vec::with_capacity(lengths.len() + 1);
        let mut position = base;
        for &length in lengths {
            joints.push(Joint {
                position,
                segment_length: length,
            });
            position += Vector2::x() * length;
        }
        joints.push(Joint {
            position,
            segment_length: 0.0,
        });

        Ok(Self {
            joints,
            base,
            total_reach: lengths.iter().sum(),
        })
    }

    /// Build from a [`ChainConfig`].
    ///
    /// # Errors
    ///
    /// Returns the config's validation error.
    pub fn from_config(config: &ChainConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::from_lengths(config.base_point(), &config.lengths())
    }

    /// Number of joints, base and end effector included.
    pub fn point_count(&self) -> usize {
        self.joints.len()
    }

    /// Number of segments.
    pub fn segment_count(&self) -> usize {
        self.joints.len() - 1
    }

    /// Joints in order from base to end effector.
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Mutable joints. Positions may be changed; segment lengths may not.
    pub fn joints_mut(&mut self) -> &mut [Joint] {
        &mut self.joints
    }

    /// Joint positions in chain order.
    pub fn positions(&self) -> impl Iterator<Item = Point2<f64>> + '_ {
        self.joints.iter().map(|j| j.position)
    }

    /// Segment lengths in chain order (one per segment).
    pub fn segment_lengths(&self) -> impl Iterator<Item = f64> + '_ {
        self.joints[..self.segment_count()]
            .iter()
            .map(|j| j.segment_length)
    }

    /// Fixed anchor of joint 0.
    pub const fn base(&self) -> Point2<f64> {
        self.base
    }

    /// Current end-effector position.
    pub fn end_effector(&self) -> Point2<f64> {
        self.joints[self.joints.len() - 1].position
    }

    /// Sum of all segment lengths: the farthest the end effector can get
    /// from the base.
    pub const fn total_reach(&self) -> f64 {
        self.total_reach
    }

    /// Whether every joint coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.joints
            .iter()
            .all(|j| j.position.coords.iter().all(|c| c.is_finite()))
    }
}

/// Build a uniform chain anchored at the origin. See [`Chain::new`].
///
/// # Errors
///
/// Fails fast on `joint_count < 2` or a non-positive `segment_length`.
pub fn build_chain(joint_count: usize, segment_length: f64) -> Result<Chain, ConfigError> {
    Chain::new(joint_count, segment_length)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
