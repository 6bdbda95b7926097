use bevy::prelude::Resource;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_joint_count() -> usize {
    5
}
const fn default_segment_length() -> f64 {
    80.0
}
const fn default_max_iterations() -> u32 {
    10
}
const fn default_tolerance() -> f64 {
    0.5
}
const fn default_bow() -> f64 {
    0.4
}

// ---------------------------------------------------------------------------
// Length validation
// ---------------------------------------------------------------------------

/// Check a list of segment lengths: at least two, each finite and positive.
pub fn validate_segment_lengths(lengths: &[f64]) -> Result<(), ConfigError> {
    if lengths.len() < 2 {
        return Err(ConfigError::InvalidJointCount(lengths.len()));
    }
    for (index, &length) in lengths.iter().enumerate() {
        if !length.is_finite() || length <= 0.0 {
            return Err(ConfigError::InvalidSegmentLength { index, length });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ChainConfig
// ---------------------------------------------------------------------------

/// Shape of the chain to build.
///
/// `joint_count` counts the articulated joints beyond the fixed base, each
/// driving one segment, so the built chain holds `joint_count + 1` points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Number of segments (default: 5).
    #[serde(default = "default_joint_count")]
    pub joint_count: usize,

    /// Uniform segment length (default: 80).
    #[serde(default = "default_segment_length")]
    pub segment_length: f64,

    /// Fixed anchor for joint 0.
    #[serde(default)]
    pub base: [f64; 2],

    /// Per-segment lengths. Overrides `joint_count` and `segment_length`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_lengths: Option<Vec<f64>>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            joint_count: default_joint_count(),
            segment_length: default_segment_length(),
            base: [0.0; 2],
            segment_lengths: None,
        }
    }
}

impl ChainConfig {
    /// Uniform chain of `joint_count` segments of `segment_length`.
    #[must_use]
    pub fn uniform(joint_count: usize, segment_length: f64) -> Self {
        Self {
            joint_count,
            segment_length,
            ..Self::default()
        }
    }

    /// Set the base anchor.
    #[must_use]
    pub const fn with_base(mut self, x: f64, y: f64) -> Self {
        self.base = [x, y];
        self
    }

    /// Resolved segment lengths, base to end effector.
    pub fn lengths(&self) -> Vec<f64> {
        match &self.segment_lengths {
            Some(lengths) => lengths.clone(),
            None => vec![self.segment_length; self.joint_count],
        }
    }

    /// Base anchor as a point.
    pub fn base_point(&self) -> Point2<f64> {
        Point2::new(self.base[0], self.base[1])
    }

    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base.iter().all(|c| c.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "chain.base".into(),
                message: "must be finite".into(),
            });
        }
        validate_segment_lengths(&self.lengths())
    }
}

// ---------------------------------------------------------------------------
// FabrikConfig
// ---------------------------------------------------------------------------

/// Solver parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FabrikConfig {
    /// Maximum backward/forward sweep pairs per solve (default: 10).
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// End-effector distance at which the chain counts as converged
    /// (default: 0.5, coordinate units).
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Perpendicular bow applied to a straight chain whose line contains
    /// the target, as a fraction of segment length (default: 0.4).
    #[serde(default = "default_bow")]
    pub bow: f64,
}

impl Default for FabrikConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            bow: default_bow(),
        }
    }
}

impl FabrikConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidMaxIterations);
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ConfigError::InvalidTolerance(self.tolerance));
        }
        if !self.bow.is_finite() || self.bow < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "solver.bow".into(),
                message: format!("{} must be finite and >= 0", self.bow),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LinkageConfig
// ---------------------------------------------------------------------------

/// Main configuration: the chain to build and how to solve it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Resource)]
pub struct LinkageConfig {
    #[serde(default)]
    pub chain: ChainConfig,

    #[serde(default)]
    pub solver: FabrikConfig,
}

impl LinkageConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chain.validate()?;
        self.solver.validate()
    }

    /// Parse and validate from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
