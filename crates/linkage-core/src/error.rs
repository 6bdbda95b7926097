use thiserror::Error;

/// Top-level error type for linkage.
#[derive(Debug, Error)]
pub enum LinkageError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors.
///
/// Raised when a chain or solver is built from invalid parameters. Nothing
/// in the per-frame solve path returns these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid joint count: {0} (must be >= 2)")]
    InvalidJointCount(usize),

    #[error("Invalid length {length} for segment {index} (must be finite and > 0)")]
    InvalidSegmentLength { index: usize, length: f64 },

    #[error("Invalid tolerance: {0} (must be finite and > 0)")]
    InvalidTolerance(f64),

    #[error("max_iterations must be >= 1")]
    InvalidMaxIterations,

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
