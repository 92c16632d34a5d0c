//! Error types for mrtoct
//!
//! Configuration problems surface before any computation starts. Data hygiene
//! issues never reach this type: the pipeline filters them silently.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mrtoct operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting volumes or training.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed `key=value` entry in a hyperparameter override string.
    #[error("Invalid hyperparameter override '{entry}': {message}\n  → Use comma-separated key=value pairs, e.g. learn_rate=1e-3,mse_weight=0.5")]
    HParam { entry: String, message: String },

    /// Override names a hyperparameter that has no default.
    #[error("Unknown hyperparameter '{0}'\n  → Known keys: {known}", known = crate::config::HParams::KEYS.join(", "))]
    UnknownHParam(String),

    /// Slice record could not be decoded.
    #[error("Record codec error in {path}: {message}")]
    Codec { path: PathBuf, message: String },

    /// Volume file format not understood by the reader.
    #[error("Unsupported volume format: {0}\n  → Only uncompressed NIfTI-1 (.nii) volumes are supported")]
    UnsupportedFormat(String),

    /// Tensor or slice shapes do not line up.
    #[error("Shape mismatch for {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch { context: String, expected: Vec<usize>, actual: Vec<usize> },

    /// A stream ran dry inside a fixed step count.
    #[error("Dataset exhausted: {0}\n  → The batched, repeated dataset must supply every step of a cycle")]
    DatasetExhausted(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Underlying I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a codec error for a record file.
    pub fn codec(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Codec { path: path.into(), message: message.into() }
    }

    /// Configuration errors abort before any computation is attempted.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::HParam { .. } | Self::UnknownHParam(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<safetensors::SafeTensorError> for Error {
    fn from(e: safetensors::SafeTensorError) -> Self {
        Self::Serialization(format!("safetensors: {e}"))
    }
}
