//! Profiler error types

use thiserror::Error;

/// Profiler error type
#[derive(Error, Debug)]
pub enum ProfilerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Profile storage error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Sampling engine error
    #[error("Sampler error: {0}")]
    SamplerError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ProfilerError>;

impl ProfilerError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }

    /// Create a sampler error
    pub fn sampler(msg: impl Into<String>) -> Self {
        Self::SamplerError(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

impl From<anyhow::Error> for ProfilerError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
