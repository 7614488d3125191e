//! Error types for newscheck

/// Result type alias using newscheck's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for newscheck operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Persisted artifact could not be read or is not a recognized shape
    #[error("artifact error: {0}")]
    Artifact(String),

    /// Vectorization or classification failed for a single input
    #[error("inference error: {0}")]
    Inference(String),

    /// Fallback model training failed
    #[error("training error: {0}")]
    Training(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new artifact error
    pub fn artifact(msg: impl Into<String>) -> Self {
        Self::Artifact(msg.into())
    }

    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new training error
    pub fn training(msg: impl Into<String>) -> Self {
        Self::Training(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
