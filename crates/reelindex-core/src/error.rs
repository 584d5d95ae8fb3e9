use thiserror::Error;

/// Top-level error type for the Reelindex system.
///
/// Subsystem crates return `ReelError` directly so that the `?` operator
/// works across crate boundaries. Per-item ingestion failures are recorded
/// as terminal processing state rather than surfaced through this type;
/// `ReelError` is reserved for failures the caller must act on.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReelError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Data shape error: {0}")]
    DataShape(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<toml::de::Error> for ReelError {
    fn from(err: toml::de::Error) -> Self {
        ReelError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ReelError {
    fn from(err: toml::ser::Error) -> Self {
        ReelError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ReelError {
    fn from(err: serde_json::Error) -> Self {
        ReelError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Reelindex operations.
pub type Result<T> = std::result::Result<T, ReelError>;
