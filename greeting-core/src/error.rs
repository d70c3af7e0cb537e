//! Error types for greeting operations.

use thiserror::Error;

/// Result type for greeting operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while building or configuring greetings.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The recipient name was empty after trimming.
    #[error("Recipient name must not be empty")]
    EmptyName,

    /// The declared relation is not one of the known categories.
    #[error("Unknown relation: {0}")]
    UnknownRelation(String),

    /// A configured service could not be constructed.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
