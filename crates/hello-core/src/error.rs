//! Error types for Hello Core

use thiserror::Error;

/// Result type alias using Hello Core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Hello Core error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
