//! Error types for HRY Chat.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed configuration. Fatal at provider construction.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote call setup failure or mid-stream remote failure.
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
