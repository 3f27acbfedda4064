//! Policat error types

use thiserror::Error;

/// Policat error type
#[derive(Error, Debug)]
pub enum Error {
    /// External source error (GitHub, AzAdvertizer)
    #[error("Source error: {0}")]
    Source(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Policat operations
pub type Result<T> = std::result::Result<T, Error>;
