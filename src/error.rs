//! Error types for dorm-locate

use thiserror::Error;

/// Main error type for dorm-locate operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Lookup failed: {0}")]
    Lookup(#[from] crate::resolve::LookupFailure),
}

/// Result type alias for dorm-locate operations
pub type Result<T> = std::result::Result<T, Error>;
