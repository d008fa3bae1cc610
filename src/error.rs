//! Brandbrief error types

use thiserror::Error;

/// Brandbrief error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Content service error
    #[error("Content service error: {0}")]
    Content(String),

    /// Image search error
    #[error("Search error: {0}")]
    Search(String),

    /// Artifact store error
    #[error("Store error: {0}")]
    Store(String),

    /// Asset resolution error
    #[error("Asset error: {0}")]
    Asset(String),

    /// Render error
    #[error("Render error: {0}")]
    Render(String),

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

/// Result type alias for brandbrief operations
pub type Result<T> = std::result::Result<T, Error>;
