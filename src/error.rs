// src/error.rs

//! Error types shared by the devkit library

use thiserror::Error;

/// Errors surfaced by the devkit core
#[derive(Error, Debug)]
pub enum Error {
    /// A component could not be constructed (backend, client, runtime)
    #[error("Initialization error: {0}")]
    InitError(String),

    /// Malformed specs file or contradictory options
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Filesystem or transport failure
    #[error("I/O error: {0}")]
    IoError(String),

    /// A version, definition or metadata document could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The artifact store rejected an operation
    #[error("Backend error: {0}")]
    BackendError(String),

    /// An artifact could not be fetched
    #[error("Download error: {0}")]
    DownloadError(String),

    /// A requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, Error>;
