//! Common error types for pidify

use thiserror::Error;

/// Common result type for pidify operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the pidify workspace
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error. Fatal: raised before any
    /// resolution begins, never per-field.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
