//! Error types for the Strata foundation crate.

use thiserror::Error;

/// A specialized `Result` type for Strata core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
