//! Common error types for edugen

use thiserror::Error;

/// Common result type for edugen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across edugen services
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
