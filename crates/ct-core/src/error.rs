//! Shared error type.
//!
//! Sub-crates define their own error enums and wrap `CtError` as one variant
//! where they call into `ct-core`.

use thiserror::Error;

/// The base error type for `ct-core`.
#[derive(Debug, Error)]
pub enum CtError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid distribution parameters: {0}")]
    Distribution(String),

    #[error("invalid duration: {0} s")]
    InvalidDuration(f64),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `ct-core`.
pub type CtResult<T> = Result<T, CtError>;
