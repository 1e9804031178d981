//! Error types for bigarray
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using BigArrayError
pub type Result<T> = std::result::Result<T, BigArrayError>;

/// Unified error type for bigarray operations
#[derive(Debug, Error)]
pub enum BigArrayError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Addressing Errors
    // -------------------------------------------------------------------------
    #[error("Index overflow: {0}")]
    IndexOverflow(String),

    #[error("Index out of range: {0}")]
    IndexOutOfRange(String),

    #[error("Sub-page overflow: {0}")]
    SubPageOverflow(String),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Resource already closed: {0}")]
    Closed(String),

    // -------------------------------------------------------------------------
    // Repository Errors
    // -------------------------------------------------------------------------
    #[error("Repository error: {0}")]
    Repository(String),
}
