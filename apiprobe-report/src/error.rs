//! Report error types.

use thiserror::Error;

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Report errors.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Unknown report format name.
    #[error("Unknown report format: {0} (expected html, xml or allure)")]
    UnknownFormat(String),

    /// Serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
