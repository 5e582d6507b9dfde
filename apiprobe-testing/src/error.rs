//! Error types for test cases, the runner and data helpers.

use apiprobe_http_client::HttpClientError;
use thiserror::Error;

use crate::assertions::AssertionFailure;

/// Why a test case did not pass.
///
/// Assertion failures are reported as `failed`; everything else as `error`.
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("{0}")]
    Assertion(#[from] AssertionFailure),

    #[error("{0}")]
    Http(#[from] HttpClientError),

    #[error("Setup failed: {0}")]
    Setup(String),
}

impl CaseError {
    pub fn setup(message: impl Into<String>) -> Self {
        Self::Setup(message.into())
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self, Self::Assertion(_))
    }
}

impl From<FixtureError> for CaseError {
    fn from(error: FixtureError) -> Self {
        Self::Setup(error.to_string())
    }
}

/// Runner errors; these abort the whole run.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Invalid tag expression '{expression}': {reason}")]
    InvalidTagExpression { expression: String, reason: String },

    #[error("Failed to build dispatcher: {0}")]
    Dispatcher(#[from] HttpClientError),

    #[error("Worker failed: {0}")]
    Worker(String),
}

/// Data helper errors.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Marker not found: {0:?}")]
    MarkerNotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
