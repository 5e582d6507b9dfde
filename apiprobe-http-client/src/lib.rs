//! # apiprobe HTTP dispatcher
//!
//! The request path of the harness: build a request from a descriptor, merge
//! headers, apply the retry policy, log before and after, and hand back an
//! immutable [`ResponseRecord`].
//!
//! ## Features
//!
//! - **Retry with Backoff**: `backoff_base * 2^(attempt-1)` on retryable
//!   statuses (429, 500, 502, 503, 504) and transient transport failures
//! - **Header merge**: built-in defaults seed a mutable per-dispatcher
//!   [`HeaderSet`]; per-call headers win
//! - **Timeouts**: per-call value or the dispatcher default
//! - **Status raising**: final 4xx/5xx responses become
//!   [`HttpClientError::Status`] unless the call opts out
//! - **Audit trail**: every exchange is logged through `tracing` and pushed
//!   to an [`AttachmentSink`](apiprobe_report::AttachmentSink)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use apiprobe_http_client::{Dispatcher, DispatcherConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::new(
//!         DispatcherConfig::builder()
//!             .base_url("http://test.api.example.com")
//!             .build(),
//!     )?;
//!
//!     let response = dispatcher
//!         .post("/api/login")
//!         .json(&serde_json::json!({"username": "test_user", "password": "test_pass"}))
//!         .send()
//!         .await?;
//!
//!     println!("Status: {}", response.status());
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod headers;
mod request;
mod response;
mod retry;

pub use client::Dispatcher;
pub use config::{DispatcherConfig, DispatcherConfigBuilder};
pub use error::{HttpClientError, Result};
pub use headers::HeaderSet;
pub use request::{RequestBody, RequestBuilder, RequestDescriptor};
pub use response::ResponseRecord;
pub use retry::RetryPolicy;

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
pub use url::Url;

/// Prelude for common imports.
///
/// ```
/// use apiprobe_http_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::Dispatcher;
    pub use crate::config::{DispatcherConfig, DispatcherConfigBuilder};
    pub use crate::error::{HttpClientError, Result};
    pub use crate::request::{RequestBuilder, RequestDescriptor};
    pub use crate::response::ResponseRecord;
    pub use crate::retry::RetryPolicy;
    pub use http::{Method, StatusCode, header};
}
