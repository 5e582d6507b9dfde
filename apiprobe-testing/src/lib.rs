//! Test toolkit for apiprobe.
//!
//! ## Features
//!
//! - ✅ **Assertions** - Response and value checks with expected vs. actual messages
//! - 🔍 **JSON diff** - Path-addressed structural diff with volatile-path exclusions
//! - 🧰 **Fixtures** - Random data, timestamps, digests and JSON extraction
//! - 🏃 **Runner** - Tag/name filtering, parallel workers and reruns
//!
//! ## Quick Start
//!
//! ```no_run
//! use apiprobe_config::Settings;
//! use apiprobe_testing::{RunConfig, Runner, TestCase, assertions};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let cases = vec![TestCase::new("list_users", |ctx| {
//!     Box::pin(async move {
//!         let response = ctx.get("/users").send().await?;
//!         assertions::status_code(&response, 200)?;
//!         assertions::json_contains(&response, &json!({"page": 1}))?;
//!         Ok(())
//!     })
//! })
//! .with_tag("smoke")];
//!
//! let runner = Runner::new(Settings::default(), RunConfig::new().workers(2));
//! let report = runner.run(cases).await.unwrap();
//! assert!(report.all_passed());
//! # });
//! ```
//!
//! ## Diffing
//!
//! ```
//! use apiprobe_testing::diff::{ChangeKind, DiffOptions, diff};
//! use serde_json::json;
//!
//! let result = diff(
//!     &json!({"id": 1, "name": "alice"}),
//!     &json!({"id": 2, "name": "bob"}),
//!     &DiffOptions::default(),
//! );
//!
//! // `$.id` is excluded by default
//! assert_eq!(result.len(), 1);
//! assert_eq!(result.changes()[0].kind, ChangeKind::ValueChanged);
//! ```

pub mod assertions;
pub mod diff;
pub mod error;
pub mod filter;
pub mod fixtures;
pub mod runner;

pub use assertions::{AssertResult, AssertionFailure};
pub use diff::{Change, ChangeKind, DiffOptions, DiffResult};
pub use error::{CaseError, FixtureError, RunnerError};
pub use filter::TagExpr;
pub use fixtures::{extract_json, md5_hex, random_email, random_string, timestamp, wait_until};
pub use runner::{BoxFuture, CaseResult, Context, RunConfig, Runner, TestCase};

/// Prelude for writing test cases.
pub mod prelude {
    pub use crate::assertions;
    pub use crate::error::CaseError;
    pub use crate::runner::{BoxFuture, CaseResult, Context, TestCase};
    pub use apiprobe_http_client::StatusCode;
    pub use serde_json::{Value, json};
}
