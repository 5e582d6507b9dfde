// apiprobe - API test automation for Rust
//
// Re-exports the workspace crates behind one dependency.

pub use apiprobe_config as config;
pub use apiprobe_http_client as http;
pub use apiprobe_report as report;
pub use apiprobe_testing as testing;

#[cfg(feature = "log")]
pub use apiprobe_log as log;

pub use apiprobe_config::{Environment, LoadOptions, Settings};
pub use apiprobe_http_client::{Dispatcher, DispatcherConfig, HttpClientError, ResponseRecord};
pub use apiprobe_report::{ReportFormat, ReportWriter, TestReport};
pub use apiprobe_testing::{RunConfig, Runner, TestCase, assertions, diff};

// Prelude for common imports
pub mod prelude {
    pub use crate::{Dispatcher, Environment, RunConfig, Runner, Settings, TestCase};
    pub use apiprobe_testing::prelude::*;
}
