//! Error types for the apiprobe CLI.

use apiprobe_config::ConfigError;
use apiprobe_log::LogError;
use apiprobe_report::ReportError;
use apiprobe_testing::RunnerError;
use std::fmt;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Process exit code for usage and configuration errors.
pub const EXIT_CONFIG: i32 = 2;

/// Process exit code for failed cases and runtime errors.
pub const EXIT_FAILURE: i32 = 1;

/// CLI error types.
#[derive(Debug)]
pub enum CliError {
    /// Settings could not be resolved
    Config(ConfigError),

    /// Logging setup failed
    Log(LogError),

    /// The run aborted
    Runner(RunnerError),

    /// Report could not be written
    Report(ReportError),
}

impl CliError {
    /// Exit code; configuration problems abort before any case runs.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => EXIT_CONFIG,
            CliError::Runner(RunnerError::InvalidTagExpression { .. }) => EXIT_CONFIG,
            _ => EXIT_FAILURE,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Log(e) => write!(f, "Logging error: {}", e),
            CliError::Runner(e) => write!(f, "Run aborted: {}", e),
            CliError::Report(e) => write!(f, "Report error: {}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<LogError> for CliError {
    fn from(e: LogError) -> Self {
        CliError::Log(e)
    }
}

impl From<RunnerError> for CliError {
    fn from(e: RunnerError) -> Self {
        CliError::Runner(e)
    }
}

impl From<ReportError> for CliError {
    fn from(e: ReportError) -> Self {
        CliError::Report(e)
    }
}
