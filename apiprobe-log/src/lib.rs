//! Logging setup for apiprobe runs.
//!
//! Two sinks are installed side by side:
//!
//! - **Console**: summary output at `INFO` (overridable with `RUST_LOG`)
//! - **File**: full detail at `DEBUG`, written to a size-rotated
//!   `api_test.log` with a bounded number of backups
//!
//! # Example
//!
//! ```no_run
//! use apiprobe_log::{LogConfig, LogLevel};
//!
//! let _guard = LogConfig::new()
//!     .console_level(LogLevel::Info)
//!     .log_dir("reports/logs")
//!     .init()
//!     .expect("logging already initialized");
//!
//! tracing::info!("Run started");
//! ```

mod rotating;

pub use rotating::SizeRotatingFile;

use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Logging setup errors.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Failed to open log file: {0}")]
    Io(#[from] io::Error),

    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),

    #[error("Unknown log level: {0}")]
    UnknownLevel(String),
}

/// Log level for filtering messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to string for EnvFilter
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(LogError::UnknownLevel(other.to_string())),
        }
    }
}

/// Output format for the console sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Plain text, one line per event
    Plain,
    /// Minimal output
    Compact,
    /// Structured JSON
    Json,
}

/// Rotating file sink settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSink {
    pub directory: PathBuf,
    pub file_name: String,
    pub max_bytes: u64,
    pub max_backups: usize,
    pub level: LogLevel,
}

impl Default for FileSink {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("reports").join("logs"),
            file_name: "api_test.log".to_string(),
            max_bytes: 10 * 1024 * 1024,
            max_backups: 5,
            level: LogLevel::Debug,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Console level; `RUST_LOG` wins when set
    pub console_level: LogLevel,
    pub console_format: LogFormat,
    /// Enable ANSI colors on the console
    pub colors: bool,
    /// Include target (module path)
    pub targets: bool,
    /// Rotating file sink, if any
    pub file: Option<FileSink>,
    /// Custom console filter such as "apiprobe_http_client=debug"
    pub env_filter: Option<String>,
}

/// Keeps the background writers alive; logs are flushed when dropped.
#[must_use = "dropping the guard stops log output"]
pub struct LogGuard {
    _guards: Vec<WorkerGuard>,
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn console_level(mut self, level: LogLevel) -> Self {
        self.console_level = level;
        self
    }

    pub fn console_format(mut self, format: LogFormat) -> Self {
        self.console_format = format;
        self
    }

    pub fn with_colors(mut self, enable: bool) -> Self {
        self.colors = enable;
        self
    }

    pub fn with_targets(mut self, enable: bool) -> Self {
        self.targets = enable;
        self
    }

    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Write the detailed log into `dir`, keeping the other file defaults.
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let mut sink = self.file.take().unwrap_or_default();
        sink.directory = dir.into();
        self.file = Some(sink);
        self
    }

    pub fn file(mut self, sink: FileSink) -> Self {
        self.file = Some(sink);
        self
    }

    /// Console only.
    pub fn without_file(mut self) -> Self {
        self.file = None;
        self
    }

    fn console_filter(&self) -> EnvFilter {
        if let Some(filter) = &self.env_filter {
            return EnvFilter::try_new(filter)
                .unwrap_or_else(|_| EnvFilter::new(self.console_level.as_str()));
        }
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.console_level.as_str()))
    }

    /// Install the global subscriber.
    pub fn init(self) -> Result<LogGuard, LogError> {
        let mut guards = Vec::new();
        let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

        let (console, guard) = tracing_appender::non_blocking(io::stdout());
        guards.push(guard);
        layers.push(self.console_layer(console));

        if let Some(sink) = &self.file {
            let file = SizeRotatingFile::new(
                &sink.directory,
                &sink.file_name,
                sink.max_bytes,
                sink.max_backups,
            )?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            guards.push(guard);
            layers.push(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new(sink.level.as_str()))
                    .boxed(),
            );
        }

        tracing_subscriber::registry()
            .with(layers)
            .try_init()
            .map_err(|e| LogError::AlreadyInitialized(e.to_string()))?;

        Ok(LogGuard { _guards: guards })
    }

    fn console_layer<W>(&self, writer: W) -> Box<dyn Layer<Registry> + Send + Sync>
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let filter = self.console_filter();
        match self.console_format {
            LogFormat::Plain => fmt::layer()
                .with_writer(writer)
                .with_ansi(self.colors)
                .with_target(self.targets)
                .with_filter(filter)
                .boxed(),
            LogFormat::Compact => fmt::layer()
                .compact()
                .with_writer(writer)
                .with_ansi(self.colors)
                .with_target(self.targets)
                .with_filter(filter)
                .boxed(),
            LogFormat::Json => fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(self.targets)
                .with_filter(filter)
                .boxed(),
        }
    }
}

impl Default for LogConfig {
    /// Plain console at INFO plus the rotating DEBUG file under `reports/logs`.
    fn default() -> Self {
        Self {
            console_level: LogLevel::Info,
            console_format: LogFormat::Plain,
            colors: true,
            targets: true,
            file: Some(FileSink::default()),
            env_filter: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Trace.as_str(), "trace");
    }

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.console_level, LogLevel::Info);
        let file = config.file.unwrap();
        assert_eq!(file.level, LogLevel::Debug);
        assert_eq!(file.file_name, "api_test.log");
        assert_eq!(file.max_bytes, 10 * 1024 * 1024);
        assert_eq!(file.max_backups, 5);
    }

    #[test]
    fn test_config_builder() {
        let config = LogConfig::new()
            .console_level(LogLevel::Warn)
            .console_format(LogFormat::Json)
            .log_dir("out/logs")
            .with_colors(false);

        assert_eq!(config.console_level, LogLevel::Warn);
        assert_eq!(config.console_format, LogFormat::Json);
        assert_eq!(config.file.unwrap().directory, PathBuf::from("out/logs"));
        assert!(!config.colors);

        assert!(LogConfig::new().without_file().file.is_none());
    }
}
