//! Environment profiles and run settings for apiprobe.
//!
//! One [`Settings`] value is resolved at startup and stays immutable for the
//! rest of the run. Resolution order, later sources winning:
//!
//! 1. built-in defaults (three profiles, 30 s timeout, 3 retries)
//! 2. an optional override file (TOML or JSON)
//! 3. `API_TEST_*` environment variables (optionally seeded from `.env`)
//! 4. explicit [`LoadOptions`] such as the `--env` CLI flag
//!
//! ```
//! use apiprobe_config::{Environment, LoadOptions, Settings};
//! use std::collections::HashMap;
//!
//! let options = LoadOptions::default().environment("prod");
//! let settings = Settings::resolve(&options, &HashMap::new()).unwrap();
//!
//! assert_eq!(settings.environment(), Environment::Prod);
//! assert_eq!(settings.active_profile().base_url, "https://api.example.com");
//! ```

pub mod env;
pub mod error;
pub mod loader;
pub mod profile;
pub mod validation;

pub use env::{ENV_PREFIX, EnvLoader};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use profile::{Credentials, Environment, EnvironmentProfile, ProfileOverride};
pub use validation::{ConfigValidator, Validate};

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Status codes retried by default.
pub const DEFAULT_RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Options supplied by the caller (usually the CLI) when loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Environment name; wins over `API_TEST_ENV`.
    pub environment: Option<String>,
    /// Override file (`.toml` or `.json`).
    pub config_file: Option<PathBuf>,
    /// Base URL override for the active profile.
    pub base_url: Option<String>,
    /// Read a `.env` file from the working directory first.
    pub dotenv: bool,
}

impl LoadOptions {
    pub fn environment(mut self, name: impl Into<String>) -> Self {
        self.environment = Some(name.into());
        self
    }

    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_dotenv(mut self, enable: bool) -> Self {
        self.dotenv = enable;
        self
    }
}

/// Shape of the optional override file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub environment: Option<String>,
    pub timeout_secs: Option<f64>,
    pub max_retries: Option<u32>,
    pub backoff_base_ms: Option<u64>,
    pub retryable_statuses: Option<Vec<u16>>,
    pub report_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub test_data_dir: Option<PathBuf>,
    pub profiles: HashMap<String, ProfileOverride>,
}

impl SettingsFile {
    /// Read and deserialize an override file, detecting the format by extension.
    pub fn load(path: &Path) -> Result<Self> {
        let value = ConfigLoader::auto(path)?.load_file(path)?;
        serde_json::from_value(value).map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }
}

/// Resolved, immutable run settings.
#[derive(Debug, Clone)]
pub struct Settings {
    environment: Environment,
    profiles: [EnvironmentProfile; 3],
    /// Default per-request timeout.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// First backoff delay; doubles on each further retry.
    pub backoff_base: Duration,
    pub retryable_statuses: Vec<u16>,
    pub report_dir: PathBuf,
    pub log_dir: PathBuf,
    pub test_data_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: Environment::Test,
            profiles: Environment::ALL.map(EnvironmentProfile::builtin),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
            report_dir: PathBuf::from("reports"),
            log_dir: PathBuf::from("reports").join("logs"),
            test_data_dir: PathBuf::from("test_data"),
        }
    }
}

impl Settings {
    /// Load settings from the process environment and the given options.
    pub fn load(options: &LoadOptions) -> Result<Self> {
        if options.dotenv {
            check_dotenv(dotenvy::dotenv())?;
        }
        let vars = EnvLoader::harness().load();
        Self::resolve(options, &vars)
    }

    /// Resolve settings from explicit options and already-loaded `API_TEST_*`
    /// variables (keys lowercased, prefix stripped).
    pub fn resolve(options: &LoadOptions, vars: &HashMap<String, String>) -> Result<Self> {
        let mut settings = Settings::default();
        let mut env_name = None;

        if let Some(path) = &options.config_file {
            let file = SettingsFile::load(path)?;
            env_name = file.environment.clone();
            settings.apply_file(file)?;
        }

        if let Some(value) = vars.get("timeout") {
            settings.timeout = parse_secs("API_TEST_TIMEOUT", value)?;
        }
        if let Some(value) = vars.get("max_retries") {
            settings.max_retries = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "API_TEST_MAX_RETRIES".to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(value) = vars.get("env") {
            env_name = Some(value.clone());
        }
        if let Some(value) = &options.environment {
            env_name = Some(value.clone());
        }

        settings.environment = env_name
            .as_deref()
            .map(Environment::parse)
            .unwrap_or_default();

        let base_url = options.base_url.as_ref().or_else(|| vars.get("base_url"));
        if let Some(url) = base_url {
            settings.active_profile_mut().base_url = url.clone();
        }

        settings.validate()?;

        tracing::debug!(
            environment = %settings.environment,
            base_url = %settings.active_profile().base_url,
            timeout_secs = settings.timeout.as_secs_f64(),
            max_retries = settings.max_retries,
            "Resolved settings"
        );

        Ok(settings)
    }

    fn apply_file(&mut self, file: SettingsFile) -> Result<()> {
        if let Some(secs) = file.timeout_secs {
            self.timeout = parse_secs("timeout_secs", &secs.to_string())?;
        }
        if let Some(retries) = file.max_retries {
            self.max_retries = retries;
        }
        if let Some(ms) = file.backoff_base_ms {
            self.backoff_base = Duration::from_millis(ms);
        }
        if let Some(statuses) = file.retryable_statuses {
            self.retryable_statuses = statuses;
        }
        if let Some(dir) = file.report_dir {
            self.log_dir = dir.join("logs");
            self.report_dir = dir;
        }
        if let Some(dir) = file.log_dir {
            self.log_dir = dir;
        }
        if let Some(dir) = file.test_data_dir {
            self.test_data_dir = dir;
        }
        for (name, patch) in &file.profiles {
            let env = Environment::try_parse(name).ok_or_else(|| {
                ConfigError::ValidationError(format!("unknown profile '{}' in config file", name))
            })?;
            patch.apply(self.profile_mut(env));
        }
        Ok(())
    }

    /// The environment selected for this run.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// The single active profile for this run.
    pub fn active_profile(&self) -> &EnvironmentProfile {
        self.profile(self.environment)
    }

    pub fn profile(&self, env: Environment) -> &EnvironmentProfile {
        &self.profiles[slot(env)]
    }

    fn profile_mut(&mut self, env: Environment) -> &mut EnvironmentProfile {
        &mut self.profiles[slot(env)]
    }

    fn active_profile_mut(&mut self) -> &mut EnvironmentProfile {
        self.profile_mut(self.environment)
    }

    /// Replace the active profile's base URL, typically to point at a mock server.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.active_profile_mut().base_url = url.into();
        self
    }

    /// Select another environment.
    pub fn with_environment(mut self, env: Environment) -> Self {
        self.environment = env;
        self
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        for profile in &self.profiles {
            let field = format!("profiles.{}.base_url", profile.name);
            ConfigValidator::not_empty(&profile.base_url, &field)?;
            ConfigValidator::is_url(&profile.base_url, &field)?;
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "timeout must be greater than zero".to_string(),
            ));
        }
        ConfigValidator::in_range(self.max_retries, 0, 10, "max_retries")?;
        for status in &self.retryable_statuses {
            ConfigValidator::is_status(*status, "retryable_statuses")?;
        }
        Ok(())
    }
}

fn slot(env: Environment) -> usize {
    match env {
        Environment::Dev => 0,
        Environment::Test => 1,
        Environment::Prod => 2,
    }
}

/// A missing `.env` file is fine; an unreadable or malformed one is not.
fn check_dotenv<T>(result: dotenvy::Result<T>) -> Result<()> {
    match result {
        Err(e) if !e.not_found() => Err(ConfigError::LoadError(format!(".env: {}", e))),
        _ => Ok(()),
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}
