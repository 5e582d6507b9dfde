//! Dispatcher configuration.

use apiprobe_config::Settings;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Prefix for relative request paths.
    pub base_url: String,
    /// Default request timeout, used when a call sets none.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Retry policy.
    pub retry: RetryPolicy,
    /// Turn final 4xx/5xx responses into [`crate::HttpClientError::Status`].
    pub raise_for_status: bool,
    /// User agent string, part of the built-in header set.
    pub user_agent: String,
    /// Maximum redirects to follow.
    pub max_redirects: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            raise_for_status: true,
            user_agent: format!("apiprobe/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
        }
    }
}

impl DispatcherConfig {
    /// Create a new configuration builder.
    pub fn builder() -> DispatcherConfigBuilder {
        DispatcherConfigBuilder::default()
    }

    /// Configuration for the active profile of `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            base_url: settings.active_profile().base_url.clone(),
            timeout: settings.timeout,
            retry: RetryPolicy::from_max_retries(settings.max_retries, settings.backoff_base)
                .with_statuses(settings.retryable_statuses.clone()),
            ..Default::default()
        }
    }
}

/// Builder for dispatcher configuration.
#[derive(Debug, Default)]
pub struct DispatcherConfigBuilder {
    config: DispatcherConfig,
}

impl DispatcherConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Return 4xx/5xx responses as records instead of errors.
    pub fn raise_for_status(mut self, enable: bool) -> Self {
        self.config.raise_for_status = enable;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    pub fn build(self) -> DispatcherConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiprobe_config::Environment;

    #[test]
    fn test_defaults() {
        let config = DispatcherConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 4);
        assert!(config.raise_for_status);
        assert!(config.user_agent.starts_with("apiprobe/"));
    }

    #[test]
    fn test_from_settings() {
        let mut settings = Settings::default().with_environment(Environment::Dev);
        settings.max_retries = 1;
        settings.timeout = Duration::from_secs(5);

        let config = DispatcherConfig::from_settings(&settings);
        assert_eq!(config.base_url, "http://dev.api.example.com");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.backoff_base, Duration::from_secs(1));
    }

    #[test]
    fn test_builder() {
        let config = DispatcherConfig::builder()
            .base_url("http://localhost:8080")
            .retry(RetryPolicy::none())
            .raise_for_status(false)
            .build();

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.retry.max_attempts, 1);
        assert!(!config.raise_for_status);
    }
}
