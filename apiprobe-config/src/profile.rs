// Environment profiles

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named target environment.
///
/// The set is closed: anything that is not `dev`, `test` or `prod` resolves
/// to [`Environment::Test`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    #[default]
    Test,
    Prod,
}

impl Environment {
    /// All known environments, in declaration order.
    pub const ALL: [Environment; 3] = [Environment::Dev, Environment::Test, Environment::Prod];

    /// Parse an environment name, falling back to `test` for unknown names.
    pub fn parse(name: &str) -> Self {
        match Self::try_parse(name) {
            Some(env) => env,
            None => {
                tracing::warn!(
                    environment = name,
                    "Unknown environment, falling back to 'test'"
                );
                Environment::Test
            }
        }
    }

    /// Parse an environment name, returning `None` for unknown names.
    pub fn try_parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "dev" => Some(Environment::Dev),
            "test" => Some(Environment::Test),
            "prod" => Some(Environment::Prod),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Test => "test",
            Environment::Prod => "prod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Login credentials for an environment.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Passwords stay out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Target base URL and credentials for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentProfile {
    pub name: Environment,
    pub base_url: String,
    pub credentials: Credentials,
}

impl EnvironmentProfile {
    pub fn new(name: Environment, base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            name,
            base_url: base_url.into(),
            credentials,
        }
    }

    /// The built-in profile for an environment.
    pub fn builtin(env: Environment) -> Self {
        match env {
            Environment::Dev => Self::new(
                env,
                "http://dev.api.example.com",
                Credentials::new("dev_user", "dev_pass"),
            ),
            Environment::Test => Self::new(
                env,
                "http://test.api.example.com",
                Credentials::new("test_user", "test_pass"),
            ),
            Environment::Prod => Self::new(
                env,
                "https://api.example.com",
                Credentials::new("prod_user", "prod_pass"),
            ),
        }
    }

    /// Join a request path onto the base URL.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Partial profile, as read from an override file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileOverride {
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProfileOverride {
    pub(crate) fn apply(&self, profile: &mut EnvironmentProfile) {
        if let Some(base_url) = &self.base_url {
            profile.base_url = base_url.clone();
        }
        if let Some(username) = &self.username {
            profile.credentials.username = username.clone();
        }
        if let Some(password) = &self.password {
            profile.credentials.password = password.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_environments() {
        assert_eq!(Environment::parse("dev"), Environment::Dev);
        assert_eq!(Environment::parse("TEST"), Environment::Test);
        assert_eq!(Environment::parse(" prod "), Environment::Prod);
    }

    #[test]
    fn test_unknown_environment_falls_back_to_test() {
        assert_eq!(Environment::parse("staging"), Environment::Test);
        assert_eq!(Environment::parse(""), Environment::Test);
        assert_eq!(Environment::try_parse("staging"), None);
    }

    #[test]
    fn test_builtin_profiles() {
        let prod = EnvironmentProfile::builtin(Environment::Prod);
        assert_eq!(prod.base_url, "https://api.example.com");
        assert_eq!(prod.credentials.username, "prod_user");

        let test = EnvironmentProfile::builtin(Environment::Test);
        assert_eq!(test.base_url, "http://test.api.example.com");
    }

    #[test]
    fn test_url_for_joins_without_double_slash() {
        let mut profile = EnvironmentProfile::builtin(Environment::Dev);
        profile.base_url = "http://localhost:8080/".to_string();
        assert_eq!(profile.url_for("/api/login"), "http://localhost:8080/api/login");
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("admin", "secret");
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_profile_override() {
        let mut profile = EnvironmentProfile::builtin(Environment::Test);
        let patch = ProfileOverride {
            base_url: Some("http://127.0.0.1:9000".to_string()),
            username: None,
            password: Some("changed".to_string()),
        };
        patch.apply(&mut profile);

        assert_eq!(profile.base_url, "http://127.0.0.1:9000");
        assert_eq!(profile.credentials.username, "test_user");
        assert_eq!(profile.credentials.password, "changed");
    }
}
