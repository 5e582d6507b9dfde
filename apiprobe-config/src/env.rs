// Environment variable loading

use std::collections::HashMap;
use std::env;

/// Prefix shared by every variable the harness reads.
pub const ENV_PREFIX: &str = "API_TEST";

/// Environment variable loader
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Loader scoped to the `API_TEST_` variables.
    pub fn harness() -> Self {
        Self::new(Some(ENV_PREFIX.to_string()))
    }

    /// Load all matching variables from the process environment
    pub fn load(&self) -> HashMap<String, String> {
        self.load_from(env::vars())
    }

    /// Load all matching variables from the given pairs.
    ///
    /// Keys are returned lowercased with the prefix stripped, so
    /// `API_TEST_MAX_RETRIES` becomes `max_retries`.
    pub fn load_from<I>(&self, vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = HashMap::new();

        for (key, value) in vars {
            if let Some(ref prefix) = self.prefix {
                if let Some(rest) = key.strip_prefix(prefix.as_str())
                    && rest.starts_with('_')
                {
                    config.insert(rest.trim_start_matches('_').to_lowercase(), value);
                }
            } else {
                config.insert(key.to_lowercase(), value);
            }
        }

        config
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::harness()
    }
}
