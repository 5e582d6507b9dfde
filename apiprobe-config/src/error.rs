// Error types for settings resolution

use thiserror::Error;

/// Settings could not be resolved; fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load settings file: {0}")]
    LoadError(String),

    #[error("Failed to parse settings file: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid settings file: {0}")]
    DeserializationError(String),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
