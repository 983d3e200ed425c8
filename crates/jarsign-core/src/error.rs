//! Error types for jarsign configuration

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using ConfigError
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// Both a keystore file and inline keystore data were given
    #[error("Both a keystore file and keystore data are set; only one keystore source may be used")]
    ConflictingKeystore,

    /// An include/exclude glob failed to compile
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}
