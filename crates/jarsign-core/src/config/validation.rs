//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::patterns::validate_pattern;

use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_signing(config)?;
    validate_archives(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_signing(config: &Config) -> Result<()> {
    let signing = &config.signing;
    if signing.keystore_file.is_some() && signing.keystore_data.is_some() {
        return Err(ConfigError::InvalidValue {
            field: "signing".to_string(),
            message: "keystore_file and keystore_data cannot both be set".to_string(),
        });
    }

    if signing.env_prefix.as_deref() == Some("") {
        return Err(ConfigError::InvalidValue {
            field: "signing.env_prefix".to_string(),
            message: "prefix cannot be empty".to_string(),
        });
    }

    Ok(())
}

fn validate_archives(config: &Config) -> Result<()> {
    for (i, archive) in config.archives.iter().enumerate() {
        if archive.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: format!("archives[{}].path", i),
                message: "path cannot be empty".to_string(),
            });
        }

        if archive.keystore_file.is_some() && archive.keystore_data.is_some() {
            return Err(ConfigError::InvalidValue {
                field: format!("archives[{}]", i),
                message: "keystore_file and keystore_data cannot both be set".to_string(),
            });
        }

        for pattern in archive.includes.iter().chain(&archive.excludes) {
            if pattern.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("archives[{}]", i),
                    message: "patterns cannot be empty".to_string(),
                });
            }
            validate_pattern(pattern)?;
        }
    }

    Ok(())
}
