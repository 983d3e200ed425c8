//! Configuration types

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::credentials::SigningCredentials;
use crate::error::Result;
use crate::patterns::PatternSet;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project name, used as the default lookup prefix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Directory holding per-archive temporary files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,

    /// Project-wide signing defaults
    pub signing: SigningConfig,

    /// Build properties consulted when detecting credentials
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, String>,

    /// Archives signed by `jarsign run`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub archives: Vec<ArchiveConfig>,
}

impl Config {
    /// Prefix used for property and environment lookup
    pub fn env_prefix(&self) -> Option<&str> {
        self.signing.env_prefix.as_deref().or(self.name.as_deref())
    }
}

/// Project-wide signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Key alias
    pub alias: Option<String>,

    /// Keystore password
    pub store_password: Option<String>,

    /// Private key password
    pub key_password: Option<String>,

    /// Path to the keystore file
    pub keystore_file: Option<PathBuf>,

    /// Base64 encoded keystore
    pub keystore_data: Option<String>,

    /// Detect credentials from build properties and environment variables
    pub auto_detect: bool,

    /// Prefix for property and environment lookup (defaults to `name`)
    pub env_prefix: Option<String>,

    /// Explicit path to the jarsigner executable
    pub jarsigner: Option<PathBuf>,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            alias: None,
            store_password: None,
            key_password: None,
            keystore_file: None,
            keystore_data: None,
            auto_detect: true,
            env_prefix: None,
            jarsigner: None,
        }
    }
}

impl SigningConfig {
    /// Credentials explicitly set in this table
    pub fn credentials(&self) -> SigningCredentials {
        SigningCredentials {
            alias: self.alias.clone(),
            store_password: self.store_password.clone(),
            key_password: self.key_password.clone(),
            keystore_file: self.keystore_file.clone(),
            keystore_data: self.keystore_data.clone(),
        }
    }
}

/// One archive to sign
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Path to the archive
    pub path: PathBuf,

    /// Entries to sign (all when empty)
    pub includes: Vec<String>,

    /// Entries to leave unsigned
    pub excludes: Vec<String>,

    /// Key alias override
    pub alias: Option<String>,

    /// Keystore password override
    pub store_password: Option<String>,

    /// Key password override
    pub key_password: Option<String>,

    /// Keystore file override
    pub keystore_file: Option<PathBuf>,

    /// Keystore data override
    pub keystore_data: Option<String>,
}

impl ArchiveConfig {
    /// Task-level credential overrides
    pub fn credentials(&self) -> SigningCredentials {
        SigningCredentials {
            alias: self.alias.clone(),
            store_password: self.store_password.clone(),
            key_password: self.key_password.clone(),
            keystore_file: self.keystore_file.clone(),
            keystore_data: self.keystore_data.clone(),
        }
    }

    /// Pattern set for this archive
    pub fn patterns(&self) -> Result<PatternSet> {
        let mut patterns = PatternSet::new();
        patterns
            .include(self.includes.iter().cloned())
            .exclude(self.excludes.iter().cloned());
        patterns.compile()?;
        Ok(patterns)
    }
}
