//! Error types for signing operations

use std::path::{Path, PathBuf};

use jarsign_core::ConfigError;
use thiserror::Error;

/// Result type alias for signing operations
pub type Result<T> = std::result::Result<T, SigningError>;

/// Signing-related errors
#[derive(Debug, Error)]
pub enum SigningError {
    /// Inconsistent signing configuration
    #[error("Signing configuration error: {0}")]
    Configuration(String),

    /// Configuration could not be loaded or compiled
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Inline keystore data is not valid base64
    #[error("Invalid keystore data: {0}")]
    InvalidKeystoreData(#[from] base64::DecodeError),

    /// The external signer reported a failure
    #[error("Failed to sign {path}: {reason}")]
    SigningFailed { path: PathBuf, reason: String },

    /// Tool not found
    #[error("Signing tool not found: {tool}. {hint}")]
    ToolNotFound { tool: String, hint: String },

    /// Reading or writing an archive failed
    #[error("Archive error in {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SigningError {
    /// Wrap a zip error for the archive at `path`
    pub fn archive(path: &Path, source: zip::result::ZipError) -> Self {
        Self::Archive {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether this error stems from configuration rather than I/O or the tool
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::Config(_) | Self::InvalidKeystoreData(_)
        )
    }

    /// Whether this error came from reading or writing an archive
    pub fn is_archive(&self) -> bool {
        matches!(self, Self::Archive { .. } | Self::Io(_))
    }
}
