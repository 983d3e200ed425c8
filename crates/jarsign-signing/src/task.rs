//! The signing task: sign one archive, optionally only part of it
//!
//! A run moves the archive into its temp directory as `<name>.original`,
//! optionally splits off the entries that must stay unsigned, hands the rest
//! to the signer and merges the preserved entries back in. When credentials
//! are incomplete the archive is left untouched and the run is skipped.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use jarsign_core::config::DEFAULT_TEMP_SUBDIR;
use jarsign_core::patterns::PatternMatcher;
use jarsign_core::{PatternSet, SigningCredentials};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use crate::archive::{move_file, sha256_file};
use crate::error::{Result, SigningError};
use crate::keystore::materialize;
use crate::merge::merge;
use crate::partition::{partition, PreservedEntries};
use crate::signer::{JarSigner, SignRequest};

/// Result of a signing run
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignOutcome {
    /// Credentials were incomplete; the archive was left unsigned
    Skipped {
        /// Missing credential fields
        missing: Vec<&'static str>,
    },
    /// The archive was signed
    Signed(SignReport),
}

impl SignOutcome {
    /// Whether the archive was signed
    pub fn is_signed(&self) -> bool {
        matches!(self, Self::Signed(_))
    }
}

/// Details about a completed signing run
#[derive(Debug, Clone, Serialize)]
pub struct SignReport {
    /// The signed archive
    pub archive: PathBuf,
    /// Copy of the archive as it was before signing
    pub backup: PathBuf,
    /// Number of file entries left unsigned
    pub preserved_entries: usize,
    /// SHA-256 of the final archive
    pub sha256: String,
    /// When signing finished
    pub signed_at: DateTime<Utc>,
}

/// Mutable configuration of a [`SignTask`]
///
/// Credentials usually start from the resolved project-level values;
/// the setters override single fields.
#[derive(Debug, Clone)]
pub struct SignTaskBuilder {
    archive: PathBuf,
    temp_dir: Option<PathBuf>,
    credentials: SigningCredentials,
    patterns: PatternSet,
}

impl SignTaskBuilder {
    /// Replace all credentials
    pub fn with_credentials(mut self, credentials: SigningCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Run a configuration callback against this builder
    pub fn configure(mut self, configure: impl FnOnce(&mut Self)) -> Self {
        configure(&mut self);
        self
    }

    /// Directory for this run's temporary files
    pub fn temp_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Set the key alias
    pub fn alias(&mut self, alias: impl Into<String>) -> &mut Self {
        self.credentials.alias = Some(alias.into());
        self
    }

    /// Set the keystore password
    pub fn store_password(&mut self, password: impl Into<String>) -> &mut Self {
        self.credentials.store_password = Some(password.into());
        self
    }

    /// Set the key password
    pub fn key_password(&mut self, password: impl Into<String>) -> &mut Self {
        self.credentials.key_password = Some(password.into());
        self
    }

    /// Use a keystore file
    pub fn keystore_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.credentials.keystore_file = Some(path.into());
        self
    }

    /// Use base64 encoded keystore data
    pub fn keystore_data(&mut self, data: impl Into<String>) -> &mut Self {
        self.credentials.keystore_data = Some(data.into());
        self
    }

    /// Only sign entries matching these patterns
    pub fn include<I, S>(&mut self, patterns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns.include(patterns);
        self
    }

    /// Leave entries matching these patterns unsigned
    pub fn exclude<I, S>(&mut self, patterns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns.exclude(patterns);
        self
    }

    /// Freeze the configuration
    pub fn build(self) -> Result<SignTask> {
        let matcher = self.patterns.compile()?;
        let temp_dir = match self.temp_dir {
            Some(dir) => dir,
            None => default_temp_dir(&self.archive),
        };

        Ok(SignTask {
            archive: self.archive,
            temp_dir,
            credentials: self.credentials,
            patterns: self.patterns,
            matcher,
        })
    }
}

/// A fully configured signing run for one archive
#[derive(Debug)]
pub struct SignTask {
    archive: PathBuf,
    temp_dir: PathBuf,
    credentials: SigningCredentials,
    patterns: PatternSet,
    matcher: PatternMatcher,
}

impl SignTask {
    /// Start configuring a task for the archive at `archive`
    pub fn builder(archive: impl Into<PathBuf>) -> SignTaskBuilder {
        SignTaskBuilder {
            archive: archive.into(),
            temp_dir: None,
            credentials: SigningCredentials::default(),
            patterns: PatternSet::new(),
        }
    }

    /// The archive this task signs
    pub fn archive(&self) -> &Path {
        &self.archive
    }

    /// Directory holding this run's temporary files
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Credentials used by this task
    pub fn credentials(&self) -> &SigningCredentials {
        &self.credentials
    }

    /// Entry patterns used by this task
    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Sign the archive with `signer`
    ///
    /// Incomplete credentials are not an error: the archive stays untouched
    /// and [`SignOutcome::Skipped`] is returned.
    #[instrument(skip_all, fields(archive = %self.archive.display()))]
    pub fn run(&self, signer: &dyn JarSigner) -> Result<SignOutcome> {
        if !self.credentials.is_sufficient() {
            let missing = self.credentials.missing_fields();
            warn!(
                archive = %self.archive.display(),
                missing = %missing.join(", "),
                "Archive will be unsigned, missing key information"
            );
            return Ok(SignOutcome::Skipped { missing });
        }

        let source = self
            .credentials
            .keystore_source()
            .map_err(|e| SigningError::Configuration(e.to_string()))?
            .ok_or_else(|| {
                SigningError::Configuration(
                    "Signing needs either base64 keystore data or a path to a keystore file"
                        .to_string(),
                )
            })?;
        let credentials = &self.credentials;
        let (alias, store_password) = match (&credentials.alias, &credentials.store_password) {
            (Some(alias), Some(store_password)) => (alias.as_str(), store_password.as_str()),
            _ => {
                return Err(SigningError::Configuration(
                    "alias and store password are required".to_string(),
                ))
            }
        };

        info!(signer = signer.name(), "signing archive");
        fs::create_dir_all(&self.temp_dir)?;

        let file_name = self
            .archive
            .file_name()
            .ok_or_else(|| {
                SigningError::Configuration(format!(
                    "archive path has no file name: {}",
                    self.archive.display()
                ))
            })?
            .to_string_lossy()
            .to_string();
        let backup = self.temp_dir.join(format!("{}.original", file_name));
        move_file(&self.archive, &backup)?;
        debug!(backup = %backup.display(), "moved archive aside");

        let mut input = backup.clone();
        let mut signed_output = self.archive.clone();
        let mut preserved = PreservedEntries::new();

        if !self.matcher.matches_everything() {
            input = self.temp_dir.join(format!("{}.original.unsigned", file_name));
            preserved = partition(&backup, &input, &self.matcher)?;
            if !preserved.is_empty() {
                signed_output = self
                    .temp_dir
                    .join(format!("{}.original.unsigned.signed", file_name));
            }
        }

        let mut keystore = materialize(&source, &self.temp_dir)?;
        let request = SignRequest {
            alias,
            store_password,
            key_password: self.credentials.key_password.as_deref(),
            keystore: keystore.path(),
            input: &input,
            output: &signed_output,
        };
        let signed = signer.sign(&request);
        keystore.cleanup();

        if let Err(e) = signed {
            if signed_output.exists() {
                let _ = fs::remove_file(&signed_output);
            }
            warn!(backup = %backup.display(), "signing failed, original archive kept as backup");
            return Err(e);
        }

        if !preserved.is_empty() {
            merge(&signed_output, &self.archive, &preserved)?;
        }

        let report = SignReport {
            archive: self.archive.clone(),
            backup,
            preserved_entries: preserved.len(),
            sha256: sha256_file(&self.archive)?,
            signed_at: Utc::now(),
        };
        info!(
            archive = %report.archive.display(),
            preserved = report.preserved_entries,
            "archive signed"
        );
        Ok(SignOutcome::Signed(report))
    }
}

/// Per-archive directory under the system temp dir
///
/// The directory name includes a hash of the archive's absolute path.
fn default_temp_dir(archive: &Path) -> PathBuf {
    let absolute = std::env::current_dir()
        .map(|cwd| cwd.join(archive))
        .unwrap_or_else(|_| archive.to_path_buf());
    let digest = format!("{:x}", Sha256::digest(absolute.to_string_lossy().as_bytes()));
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "archive".to_string());

    std::env::temp_dir()
        .join(DEFAULT_TEMP_SUBDIR)
        .join(format!("{}-{}", name, &digest[..12]))
}
