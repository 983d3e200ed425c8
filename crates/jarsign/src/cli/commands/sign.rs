//! Sign command

use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use tracing::info;

use jarsign_core::{CredentialResolver, PatternSet, SigningCredentials};
use jarsign_signing::{JarSigner, SignOutcome, SignTask};

use super::project::{parse_property, LookupOptions, Project};
use crate::cli::{output, Cli, OutputFormat};

/// Sign one archive
#[derive(Debug, Args)]
pub struct SignCommand {
    /// Path to the archive to sign
    #[arg(required = true)]
    pub archive: PathBuf,

    /// Key alias
    #[arg(long)]
    pub alias: Option<String>,

    /// Keystore password
    #[arg(long, env = "JARSIGN_STORE_PASS", hide_env_values = true)]
    pub store_pass: Option<String>,

    /// Private key password
    #[arg(long, env = "JARSIGN_KEY_PASS", hide_env_values = true)]
    pub key_pass: Option<String>,

    /// Keystore file
    #[arg(long, conflicts_with = "keystore_data")]
    pub keystore: Option<PathBuf>,

    /// Base64 encoded keystore
    #[arg(long, env = "JARSIGN_KEYSTORE_DATA", hide_env_values = true)]
    pub keystore_data: Option<String>,

    /// Only sign entries matching this glob (repeatable)
    #[arg(long = "include", value_name = "GLOB")]
    pub includes: Vec<String>,

    /// Leave entries matching this glob unsigned (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    pub excludes: Vec<String>,

    /// Directory for temporary files
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,

    /// Prefix for property and environment lookup
    #[arg(long)]
    pub env_prefix: Option<String>,

    /// Do not detect credentials from properties or the environment
    #[arg(long)]
    pub no_auto_detect: bool,

    /// Build property used for credential detection (repeatable)
    #[arg(short = 'P', value_name = "KEY=VALUE", value_parser = parse_property)]
    pub properties: Vec<(String, String)>,

    /// Path to the jarsigner executable
    #[arg(long)]
    pub jarsigner: Option<PathBuf>,
}

impl SignCommand {
    /// Execute the sign command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(archive = %self.archive.display(), "executing sign command");
        let project = Project::load()?;
        let resolver = project.resolver(&self.lookup_options());
        let archive = project.cli_path(&self.archive);

        let mut overrides = SigningCredentials::default();
        let mut patterns = PatternSet::new();
        if let Some(entry) = project.archive_config(&archive) {
            overrides = project.archive_credentials(entry);
            patterns = entry.patterns()?;
        }
        overrides = overrides.merge(&self.credentials(&project));
        if !self.includes.is_empty() || !self.excludes.is_empty() {
            patterns = PatternSet::new();
            patterns
                .include(self.includes.iter().cloned())
                .exclude(self.excludes.iter().cloned());
        }

        let temp_dir = self
            .temp_dir
            .as_deref()
            .map(|dir| project.cli_path(dir))
            .or_else(|| project.temp_dir_for(&archive));
        let signer = project.signer(self.jarsigner.as_deref());

        let outcome = sign_archive(
            &archive,
            &resolver,
            &overrides,
            patterns,
            temp_dir,
            &signer,
        )?;

        match cli.format {
            OutputFormat::Json => output::json(&serde_json::json!({
                "archive": archive,
                "outcome": outcome,
            }))?,
            OutputFormat::Text => {
                if !cli.quiet {
                    print_outcome(&archive, &outcome);
                }
            }
        }

        Ok(())
    }

    fn lookup_options(&self) -> LookupOptions {
        LookupOptions {
            properties: self.properties.clone(),
            env_prefix: self.env_prefix.clone(),
            no_auto_detect: self.no_auto_detect,
        }
    }

    fn credentials(&self, project: &Project) -> SigningCredentials {
        SigningCredentials {
            alias: self.alias.clone(),
            store_password: self.store_pass.clone(),
            key_password: self.key_pass.clone(),
            keystore_file: self.keystore.as_deref().map(|p| project.cli_path(p)),
            keystore_data: self.keystore_data.clone(),
        }
    }
}

/// Resolve credentials and run one signing task
pub(super) fn sign_archive(
    archive: &Path,
    resolver: &CredentialResolver,
    overrides: &SigningCredentials,
    patterns: PatternSet,
    temp_dir: Option<PathBuf>,
    signer: &dyn JarSigner,
) -> anyhow::Result<SignOutcome> {
    if !archive.is_file() {
        anyhow::bail!("Archive not found: {}", archive.display());
    }

    let credentials = resolver.resolve(overrides);
    let task = SignTask::builder(archive)
        .with_credentials(credentials)
        .configure(|b| {
            b.include(patterns.includes().iter().cloned())
                .exclude(patterns.excludes().iter().cloned());
            if let Some(dir) = temp_dir {
                b.temp_dir(dir);
            }
        })
        .build()?;

    if task.credentials().is_sufficient() && !signer.is_available() {
        anyhow::bail!(
            "{} is not available. Install a JDK, set JAVA_HOME or pass --jarsigner",
            signer.name()
        );
    }

    Ok(task.run(signer)?)
}

/// Print a signing outcome as text
pub(super) fn print_outcome(archive: &Path, outcome: &SignOutcome) {
    match outcome {
        SignOutcome::Signed(report) => {
            output::success(&format!(
                "Signed {}",
                output::path_style().apply_to(archive.display())
            ));
            if report.preserved_entries > 0 {
                println!(
                    "{}",
                    output::key_value("Unsigned entries", &report.preserved_entries.to_string())
                );
            }
            println!("{}", output::key_value("SHA-256", &report.sha256));
            println!(
                "{}",
                output::key_value("Backup", &report.backup.display().to_string())
            );
        }
        SignOutcome::Skipped { missing } => {
            output::warning(&format!(
                "{} left unsigned, missing {}",
                output::path_style().apply_to(archive.display()),
                style(missing.join(", ")).yellow()
            ));
        }
    }
}
