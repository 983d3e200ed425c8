//! Verify command

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use jarsign_signing::{JarSigner, SignatureStatus};

use super::project::Project;
use crate::cli::{output, Cli, OutputFormat};

/// Verify the signature of an archive
#[derive(Debug, Args)]
pub struct VerifyCommand {
    /// Path to the archive to verify
    #[arg(required = true)]
    pub archive: PathBuf,

    /// Path to the jarsigner executable
    #[arg(long)]
    pub jarsigner: Option<PathBuf>,
}

impl VerifyCommand {
    /// Execute the verify command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(archive = %self.archive.display(), "executing verify command");
        let project = Project::load()?;
        let archive = project.cli_path(&self.archive);
        let signer = project.signer(self.jarsigner.as_deref());

        let status = signer.verify(&archive)?;

        match cli.format {
            OutputFormat::Json => output::json(&serde_json::json!({
                "archive": archive,
                "status": status,
            }))?,
            OutputFormat::Text => {
                if !cli.quiet {
                    let message = format!(
                        "{}: {}",
                        output::path_style().apply_to(archive.display()),
                        status
                    );
                    match status {
                        SignatureStatus::Valid => output::success(&message),
                        SignatureStatus::NotSigned => output::warning(&message),
                        SignatureStatus::Invalid => output::error(&message),
                    }
                }
            }
        }

        if status == SignatureStatus::Invalid {
            anyhow::bail!("Signature verification failed for {}", archive.display());
        }
        Ok(())
    }
}
