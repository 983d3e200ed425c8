//! Run command: sign every configured archive

use clap::Args;
use serde::Serialize;
use tracing::info;

use jarsign_signing::SignOutcome;

use super::project::{parse_property, LookupOptions, Project};
use super::sign::{print_outcome, sign_archive};
use crate::cli::{output, Cli, OutputFormat};

/// Sign every archive listed in the configuration
#[derive(Debug, Args)]
pub struct RunCommand {
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
    pub jarsigner: Option<std::path::PathBuf>,
}

#[derive(Debug, Serialize)]
struct ArchiveResult {
    archive: std::path::PathBuf,
    outcome: SignOutcome,
}

impl RunCommand {
    /// Execute the run command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let project = Project::load()?;
        if project.config_path.is_none() {
            anyhow::bail!("No jarsign configuration found. Run `jarsign init` to create one.");
        }
        if project.config.archives.is_empty() {
            anyhow::bail!("No archives configured");
        }
        info!(archives = project.config.archives.len(), "executing run command");

        let resolver = project.resolver(&LookupOptions {
            properties: self.properties.clone(),
            env_prefix: self.env_prefix.clone(),
            no_auto_detect: self.no_auto_detect,
        });
        let signer = project.signer(self.jarsigner.as_deref());

        let mut results = Vec::with_capacity(project.config.archives.len());
        for entry in &project.config.archives {
            let archive = project.resolve_path(&entry.path);
            let outcome = sign_archive(
                &archive,
                &resolver,
                &project.archive_credentials(entry),
                entry.patterns()?,
                project.temp_dir_for(&archive),
                &signer,
            )?;

            if cli.format == OutputFormat::Text && !cli.quiet {
                print_outcome(&archive, &outcome);
            }
            results.push(ArchiveResult { archive, outcome });
        }

        match cli.format {
            OutputFormat::Json => output::json(&results)?,
            OutputFormat::Text => {
                if !cli.quiet {
                    let signed = results.iter().filter(|r| r.outcome.is_signed()).count();
                    println!();
                    println!(
                        "{}",
                        output::header(&format!(
                            "{} of {} archives signed",
                            signed,
                            results.len()
                        ))
                    );
                }
            }
        }

        Ok(())
    }
}
