//! Status command

use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::info;

use jarsign_core::SigningCredentials;
use jarsign_signing::JarSigner;

use super::project::{parse_property, LookupOptions, Project};
use crate::cli::{output, Cli, OutputFormat};

/// Show which signing credentials resolve
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Archive whose configured overrides should be applied
    pub archive: Option<PathBuf>,

    /// Prefix for property and environment lookup
    #[arg(long)]
    pub env_prefix: Option<String>,

    /// Do not detect credentials from properties or the environment
    #[arg(long)]
    pub no_auto_detect: bool,

    /// Build property used for credential detection (repeatable)
    #[arg(short = 'P', value_name = "KEY=VALUE", value_parser = parse_property)]
    pub properties: Vec<(String, String)>,
}

/// Credential state without secret values
#[derive(Debug, Serialize)]
struct CredentialStatus {
    alias: Option<String>,
    store_password: bool,
    key_password: bool,
    keystore: Option<String>,
    missing: Vec<&'static str>,
    sufficient: bool,
}

impl CredentialStatus {
    fn new(credentials: &SigningCredentials) -> Self {
        let keystore = match (&credentials.keystore_file, &credentials.keystore_data) {
            (Some(_), Some(_)) => Some("conflict: file and inline data".to_string()),
            (Some(file), None) => Some(file.display().to_string()),
            (None, Some(_)) => Some("inline data".to_string()),
            (None, None) => None,
        };

        Self {
            alias: credentials.alias.clone(),
            store_password: credentials.store_password.is_some(),
            key_password: credentials.key_password.is_some(),
            keystore,
            missing: credentials.missing_fields(),
            sufficient: credentials.is_sufficient(),
        }
    }
}

impl StatusCommand {
    /// Execute the status command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing status command");
        let project = Project::load()?;
        let resolver = project.resolver(&LookupOptions {
            properties: self.properties.clone(),
            env_prefix: self.env_prefix.clone(),
            no_auto_detect: self.no_auto_detect,
        });

        let overrides = self
            .archive
            .as_deref()
            .and_then(|a| project.archive_config(a))
            .map(|entry| project.archive_credentials(entry))
            .unwrap_or_default();
        let credentials = CredentialStatus::new(&resolver.resolve(&overrides));

        let signer = project.signer(None);
        let auto_detect = project.config.signing.auto_detect && !self.no_auto_detect;
        let prefix = self
            .env_prefix
            .clone()
            .or_else(|| project.config.env_prefix().map(str::to_string));

        match cli.format {
            OutputFormat::Json => output::json(&serde_json::json!({
                "config_found": project.config_path.is_some(),
                "config_path": project.config_path,
                "auto_detect": auto_detect,
                "env_prefix": prefix,
                "credentials": credentials,
                "jarsigner": signer.path(),
                "archives": project.config.archives.iter().map(|a| &a.path).collect::<Vec<_>>(),
            }))?,
            OutputFormat::Text => {
                println!("{}", output::header("jarsign Status"));
                println!();

                println!("{}", style("Configuration").underlined());
                match &project.config_path {
                    Some(path) => println!(
                        "{}",
                        output::key_value(
                            "Config file",
                            &output::path_style().apply_to(path.display()).to_string()
                        )
                    ),
                    None => println!(
                        "{}",
                        output::key_value(
                            "Config file",
                            &format!("{} (using defaults)", style("not found").yellow())
                        )
                    ),
                }
                println!(
                    "{}",
                    output::key_value("Auto-detect", if auto_detect { "on" } else { "off" })
                );
                println!(
                    "{}",
                    output::key_value("Lookup prefix", prefix.as_deref().unwrap_or("(none)"))
                );
                println!(
                    "{}",
                    output::key_value("Archives", &project.config.archives.len().to_string())
                );
                println!();

                println!("{}", style("Credentials").underlined());
                println!(
                    "{}",
                    output::key_value("Alias", credentials.alias.as_deref().unwrap_or("-"))
                );
                println!(
                    "{}",
                    output::key_value("Store password", set_or_missing(credentials.store_password))
                );
                println!(
                    "{}",
                    output::key_value("Key password", set_or_missing(credentials.key_password))
                );
                println!(
                    "{}",
                    output::key_value("Keystore", credentials.keystore.as_deref().unwrap_or("-"))
                );
                if credentials.sufficient {
                    output::success("Credentials complete");
                } else {
                    output::warning(&format!(
                        "Archives will be left unsigned, missing {}",
                        credentials.missing.join(", ")
                    ));
                }
                println!();

                println!("{}", style("Tools").underlined());
                match signer.path() {
                    Some(path) if signer.is_available() => println!(
                        "{}",
                        output::key_value(
                            "jarsigner",
                            &output::path_style().apply_to(path.display()).to_string()
                        )
                    ),
                    _ => println!(
                        "{}",
                        output::key_value("jarsigner", &style("not found").red().to_string())
                    ),
                }
            }
        }

        Ok(())
    }
}

fn set_or_missing(present: bool) -> &'static str {
    if present {
        "set"
    } else {
        "missing"
    }
}
