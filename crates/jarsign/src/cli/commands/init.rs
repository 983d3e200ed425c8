//! Init command

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;

use jarsign_core::config::{Config, DEFAULT_CONFIG_TEMPLATE, DEFAULT_CONFIG_TOML, DEFAULT_CONFIG_YAML};

use crate::cli::{output, Cli, OutputFormat};

/// Write a starter jarsign configuration
#[derive(Debug, Args)]
pub struct InitCommand {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,

    /// Write TOML instead of YAML
    #[arg(long)]
    pub toml: bool,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl InitCommand {
    /// Execute the init command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(force = self.force, toml = self.toml, "executing init command");
        let cwd = std::env::current_dir()?;
        let default_name = if self.toml {
            DEFAULT_CONFIG_TOML
        } else {
            DEFAULT_CONFIG_YAML
        };
        let config_path = self
            .output
            .clone()
            .unwrap_or_else(|| cwd.join(default_name));

        if config_path.exists() && !self.force {
            anyhow::bail!(
                "Configuration file already exists at {}. Use --force to overwrite.",
                config_path.display()
            );
        }

        write_config(&config_path, self.toml)?;

        match cli.format {
            OutputFormat::Json => output::json(&serde_json::json!({ "path": config_path }))?,
            OutputFormat::Text => {
                if !cli.quiet {
                    output::success(&format!(
                        "Created {}",
                        output::path_style().apply_to(config_path.display())
                    ));
                }
            }
        }

        Ok(())
    }
}

fn write_config(path: &Path, as_toml: bool) -> anyhow::Result<()> {
    let content = if as_toml {
        let config: Config = serde_yaml::from_str(DEFAULT_CONFIG_TEMPLATE)?;
        toml::to_string_pretty(&config)?
    } else {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    };

    std::fs::write(path, content)?;
    Ok(())
}
