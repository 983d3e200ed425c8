//! CLI definition and command handling

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use commands::{InitCommand, RunCommand, SignCommand, StatusCommand, VerifyCommand};

/// jarsign - sign selected entries of Java archives
#[derive(Debug, Parser)]
#[command(name = "jarsign")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a starter jarsign configuration
    Init(InitCommand),

    /// Sign one archive
    Sign(SignCommand),

    /// Sign every archive listed in the configuration
    Run(RunCommand),

    /// Show which signing credentials resolve
    Status(StatusCommand),

    /// Verify the signature of an archive
    Verify(VerifyCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(&self) -> anyhow::Result<()> {
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match &self.command {
            Commands::Init(cmd) => cmd.execute(self),
            Commands::Sign(cmd) => cmd.execute(self),
            Commands::Run(cmd) => cmd.execute(self),
            Commands::Status(cmd) => cmd.execute(self),
            Commands::Verify(cmd) => cmd.execute(self),
        }
    }
}
