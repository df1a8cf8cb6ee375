//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod protect;
mod scan;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "doblock")]
#[command(about = "Password-protect PDFs with the date of birth printed on their first page")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Extract dates of birth and show the derived passwords
    Scan {
        /// PDF files or directories of PDFs
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Output the working set as JSON
        #[arg(long)]
        json: bool,
        /// Write an HTML report
        #[arg(long)]
        report: bool,
        /// Directory for the report (default: next to the first input)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Extract dates of birth and write password-protected copies
    Protect {
        /// PDF files or directories of PDFs
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Output directory (default: next to each input file)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Password for a file, as FILE_NAME=PASSWORD (repeatable)
        #[arg(short, long = "password", value_name = "NAME=PASSWORD")]
        passwords: Vec<String>,
        /// Never prompt for missing passwords
        #[arg(long)]
        no_prompt: bool,
        /// Protect the files that have a password and skip the rest
        #[arg(long)]
        skip_missing: bool,
        /// Write an HTML report after protecting
        #[arg(long)]
        report: bool,
    },

    /// Check if required external tools are installed
    Check,
}

impl Commands {
    fn output_dir(&self) -> Option<PathBuf> {
        match self {
            Commands::Scan { output_dir, .. } | Commands::Protect { output_dir, .. } => {
                output_dir.clone()
            }
            Commands::Check => None,
        }
    }
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        output_dir: cli.command.output_dir(),
    };
    let (settings, _config) = load_settings_with_options(options)
        .await
        .map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Scan {
            paths,
            json,
            report,
            ..
        } => scan::cmd_scan(&settings, &paths, json, report).await,
        Commands::Protect {
            paths,
            passwords,
            no_prompt,
            skip_missing,
            report,
            ..
        } => {
            protect::cmd_protect(
                &settings,
                &paths,
                protect::ProtectOptions {
                    passwords,
                    no_prompt,
                    skip_missing,
                    report,
                },
            )
            .await
        }
        Commands::Check => check::cmd_check(&settings).await,
    }
}
