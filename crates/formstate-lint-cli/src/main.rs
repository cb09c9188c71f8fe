//! formstate-lint CLI tool.
//!
//! Usage:
//! ```bash
//! formstate-lint check [--manifest PATH] [--format text|json|compact]
//! formstate-lint list-rules
//! formstate-lint init
//! formstate-lint guard <COMMIT_MSG_FILE>
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Structural invariant checker for gameplay-ability manifests
#[derive(Parser)]
#[command(name = "formstate-lint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a manifest (default command)
    Check {
        /// Manifest to validate (default: from config, then ClaudeContext/manifest.yaml)
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Only run specific rules (comma-separated names or codes)
        #[arg(long)]
        rules: Option<String>,
    },

    /// List available rules
    ListRules,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Reject commits that touch locked files without the bypass token
    Guard {
        /// Commit message file (as passed to a commit-msg hook)
        commit_msg: Option<PathBuf>,

        /// Staged paths; read from `git diff --cached` when omitted
        #[arg(long, num_args = 1..)]
        staged: Vec<String>,
    },
}

/// Output format for lint reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-finding compact format.
    Compact,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let source = config_resolver::resolve(std::path::Path::new("."), cli.config.as_deref());

    match cli.command.unwrap_or(Commands::Check {
        manifest: None,
        format: OutputFormat::Text,
        rules: None,
    }) {
        Commands::Check {
            manifest,
            format,
            rules,
        } => commands::check::run(manifest.as_deref(), format, rules.as_deref(), &source),
        Commands::ListRules => {
            commands::list_rules::run();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { force } => {
            commands::init::run(force)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Guard { commit_msg, staged } => {
            commands::guard::run(commit_msg.as_deref(), staged, &source)
        }
    }
}
