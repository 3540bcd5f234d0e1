//! CLI parse: clap types for dxready. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// dxready - Developer environment readiness checks
#[derive(Parser, Debug)]
#[command(name = "dxready")]
#[command(about = "Detect, remediate and confirm developer environment readiness")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (replaces global and workspace config discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Run readiness checks and report pass/warn/fail per helper
    Doctor {
        /// Helper keys to run, comma separated (default: readiness.doctor_keys)
        #[arg(long, value_delimiter = ',')]
        keys: Vec<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Run readiness helpers and fail unless every one is ready
    Ensure {
        /// Helper keys to run, comma separated (default: readiness.ensure_keys)
        #[arg(long, value_delimiter = ',')]
        keys: Vec<String>,
    },
    /// List registered readiness helpers
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
        /// Only helpers declaring this scope
        #[arg(long)]
        scope: Option<String>,
    },
    /// Print the effective configuration as TOML
    Config,
}
