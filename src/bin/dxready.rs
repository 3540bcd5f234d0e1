//! dxready CLI Binary
//!
//! Command-line interface for the readiness orchestrator.

use anyhow::Context as _;
use clap::Parser;
use dxready::cli::{Cli, CommandReport, RunContext};
use dxready::config::ConfigLoader;
use dxready::error::ReadinessError;
use dxready::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(&logging_config) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("dxready starting");

    match run(&cli).await {
        Ok(report) => {
            println!("{}", report.output);
            if !report.success {
                process::exit(1);
            }
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            match e.downcast_ref::<ReadinessError>() {
                Some(readiness) => eprintln!("{}", dxready::cli::map_error(readiness)),
                None => eprintln!("{:#}", e),
            }
            process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<CommandReport> {
    let context = RunContext::new(cli.workspace.clone(), cli.config.clone())
        .with_context(|| format!("Failed to initialise workspace {}", cli.workspace.display()))?;
    let report = context.execute(&cli.command).await?;
    Ok(report)
}

/// Build logging configuration from CLI args and config file.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_explicit_file(path);
    }
    let mut config = loader
        .load(&cli.workspace)
        .map(|c| c.logging)
        .unwrap_or_default();

    // Quiet unless asked: report output goes to stdout and should stay clean.
    if !cli.verbose && cli.log_level.is_none() {
        config.level = "off".to_string();
    } else if cli.verbose && cli.log_level.is_none() {
        config.level = "info".to_string();
    }

    if let Some(level) = &cli.log_level {
        config.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.format = format.clone();
    }
    if let Some(output) = &cli.log_output {
        config.output = output.clone();
    }
    if let Some(file) = &cli.log_file {
        config.file = file.clone();
    }
    config
}
