//! Logging System
//!
//! Structured logging through `tracing`. Level, format and destination come
//! from [`LoggingConfig`], overridden by `DXREADY_LOG*` environment variables.

use crate::error::ReadinessError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub const ENV_LOG: &str = "DXREADY_LOG";
pub const ENV_LOG_FORMAT: &str = "DXREADY_LOG_FORMAT";
pub const ENV_LOG_OUTPUT: &str = "DXREADY_LOG_OUTPUT";
pub const ENV_LOG_MODULES: &str = "DXREADY_LOG_MODULES";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Disable to skip subscriber installation entirely.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path when output is "file"
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// Colored output (text format on a terminal stream only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from(".dxready/dxready.log")
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: default_log_file(),
            color: default_true(),
            modules: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Result<Self, ReadinessError> {
        match value {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ReadinessError::Config(format!(
                "Invalid log format: {} (must be 'json' or 'text')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    File,
}

impl LogOutput {
    pub fn parse(value: &str) -> Result<Self, ReadinessError> {
        match value {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            "file" => Ok(LogOutput::File),
            other => Err(ReadinessError::Config(format!(
                "Invalid log output: {} (must be 'stdout', 'stderr', or 'file')",
                other
            ))),
        }
    }
}

/// Effective settings after environment overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLogging {
    pub directives: String,
    pub format: LogFormat,
    pub output: LogOutput,
}

/// Apply environment overrides to `config`.
///
/// `DXREADY_LOG` replaces the whole filter. `DXREADY_LOG_MODULES` is a
/// comma-separated `module=level` list appended to the configured modules.
pub fn resolve(
    config: &LoggingConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedLogging, ReadinessError> {
    let format = LogFormat::parse(env(ENV_LOG_FORMAT).as_deref().unwrap_or(&config.format))?;
    let output = LogOutput::parse(env(ENV_LOG_OUTPUT).as_deref().unwrap_or(&config.output))?;

    let directives = match env(ENV_LOG).filter(|value| !value.trim().is_empty()) {
        Some(filter) => filter,
        None => {
            let mut parts = vec![config.level.clone()];
            if config.level != "off" {
                for (module, level) in &config.modules {
                    parts.push(format!("{}={}", module, level));
                }
                if let Some(modules) = env(ENV_LOG_MODULES) {
                    for spec in modules.split(',') {
                        if let Some((module, level)) = spec.split_once('=') {
                            parts.push(format!("{}={}", module.trim(), level.trim()));
                        }
                    }
                }
            }
            parts.join(",")
        }
    };

    Ok(ResolvedLogging {
        directives,
        format,
        output,
    })
}

/// Install the global subscriber. Returns without error when logging is
/// disabled or a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ReadinessError> {
    if !config.enabled {
        return Ok(());
    }

    let resolved = resolve(config, |name| std::env::var(name).ok())?;
    let filter = EnvFilter::try_new(&resolved.directives).map_err(|e| {
        ReadinessError::Config(format!(
            "Invalid log directive '{}': {}",
            resolved.directives, e
        ))
    })?;

    let writer = match resolved.output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::File => BoxMakeWriter::new(Arc::new(open_log_file(&config.file)?)),
    };
    let use_color = config.color && resolved.output != LogOutput::File;

    let subscriber = Registry::default().with(filter);
    let installed = match resolved.format {
        LogFormat::Json => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Text => subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(use_color)
                    .with_writer(writer),
            )
            .try_init(),
    };

    if installed.is_err() {
        tracing::debug!("Global subscriber already installed; keeping it");
    }
    Ok(())
}

fn open_log_file(path: &PathBuf) -> Result<std::fs::File, ReadinessError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            ReadinessError::Config(format!("Failed to create log directory: {}", e))
        })?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            ReadinessError::Config(format!("Failed to open log file {:?}: {}", path, e))
        })
}
