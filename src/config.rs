//! Configuration System
//!
//! Layered configuration: built-in defaults, the global config file, the
//! workspace `dxready.toml`, then `DXREADY__SECTION__KEY` environment
//! variables. An explicit `--config` file replaces both file layers.

use crate::doctor::DoctorStatus;
use crate::error::ReadinessError;
use crate::logging::{LogFormat, LogOutput, LoggingConfig};
use crate::readiness::OutcomeStatus;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

mod merge {
    pub mod merge_policy;
}
mod sources {
    pub mod environment;
    pub mod global_file;
    pub mod workspace_file;
}

pub use sources::global_file::global_config_path;
pub use sources::workspace_file::{workspace_config_path, WORKSPACE_CONFIG_FILE};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DxReadyConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub readiness: ReadinessConfig,

    #[serde(default)]
    pub doctor: DoctorConfig,
}

/// Which helpers each command runs, and how remediation behaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessConfig {
    #[serde(default = "default_doctor_keys")]
    pub doctor_keys: Vec<String>,

    #[serde(default = "default_ensure_keys")]
    pub ensure_keys: Vec<String>,

    /// When false, `composer` only reports and never installs.
    #[serde(default = "default_true")]
    pub install_on_pending: bool,

    #[serde(default = "default_php_binary")]
    pub php_binary: String,
}

fn default_doctor_keys() -> Vec<String> {
    vec!["git".into(), "composer".into(), "php-runtime".into()]
}

fn default_ensure_keys() -> Vec<String> {
    vec!["git".into(), "composer".into()]
}

fn default_true() -> bool {
    true
}

fn default_php_binary() -> String {
    "php".to_string()
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            doctor_keys: default_doctor_keys(),
            ensure_keys: default_ensure_keys(),
            install_on_pending: true,
            php_binary: default_php_binary(),
        }
    }
}

/// Doctor row customisation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctorConfig {
    /// helper key -> (outcome status -> pass|warn|fail)
    #[serde(default)]
    pub status_overrides: BTreeMap<String, BTreeMap<String, String>>,

    /// helper key -> row label
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Readiness(String),
    Doctor(String, String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Readiness(msg) => write!(f, "Readiness: {}", msg),
            ValidationError::Doctor(key, msg) => write!(f, "Doctor '{}': {}", key, msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ReadinessConfig {
    fn validate(&self, errors: &mut Vec<ValidationError>) {
        for (name, keys) in [("doctor_keys", &self.doctor_keys), ("ensure_keys", &self.ensure_keys)] {
            let mut seen = HashSet::new();
            for key in keys {
                if key.trim().is_empty() {
                    errors.push(ValidationError::Readiness(format!(
                        "{} contains an empty key",
                        name
                    )));
                } else if !seen.insert(key.as_str()) {
                    errors.push(ValidationError::Readiness(format!(
                        "{} lists '{}' more than once",
                        name, key
                    )));
                }
            }
        }
        if self.php_binary.trim().is_empty() {
            errors.push(ValidationError::Readiness(
                "php_binary cannot be empty".to_string(),
            ));
        }
    }
}

impl DoctorConfig {
    fn validate(&self, errors: &mut Vec<ValidationError>) {
        for (key, overrides) in &self.status_overrides {
            for (outcome, doctor) in overrides {
                if OutcomeStatus::parse(outcome).is_none() {
                    errors.push(ValidationError::Doctor(
                        key.clone(),
                        format!("unknown outcome status '{}'", outcome),
                    ));
                }
                if DoctorStatus::parse(doctor).is_none() {
                    errors.push(ValidationError::Doctor(
                        key.clone(),
                        format!(
                            "unknown doctor status '{}' (must be 'pass', 'warn', or 'fail')",
                            doctor
                        ),
                    ));
                }
            }
        }
    }
}

impl DxReadyConfig {
    /// Render as TOML, the format of `dxready.toml`.
    pub fn to_toml(&self) -> Result<String, ReadinessError> {
        toml::to_string_pretty(self)
            .map_err(|e| ReadinessError::Config(format!("Failed to serialise configuration: {}", e)))
    }

    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = LogFormat::parse(&self.logging.format) {
            errors.push(ValidationError::Logging(e.to_string()));
        }
        if let Err(e) = LogOutput::parse(&self.logging.output) {
            errors.push(ValidationError::Logging(e.to_string()));
        }
        self.readiness.validate(&mut errors);
        self.doctor.validate(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Loads [`DxReadyConfig`] from its layers.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    global_file: Option<PathBuf>,
    explicit_file: Option<PathBuf>,
    env: Option<config::Map<String, String>>,
}

impl ConfigLoader {
    /// Loader using the platform global config path and the process environment.
    pub fn new() -> Self {
        Self {
            global_file: global_config_path(),
            explicit_file: None,
            env: None,
        }
    }

    pub fn with_global_file(mut self, path: Option<PathBuf>) -> Self {
        self.global_file = path;
        self
    }

    /// Use `path` instead of global and workspace file discovery.
    pub fn with_explicit_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }

    /// Read environment overrides from `vars` instead of the process.
    pub fn with_env(mut self, vars: config::Map<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    /// Load and validate configuration for `workspace_root`.
    pub fn load(&self, workspace_root: &Path) -> Result<DxReadyConfig, ReadinessError> {
        let mut builder = merge::merge_policy::builder_with_defaults()?;

        match &self.explicit_file {
            Some(path) => {
                if !path.is_file() {
                    return Err(ReadinessError::Config(format!(
                        "Configuration file not found: {}",
                        path.display()
                    )));
                }
                builder = builder.add_source(config::File::from(path.as_path()));
            }
            None => {
                builder =
                    sources::global_file::add_to_builder(builder, self.global_file.as_deref());
                builder = sources::workspace_file::add_to_builder(builder, workspace_root);
            }
        }
        builder = sources::environment::add_to_builder(builder, self.env.clone());

        let config: DxReadyConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(validation_failure)?;
        Ok(config)
    }
}

fn validation_failure(errors: Vec<ValidationError>) -> ReadinessError {
    let lines: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    ReadinessError::Config(format!(
        "Configuration validation failed:\n{}",
        lines.join("\n")
    ))
}
