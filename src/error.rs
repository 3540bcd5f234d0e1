//! Error types for the readiness orchestrator.
//!
//! Errors are grouped by origin: developer mistakes in registry or helper usage,
//! environmental preconditions a helper cannot fix, remediation failures raised
//! while a helper is working, and anything else wrapped as unknown.

use crate::readiness::{OutcomeStatus, ReadinessKey, ReadinessPhase};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by the registry, the plan runner, and helper phases.
#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("Developer error: {0}")]
    Developer(String),

    #[error("Environmental error ({reason}): {message}")]
    Environmental { reason: String, message: String },

    #[error("Remediation failed: {0}")]
    Remediation(String),

    #[error("Command `{command}` failed{}", exit_suffix(.exit_code))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unexpected error during readiness orchestration: {0}")]
    Unknown(String),

    /// A run aborted; carries the aggregate produced while unwinding.
    #[error(transparent)]
    Aborted(Arc<AggregateError>),

    #[error(transparent)]
    Unready(#[from] UnreadyError),
}

fn exit_suffix(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!(" with exit code {}", code),
        None => String::new(),
    }
}

impl ReadinessError {
    pub fn developer(message: impl Into<String>) -> Self {
        ReadinessError::Developer(message.into())
    }

    pub fn environmental(reason: impl Into<String>, message: impl Into<String>) -> Self {
        ReadinessError::Environmental {
            reason: reason.into(),
            message: message.into(),
        }
    }

    pub fn remediation(message: impl Into<String>) -> Self {
        ReadinessError::Remediation(message.into())
    }

    /// Stable code used in log summaries and serialized reports.
    pub fn code(&self) -> &'static str {
        match self {
            ReadinessError::Developer(_) => "DeveloperError",
            ReadinessError::Environmental { .. } => "EnvironmentalError",
            ReadinessError::Remediation(_) => "RemediationError",
            ReadinessError::CommandFailed { .. } => "CommandFailed",
            ReadinessError::Io(_) => "IoError",
            ReadinessError::Config(_) => "ConfigError",
            ReadinessError::Unknown(_) => "UnknownError",
            ReadinessError::Aborted(_) => "ReadinessAborted",
            ReadinessError::Unready(_) => "ReadinessUnready",
        }
    }

    /// Extra lines worth showing under a one-line failure headline.
    pub fn detail_lines(&self) -> Vec<String> {
        match self {
            ReadinessError::CommandFailed {
                exit_code, stderr, ..
            } => {
                let mut lines: Vec<String> = stderr
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .take(3)
                    .map(String::from)
                    .collect();
                if let Some(code) = exit_code {
                    lines.push(format!("exit code: {}", code));
                }
                lines
            }
            ReadinessError::Environmental { reason, .. } => vec![format!("reason: {}", reason)],
            _ => Vec::new(),
        }
    }
}

impl From<anyhow::Error> for ReadinessError {
    fn from(err: anyhow::Error) -> Self {
        ReadinessError::Unknown(format!("{:#}", err))
    }
}

impl From<config::ConfigError> for ReadinessError {
    fn from(err: config::ConfigError) -> Self {
        ReadinessError::Config(err.to_string())
    }
}

/// Which compensating action produced a secondary failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationKind {
    Cleanup,
    Rollback,
}

impl fmt::Display for CompensationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompensationKind::Cleanup => write!(f, "cleanup"),
            CompensationKind::Rollback => write!(f, "rollback"),
        }
    }
}

/// A failure raised while unwinding after a helper failed.
#[derive(Debug)]
pub struct SecondaryFailure {
    pub key: ReadinessKey,
    pub kind: CompensationKind,
    pub error: ReadinessError,
}

impl fmt::Display for SecondaryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} failed: {}", self.key, self.kind, self.error)
    }
}

/// Primary failure of an aborted run plus everything that went wrong during rollback.
#[derive(Debug)]
pub struct AggregateError {
    pub key: ReadinessKey,
    pub phase: ReadinessPhase,
    pub primary: ReadinessError,
    pub secondary: Vec<SecondaryFailure>,
}

impl AggregateError {
    pub fn new(
        key: ReadinessKey,
        phase: ReadinessPhase,
        primary: ReadinessError,
        secondary: Vec<SecondaryFailure>,
    ) -> Self {
        Self {
            key,
            phase,
            primary,
            secondary,
        }
    }

    pub fn has_secondary(&self) -> bool {
        !self.secondary.is_empty()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Readiness helper '{}' failed during {}: {}",
            self.key, self.phase, self.primary
        )?;
        if !self.secondary.is_empty() {
            write!(
                f,
                "; rollback reported {} additional failure(s): ",
                self.secondary.len()
            )?;
            let joined: Vec<String> = self.secondary.iter().map(|s| s.to_string()).collect();
            write!(f, "{}", joined.join(" | "))?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.primary)
    }
}

/// One helper that did not reach a usable state.
#[derive(Debug, Clone, Serialize)]
pub struct UnreadyEntry {
    pub key: ReadinessKey,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Raised by the assertion layer when a completed run left helpers unusable.
#[derive(Debug, Clone, Serialize)]
pub struct UnreadyError {
    pub entries: Vec<UnreadyEntry>,
}

impl fmt::Display for UnreadyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|entry| match &entry.message {
                Some(message) => format!("{} ({}: {})", entry.key, entry.status, message),
                None => format!("{} ({})", entry.key, entry.status),
            })
            .collect();
        write!(f, "Readiness checks did not complete: {}", parts.join(", "))
    }
}

impl std::error::Error for UnreadyError {}
