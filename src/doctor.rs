//! Doctor report: maps readiness outcomes to pass/warn/fail rows.
//!
//! Produces the rows for `dxready doctor` and renders them as a table or JSON.
//! Per-key overrides (built-in and from `[doctor]` config) tighten or relax the
//! default mapping.

use crate::config::DoctorConfig;
use crate::error::ReadinessError;
use crate::helpers::PHP_RUNTIME_KEY;
use crate::readiness::{HelperDescriptor, Outcome, OutcomeStatus, RunResult};
use chrono::{SecondsFormat, Utc};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const NO_MESSAGE: &str = "Readiness helper produced no message.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoctorStatus {
    Pass,
    Warn,
    Fail,
}

impl DoctorStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pass" => Some(DoctorStatus::Pass),
            "warn" => Some(DoctorStatus::Warn),
            "fail" => Some(DoctorStatus::Fail),
            _ => None,
        }
    }

    /// Mapping used when no override applies.
    pub fn default_for(status: OutcomeStatus) -> Self {
        match status {
            OutcomeStatus::Ready | OutcomeStatus::Updated => DoctorStatus::Pass,
            OutcomeStatus::Pending | OutcomeStatus::Blocked => DoctorStatus::Warn,
            OutcomeStatus::Failed => DoctorStatus::Fail,
        }
    }
}

impl fmt::Display for DoctorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoctorStatus::Pass => write!(f, "pass"),
            DoctorStatus::Warn => write!(f, "warn"),
            DoctorStatus::Fail => write!(f, "fail"),
        }
    }
}

/// One doctor row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorCheckResult {
    pub key: String,
    pub label: String,
    pub status: DoctorStatus,
    pub message: String,
}

/// Outcome status to doctor status, with per-key overrides and labels.
#[derive(Debug, Clone)]
pub struct DoctorMapper {
    overrides: HashMap<String, HashMap<OutcomeStatus, DoctorStatus>>,
    labels: HashMap<String, String>,
}

impl Default for DoctorMapper {
    fn default() -> Self {
        let mut overrides = HashMap::new();
        overrides.insert(
            PHP_RUNTIME_KEY.to_string(),
            HashMap::from([
                (OutcomeStatus::Pending, DoctorStatus::Fail),
                (OutcomeStatus::Blocked, DoctorStatus::Fail),
            ]),
        );
        Self {
            overrides,
            labels: HashMap::new(),
        }
    }
}

impl DoctorMapper {
    /// Built-in overrides merged with `config`; config entries win.
    pub fn from_config(config: &DoctorConfig) -> Result<Self, ReadinessError> {
        let mut mapper = Self::default();
        for (key, entries) in &config.status_overrides {
            let target = mapper.overrides.entry(key.clone()).or_default();
            for (outcome, doctor) in entries {
                let outcome = OutcomeStatus::parse(outcome).ok_or_else(|| {
                    ReadinessError::Config(format!(
                        "Unknown outcome status '{}' in doctor overrides for {}",
                        outcome, key
                    ))
                })?;
                let doctor = DoctorStatus::parse(doctor).ok_or_else(|| {
                    ReadinessError::Config(format!(
                        "Unknown doctor status '{}' in doctor overrides for {}",
                        doctor, key
                    ))
                })?;
                target.insert(outcome, doctor);
            }
        }
        mapper.labels.extend(
            config
                .labels
                .iter()
                .map(|(key, label)| (key.clone(), label.clone())),
        );
        Ok(mapper)
    }

    pub fn status_for(&self, key: &str, status: OutcomeStatus) -> DoctorStatus {
        self.overrides
            .get(key)
            .and_then(|entries| entries.get(&status))
            .copied()
            .unwrap_or_else(|| DoctorStatus::default_for(status))
    }

    /// Configured label, else helper metadata label, else `Readiness: <key>`.
    pub fn label_for(&self, key: &str, descriptor: Option<&HelperDescriptor>) -> String {
        if let Some(label) = self.labels.get(key) {
            return label.clone();
        }
        descriptor
            .map(|d| d.metadata.label.clone())
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| format!("Readiness: {}", key))
    }

    pub fn map_outcome(
        &self,
        outcome: &Outcome,
        descriptor: Option<&HelperDescriptor>,
    ) -> DoctorCheckResult {
        let key = outcome.key.as_str();
        let message = outcome
            .message()
            .map(str::to_string)
            .or_else(|| outcome.error.as_ref().map(|e| e.primary.to_string()))
            .unwrap_or_else(|| NO_MESSAGE.to_string());
        DoctorCheckResult {
            key: format!("readiness:{}", key),
            label: self.label_for(key, descriptor),
            status: self.status_for(key, outcome.status),
            message,
        }
    }
}

/// Rows for one doctor run plus the abort error, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorReport {
    /// RFC 3339, UTC.
    pub generated_at: String,
    pub checks: Vec<DoctorCheckResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DoctorReport {
    pub fn has_failures(&self) -> bool {
        self.error.is_some() || self.checks.iter().any(|c| c.status == DoctorStatus::Fail)
    }

    pub fn count(&self, status: DoctorStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }
}

pub fn build_report(
    result: &RunResult,
    descriptors: &[HelperDescriptor],
    mapper: &DoctorMapper,
) -> DoctorReport {
    let checks = result
        .outcomes
        .iter()
        .map(|outcome| {
            let descriptor = descriptors.iter().find(|d| d.key == outcome.key);
            mapper.map_outcome(outcome, descriptor)
        })
        .collect();
    DoctorReport {
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        checks,
        error: result.error.as_ref().map(|e| e.to_string()),
    }
}

pub fn format_report_json(report: &DoctorReport) -> Result<String, ReadinessError> {
    serde_json::to_string_pretty(report)
        .map_err(|e| ReadinessError::Unknown(format!("Failed to serialise doctor report: {}", e)))
}

fn status_cell(status: DoctorStatus, color: bool) -> String {
    let text = status.to_string().to_uppercase();
    if !color {
        return text;
    }
    match status {
        DoctorStatus::Pass => text.green().to_string(),
        DoctorStatus::Warn => text.yellow().to_string(),
        DoctorStatus::Fail => text.red().bold().to_string(),
    }
}

pub fn format_report_text(report: &DoctorReport, color: bool) -> String {
    let mut out = String::new();
    let heading = "Readiness Doctor";
    if color {
        out.push_str(&format!("{}\n\n", heading.bold().underline()));
    } else {
        out.push_str(&format!("{}\n\n", heading));
    }

    if report.checks.is_empty() {
        out.push_str("No readiness checks ran.\n");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Status", "Check", "Message"]);
        for check in &report.checks {
            table.add_row(vec![
                status_cell(check.status, color),
                check.label.clone(),
                check.message.clone(),
            ]);
        }
        out.push_str(&format!("{}\n\n", table));
    }

    out.push_str(&format!(
        "{} passed, {} warnings, {} failed\n",
        report.count(DoctorStatus::Pass),
        report.count(DoctorStatus::Warn),
        report.count(DoctorStatus::Fail)
    ));
    if let Some(error) = &report.error {
        out.push_str(&format!("\nRun aborted: {}\n", error));
    }
    out
}
