//! CLI presentation: text and JSON rendering for list and ensure.

use crate::error::ReadinessError;
use crate::readiness::{HelperDescriptor, RunResult};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;

fn phases_cell(descriptor: &HelperDescriptor) -> String {
    let mut phases = vec!["detect"];
    if descriptor.phases.prepare {
        phases.push("prepare");
    }
    if descriptor.phases.execute {
        phases.push("execute");
    }
    phases.push("confirm");
    if descriptor.phases.rollback {
        phases.push("rollback");
    }
    phases.join(", ")
}

pub fn format_list_text(descriptors: &[HelperDescriptor]) -> String {
    if descriptors.is_empty() {
        return "No readiness helpers registered.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Key", "Label", "Scopes", "Phases"]);
    for descriptor in descriptors {
        table.add_row(vec![
            descriptor.key.to_string(),
            descriptor.metadata.label.clone(),
            descriptor.metadata.scopes.join(", "),
            phases_cell(descriptor),
        ]);
    }
    table.to_string()
}

pub fn format_list_json(descriptors: &[HelperDescriptor]) -> Result<String, ReadinessError> {
    serde_json::to_string_pretty(descriptors)
        .map_err(|e| ReadinessError::Unknown(format!("Failed to serialise helper list: {}", e)))
}

/// One line per outcome, e.g. `git: updated (Git repository ready.)`.
pub fn format_ensure_summary(result: &RunResult) -> String {
    if result.outcomes.is_empty() {
        return "No readiness helpers ran.".to_string();
    }
    let lines: Vec<String> = result
        .outcomes
        .iter()
        .map(|outcome| match outcome.message() {
            Some(message) => format!("{}: {} ({})", outcome.key, outcome.status, message),
            None => format!("{}: {}", outcome.key, outcome.status),
        })
        .collect();
    lines.join("\n")
}
