//! Phase logging: structured start/success/failure records per helper phase.
//!
//! Every function takes the helper-scoped reporter and derives a per-phase
//! child, so lines land under `<namespace>.<helper>.<phase>`.

use crate::context::Reporter;
use crate::error::{CompensationKind, ReadinessError};
use crate::readiness::types::{
    ConfirmationStatus, OutcomeStatus, PhaseSummary, ReadinessPhase, ReadinessStatus,
};
use serde_json::{json, Map, Value};

pub fn format_phase_message(phase: ReadinessPhase, suffix: &str) -> String {
    format!("{} phase {}.", phase.label(), suffix)
}

fn phase_fields(status: Option<String>, message: Option<&str>) -> Option<Value> {
    let mut fields = Map::new();
    if let Some(status) = status {
        fields.insert("status".to_string(), Value::String(status));
    }
    if let Some(message) = message {
        fields.insert("message".to_string(), Value::String(message.to_string()));
    }
    if fields.is_empty() {
        None
    } else {
        Some(Value::Object(fields))
    }
}

pub fn phase_reporter(reporter: &Reporter, phase: ReadinessPhase) -> Reporter {
    reporter.child(phase.name())
}

pub fn log_phase_start(reporter: &Reporter, phase: ReadinessPhase) {
    phase_reporter(reporter, phase).info(format_phase_message(phase, "started"), None);
}

pub fn log_phase_success(reporter: &Reporter, phase: ReadinessPhase) {
    phase_reporter(reporter, phase).info(format_phase_message(phase, "completed"), None);
}

pub fn log_phase_failure(reporter: &Reporter, phase: ReadinessPhase, error: &ReadinessError) {
    let target = phase_reporter(reporter, phase);
    let base = format_phase_message(phase, "failed");
    let headline = format!("{}: {}", base.trim_end_matches('.'), error_summary(error));
    target.error(headline, None);
    for line in error.detail_lines() {
        target.error(format!("  • {}", line), None);
    }
    target.debug("Failure details.", Some(json!({ "error": serialise_error(error) })));
}

pub fn log_detection_result(reporter: &Reporter, detection: &PhaseSummary<ReadinessStatus>) {
    let fields = phase_fields(
        Some(detection.status.to_string()),
        detection.message.as_deref(),
    );
    let target = phase_reporter(reporter, ReadinessPhase::Detect);
    match detection.status {
        ReadinessStatus::Ready => target.info("Detect phase reported ready.", fields),
        ReadinessStatus::Pending => target.warn("Detect phase reported pending readiness.", fields),
        ReadinessStatus::Blocked => target.error("Detect phase blocked readiness.", fields),
    }
}

pub fn log_confirmation_result(
    reporter: &Reporter,
    confirmation: &PhaseSummary<ConfirmationStatus>,
) {
    let fields = phase_fields(
        Some(confirmation.status.to_string()),
        confirmation.message.as_deref(),
    );
    let target = phase_reporter(reporter, ReadinessPhase::Confirm);
    match confirmation.status {
        ConfirmationStatus::Ready => target.info("Confirm phase reported ready.", fields),
        ConfirmationStatus::Pending => {
            target.warn("Confirm phase reported pending readiness.", fields)
        }
    }
}

pub fn log_outcome(reporter: &Reporter, status: OutcomeStatus, message: Option<&str>) {
    let fields = phase_fields(Some(status.to_string()), message);
    match status {
        OutcomeStatus::Ready | OutcomeStatus::Updated => {
            reporter.info("Readiness helper completed.", fields)
        }
        OutcomeStatus::Pending => reporter.warn("Readiness helper pending follow-up.", fields),
        OutcomeStatus::Blocked => reporter.error("Readiness helper blocked.", fields),
        OutcomeStatus::Failed => reporter.error("Readiness helper failed.", fields),
    }
}

/// Cleanup or rollback failure observed while unwinding.
pub fn log_compensation_failure(reporter: &Reporter, kind: CompensationKind, error: &ReadinessError) {
    reporter.child(&kind.to_string()).warn(
        format!("Readiness {} failed: {}", kind, error_summary(error)),
        Some(json!({ "error": serialise_error(error) })),
    );
}

/// `<code>: <message>` headline for an error.
pub fn error_summary(error: &ReadinessError) -> String {
    format!("{}: {}", error.code(), error)
}

pub fn serialise_error(error: &ReadinessError) -> Value {
    let mut value = json!({
        "code": error.code(),
        "message": error.to_string(),
    });
    let details = error.detail_lines();
    if !details.is_empty() {
        value["details"] = json!(details);
    }
    value
}
