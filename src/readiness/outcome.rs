//! Outcome classification: maps phase results to a per-helper status.

use crate::readiness::types::{ConfirmationStatus, OutcomeStatus, ReadinessStatus};

/// Summarize a helper that completed its phase chain without error.
///
/// A missing confirmation classifies as pending, never ready.
pub fn outcome_status(
    detection: ReadinessStatus,
    confirmation: Option<ConfirmationStatus>,
    performed_work: bool,
) -> OutcomeStatus {
    if detection == ReadinessStatus::Blocked {
        return OutcomeStatus::Blocked;
    }

    match confirmation {
        Some(ConfirmationStatus::Ready) if performed_work => OutcomeStatus::Updated,
        Some(ConfirmationStatus::Ready) => OutcomeStatus::Ready,
        Some(ConfirmationStatus::Pending) | None => OutcomeStatus::Pending,
    }
}
