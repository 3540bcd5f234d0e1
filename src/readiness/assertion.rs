//! Assertion layer: turns a run result into a command-level success or error.

use crate::error::{ReadinessError, UnreadyEntry, UnreadyError};
use crate::readiness::types::RunResult;
use std::sync::Arc;

/// Fail when the run aborted or any helper is not ready/updated.
///
/// An aborted run surfaces its aggregate error unchanged; otherwise every
/// blocked, pending or failed helper is listed in one [`UnreadyError`].
pub fn assert_ready(result: &RunResult) -> Result<(), ReadinessError> {
    if let Some(error) = &result.error {
        return Err(ReadinessError::Aborted(Arc::clone(error)));
    }

    let entries: Vec<UnreadyEntry> = result
        .outcomes
        .iter()
        .filter(|outcome| !outcome.status.is_usable())
        .map(|outcome| UnreadyEntry {
            key: outcome.key.clone(),
            status: outcome.status,
            message: outcome.message().map(String::from),
        })
        .collect();

    if entries.is_empty() {
        Ok(())
    } else {
        Err(UnreadyError { entries }.into())
    }
}
