//! Plan runner: drives each helper through its phases in plan order.
//!
//! Helpers run strictly one after another. `blocked` is recorded and the run
//! moves on; any phase error aborts the plan after unwinding. Unwinding runs
//! the failing helper's cleanups (LIFO) and rollback, then every previously
//! completed helper in reverse: its cleanups (LIFO), then its rollback.

use crate::context::{Context, Reporter};
use crate::error::{AggregateError, CompensationKind, ReadinessError, SecondaryFailure};
use crate::readiness::helper::{AnyState, DynHelper};
use crate::readiness::outcome::outcome_status;
use crate::readiness::phase_log::{
    log_compensation_failure, log_confirmation_result, log_detection_result, log_outcome,
    log_phase_failure, log_phase_start, log_phase_success,
};
use crate::readiness::types::{
    Cleanup, ConfirmationStatus, Outcome, OutcomeStatus, PhaseSummary, ReadinessKey,
    ReadinessPhase, ReadinessStatus, RunResult,
};
use futures::FutureExt;
use serde_json::json;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Await a phase, turning a panic into an unknown error.
async fn guarded<T, F>(future: F) -> Result<T, ReadinessError>
where
    F: Future<Output = Result<T, ReadinessError>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(ReadinessError::Unknown(panic_message(payload))),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("helper panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("helper panicked: {}", message)
    } else {
        "helper panicked".to_string()
    }
}

/// Cleanups registered by one helper; only appended to and drained in reverse.
#[derive(Debug, Default)]
pub(crate) struct CleanupStack {
    entries: Vec<Cleanup>,
}

impl CleanupStack {
    pub(crate) fn push(&mut self, cleanup: Cleanup) {
        self.entries.push(cleanup);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Run every cleanup, last registered first, collecting failures.
    pub(crate) async fn unwind(
        mut self,
        key: &ReadinessKey,
        reporter: &Reporter,
    ) -> Vec<SecondaryFailure> {
        let mut failures = Vec::new();
        while let Some(cleanup) = self.entries.pop() {
            reporter.child("cleanup").debug(
                "Running readiness cleanup.",
                cleanup.label().map(|label| json!({ "label": label })),
            );
            if let Err(error) = guarded(cleanup.run()).await {
                log_compensation_failure(reporter, CompensationKind::Cleanup, &error);
                failures.push(SecondaryFailure {
                    key: key.clone(),
                    kind: CompensationKind::Cleanup,
                    error,
                });
            }
        }
        failures
    }
}

/// A helper whose phase chain completed; kept for rollback if a later helper fails.
struct ExecutedHelper {
    key: ReadinessKey,
    helper: Arc<dyn DynHelper>,
    state: AnyState,
    cleanups: CleanupStack,
}

impl ExecutedHelper {
    async fn unwind(self, context: &Context) -> Vec<SecondaryFailure> {
        let reporter = context.reporter.child(self.key.as_str());
        reporter.info(
            "Rolling back readiness helper.",
            Some(json!({ "cleanups": self.cleanups.len() })),
        );
        let mut failures = self.cleanups.unwind(&self.key, &reporter).await;
        if let Some(failure) =
            rollback_helper(self.helper.as_ref(), &self.key, context, &reporter, &self.state).await
        {
            failures.push(failure);
        }
        failures
    }
}

async fn rollback_helper(
    helper: &dyn DynHelper,
    key: &ReadinessKey,
    context: &Context,
    reporter: &Reporter,
    state: &AnyState,
) -> Option<SecondaryFailure> {
    if !helper.phases().rollback {
        return None;
    }
    match guarded(helper.rollback(context, state)).await {
        Ok(()) => None,
        Err(error) => {
            log_compensation_failure(reporter, CompensationKind::Rollback, &error);
            Some(SecondaryFailure {
                key: key.clone(),
                kind: CompensationKind::Rollback,
                error,
            })
        }
    }
}

/// Progress of a single helper through its phases.
struct Attempt {
    phase: ReadinessPhase,
    detection: Option<PhaseSummary<ReadinessStatus>>,
    confirmation: Option<PhaseSummary<ConfirmationStatus>>,
    state: Option<AnyState>,
    cleanups: CleanupStack,
    performed_work: bool,
}

impl Attempt {
    fn new() -> Self {
        Self {
            phase: ReadinessPhase::Detect,
            detection: None,
            confirmation: None,
            state: None,
            cleanups: CleanupStack::default(),
            performed_work: false,
        }
    }

    fn current_state(&self, key: &ReadinessKey) -> Result<&AnyState, ReadinessError> {
        self.state.as_ref().ok_or_else(|| {
            ReadinessError::developer(format!(
                "Readiness helper {} has no state after detection.",
                key
            ))
        })
    }

    fn message(&self) -> Option<&str> {
        self.confirmation
            .as_ref()
            .and_then(|c| c.message.as_deref())
            .or_else(|| self.detection.as_ref().and_then(|d| d.message.as_deref()))
    }

    fn into_outcome(self, key: ReadinessKey, status: OutcomeStatus) -> Outcome {
        Outcome {
            key,
            status,
            detection: self.detection,
            confirmation: self.confirmation,
            error: None,
        }
    }
}

async fn run_step(
    helper: &dyn DynHelper,
    key: &ReadinessKey,
    context: &Context,
    reporter: &Reporter,
    attempt: &mut Attempt,
    phase: ReadinessPhase,
) -> Result<(), ReadinessError> {
    attempt.phase = phase;
    log_phase_start(reporter, phase);
    let state = attempt.current_state(key)?;
    let step = match phase {
        ReadinessPhase::Prepare => guarded(helper.prepare(context, state)).await?,
        _ => guarded(helper.execute(context, state)).await?,
    };
    attempt.state = Some(step.state);
    if let Some(cleanup) = step.cleanup {
        attempt.cleanups.push(cleanup);
    }
    attempt.performed_work = true;
    log_phase_success(reporter, phase);
    Ok(())
}

/// Detect, remediate when pending, confirm. Returns the classified status.
async fn drive_helper(
    helper: &dyn DynHelper,
    key: &ReadinessKey,
    context: &Context,
    reporter: &Reporter,
    attempt: &mut Attempt,
) -> Result<OutcomeStatus, ReadinessError> {
    attempt.phase = ReadinessPhase::Detect;
    log_phase_start(reporter, ReadinessPhase::Detect);
    let detection = guarded(helper.detect(context)).await?;
    let detection_summary = PhaseSummary::from(&detection);
    log_detection_result(reporter, &detection_summary);
    let detected = detection.status;
    attempt.detection = Some(detection_summary);
    attempt.state = Some(detection.state);

    if detected == ReadinessStatus::Blocked {
        return Ok(outcome_status(detected, None, false));
    }

    if detected == ReadinessStatus::Pending {
        let phases = helper.phases();
        if phases.prepare {
            run_step(helper, key, context, reporter, attempt, ReadinessPhase::Prepare).await?;
        }
        if phases.execute {
            run_step(helper, key, context, reporter, attempt, ReadinessPhase::Execute).await?;
        }
    }

    attempt.phase = ReadinessPhase::Confirm;
    log_phase_start(reporter, ReadinessPhase::Confirm);
    let state = attempt.current_state(key)?;
    let confirmation = guarded(helper.confirm(context, state)).await?;
    let confirmation_summary = PhaseSummary::from(&confirmation);
    log_confirmation_result(reporter, &confirmation_summary);
    let confirmed = confirmation_summary.status;
    attempt.confirmation = Some(confirmation_summary);
    attempt.state = Some(confirmation.state);

    Ok(outcome_status(
        detected,
        Some(confirmed),
        attempt.performed_work,
    ))
}

/// Run resolved helpers in order against `context`.
pub(crate) async fn run_plan(context: &Context, helpers: &[Arc<dyn DynHelper>]) -> RunResult {
    let keys: Vec<&str> = helpers.iter().map(|h| h.key()).collect();
    context
        .reporter
        .debug("Readiness plan started.", Some(json!({ "keys": keys })));

    let mut outcomes: Vec<Outcome> = Vec::with_capacity(helpers.len());
    let mut executed: Vec<ExecutedHelper> = Vec::new();

    for helper in helpers {
        let key = ReadinessKey::from(helper.key());
        let reporter = context.reporter.child(helper.key());
        let mut attempt = Attempt::new();

        match drive_helper(helper.as_ref(), &key, context, &reporter, &mut attempt).await {
            Ok(OutcomeStatus::Blocked) => {
                log_outcome(&reporter, OutcomeStatus::Blocked, attempt.message());
                outcomes.push(attempt.into_outcome(key, OutcomeStatus::Blocked));
            }
            Ok(status) => {
                log_outcome(&reporter, status, attempt.message());
                let Attempt {
                    detection,
                    confirmation,
                    state,
                    cleanups,
                    ..
                } = attempt;
                outcomes.push(Outcome {
                    key: key.clone(),
                    status,
                    detection,
                    confirmation,
                    error: None,
                });
                if let Some(state) = state {
                    executed.push(ExecutedHelper {
                        key,
                        helper: Arc::clone(helper),
                        state,
                        cleanups,
                    });
                }
            }
            Err(error) => {
                log_phase_failure(&reporter, attempt.phase, &error);
                log_outcome(&reporter, OutcomeStatus::Failed, attempt.message());

                let Attempt {
                    phase,
                    detection,
                    confirmation,
                    state,
                    cleanups,
                    ..
                } = attempt;

                let mut secondary = cleanups.unwind(&key, &reporter).await;
                // No state means `detect` failed; rollback takes a typed state, so it is skipped.
                if let Some(state) = &state {
                    if let Some(failure) =
                        rollback_helper(helper.as_ref(), &key, context, &reporter, state).await
                    {
                        secondary.push(failure);
                    }
                }
                while let Some(entry) = executed.pop() {
                    secondary.extend(entry.unwind(context).await);
                }

                let aggregate = Arc::new(AggregateError::new(key.clone(), phase, error, secondary));
                reporter.error(
                    "Readiness helper failed.",
                    Some(json!({
                        "error": aggregate.to_string(),
                        "secondary_failures": aggregate.secondary.len(),
                    })),
                );
                outcomes.push(Outcome {
                    key,
                    status: OutcomeStatus::Failed,
                    detection,
                    confirmation,
                    error: Some(Arc::clone(&aggregate)),
                });
                return RunResult {
                    outcomes,
                    error: Some(aggregate),
                };
            }
        }
    }

    context.reporter.debug(
        "Readiness plan completed.",
        Some(json!({ "outcomes": outcomes.len() })),
    );
    RunResult {
        outcomes,
        error: None,
    }
}
