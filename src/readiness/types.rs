//! Data contract shared by helpers, the registry, and the plan runner.

use crate::error::{AggregateError, ReadinessError};
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Name of a helper; unique within a registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadinessKey(String);

impl ReadinessKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReadinessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ReadinessKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ReadinessKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ReadinessKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&ReadinessKey> for ReadinessKey {
    fn from(value: &ReadinessKey) -> Self {
        value.clone()
    }
}

/// Result of `detect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessStatus {
    Ready,
    Pending,
    Blocked,
}

impl fmt::Display for ReadinessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessStatus::Ready => write!(f, "ready"),
            ReadinessStatus::Pending => write!(f, "pending"),
            ReadinessStatus::Blocked => write!(f, "blocked"),
        }
    }
}

/// Result of `confirm`; a confirmation can never be blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationStatus {
    Ready,
    Pending,
}

impl fmt::Display for ConfirmationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmationStatus::Ready => write!(f, "ready"),
            ConfirmationStatus::Pending => write!(f, "pending"),
        }
    }
}

/// Summarized per-helper status produced by the plan runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Ready,
    Updated,
    Pending,
    Blocked,
    Failed,
}

impl OutcomeStatus {
    /// Ready or updated: the helper's preconditions hold.
    pub fn is_usable(&self) -> bool {
        matches!(self, OutcomeStatus::Ready | OutcomeStatus::Updated)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ready" => Some(OutcomeStatus::Ready),
            "updated" => Some(OutcomeStatus::Updated),
            "pending" => Some(OutcomeStatus::Pending),
            "blocked" => Some(OutcomeStatus::Blocked),
            "failed" => Some(OutcomeStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Ready => write!(f, "ready"),
            OutcomeStatus::Updated => write!(f, "updated"),
            OutcomeStatus::Pending => write!(f, "pending"),
            OutcomeStatus::Blocked => write!(f, "blocked"),
            OutcomeStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Phases a helper moves through during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessPhase {
    Detect,
    Prepare,
    Execute,
    Confirm,
}

impl ReadinessPhase {
    pub fn label(&self) -> &'static str {
        match self {
            ReadinessPhase::Detect => "Detect",
            ReadinessPhase::Prepare => "Prepare",
            ReadinessPhase::Execute => "Execute",
            ReadinessPhase::Confirm => "Confirm",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReadinessPhase::Detect => "detect",
            ReadinessPhase::Prepare => "prepare",
            ReadinessPhase::Execute => "execute",
            ReadinessPhase::Confirm => "confirm",
        }
    }
}

impl fmt::Display for ReadinessPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A helper's assessment of current readiness plus its state payload.
#[derive(Debug, Clone)]
pub struct Detection<S> {
    pub status: ReadinessStatus,
    pub state: S,
    pub message: Option<String>,
}

impl<S> Detection<S> {
    pub fn ready(state: S) -> Self {
        Self {
            status: ReadinessStatus::Ready,
            state,
            message: None,
        }
    }

    pub fn pending(state: S) -> Self {
        Self {
            status: ReadinessStatus::Pending,
            state,
            message: None,
        }
    }

    pub fn blocked(state: S) -> Self {
        Self {
            status: ReadinessStatus::Blocked,
            state,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Final verification after remediation.
#[derive(Debug, Clone)]
pub struct Confirmation<S> {
    pub status: ConfirmationStatus,
    pub state: S,
    pub message: Option<String>,
}

impl<S> Confirmation<S> {
    pub fn ready(state: S) -> Self {
        Self {
            status: ConfirmationStatus::Ready,
            state,
            message: None,
        }
    }

    pub fn pending(state: S) -> Self {
        Self {
            status: ConfirmationStatus::Pending,
            state,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

type CleanupAction = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), ReadinessError>> + Send>;

/// Compensating action registered by `prepare` or `execute`.
///
/// Cleanups are pushed onto the run-scoped stack and run at most once, in
/// reverse registration order, only when a run aborts.
pub struct Cleanup {
    label: Option<String>,
    action: CleanupAction,
}

impl Cleanup {
    pub fn new<F, Fut>(action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), ReadinessError>> + Send + 'static,
    {
        Self {
            label: None,
            action: Box::new(move || action().boxed()),
        }
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub async fn run(self) -> Result<(), ReadinessError> {
        (self.action)().await
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cleanup")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Result of `prepare` or `execute`: the next state and an optional cleanup.
#[derive(Debug)]
pub struct StepResult<S> {
    pub state: S,
    pub cleanup: Option<Cleanup>,
}

impl<S> StepResult<S> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            cleanup: None,
        }
    }

    pub fn with_cleanup(mut self, cleanup: Cleanup) -> Self {
        self.cleanup = Some(cleanup);
        self
    }
}

/// Descriptive data attached to a helper; never consulted by `plan()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HelperMetadata {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl HelperMetadata {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_scopes<I, T>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn in_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

/// Status and message of a phase, without the helper's state payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseSummary<T> {
    pub status: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<S> From<&Detection<S>> for PhaseSummary<ReadinessStatus> {
    fn from(detection: &Detection<S>) -> Self {
        Self {
            status: detection.status,
            message: detection.message.clone(),
        }
    }
}

impl<S> From<&Confirmation<S>> for PhaseSummary<ConfirmationStatus> {
    fn from(confirmation: &Confirmation<S>) -> Self {
        Self {
            status: confirmation.status,
            message: confirmation.message.clone(),
        }
    }
}

/// One row per helper attempted in a run.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub key: ReadinessKey,
    pub status: OutcomeStatus,
    pub detection: Option<PhaseSummary<ReadinessStatus>>,
    pub confirmation: Option<PhaseSummary<ConfirmationStatus>>,
    pub error: Option<Arc<AggregateError>>,
}

impl Outcome {
    /// Confirmation message, falling back to the detection message.
    pub fn message(&self) -> Option<&str> {
        self.confirmation
            .as_ref()
            .and_then(|c| c.message.as_deref())
            .or_else(|| self.detection.as_ref().and_then(|d| d.message.as_deref()))
    }
}

/// Full result of running a plan.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub outcomes: Vec<Outcome>,
    /// Set only when the run aborted.
    pub error: Option<Arc<AggregateError>>,
}

impl RunResult {
    pub fn is_aborted(&self) -> bool {
        self.error.is_some()
    }

    pub fn outcome(&self, key: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.key.as_str() == key)
    }

    pub fn statuses(&self) -> Vec<(ReadinessKey, OutcomeStatus)> {
        self.outcomes
            .iter()
            .map(|o| (o.key.clone(), o.status))
            .collect()
    }
}
