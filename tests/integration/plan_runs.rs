//! Registry planning and non-failing runs: blocked, pending, idempotent reruns.

use crate::integration::test_utils::{memory_context, Journal, ScriptedHelper};
use dxready::readiness::{
    ConfirmationStatus, OutcomeStatus, ReadinessRegistry, ReadinessStatus,
};

#[tokio::test]
async fn empty_plan_returns_no_outcomes() {
    let registry = ReadinessRegistry::new();
    let plan = registry.plan::<&str>(&[]).unwrap();
    let (_sink, context) = memory_context();

    let result = plan.run(&context).await;

    assert!(plan.is_empty());
    assert!(result.outcomes.is_empty());
    assert!(result.error.is_none());
}

#[tokio::test]
async fn single_blocked_helper_is_recorded_without_error() {
    let journal = Journal::default();
    let mut registry = ReadinessRegistry::new();
    registry.register(ScriptedHelper::blocked("x", &journal)).unwrap();
    let (_sink, context) = memory_context();

    let result = registry.plan(&["x"]).unwrap().run(&context).await;

    assert_eq!(result.outcomes.len(), 1);
    let outcome = &result.outcomes[0];
    assert_eq!(outcome.key.as_str(), "x");
    assert_eq!(outcome.status, OutcomeStatus::Blocked);
    assert!(outcome.confirmation.is_none());
    assert!(result.error.is_none());
    assert_eq!(journal.entries(), vec!["detect:x"]);
}

#[tokio::test]
async fn blocked_helper_does_not_stop_the_plan() {
    let journal = Journal::default();
    let mut registry = ReadinessRegistry::new();
    registry.register(ScriptedHelper::ready("first", &journal)).unwrap();
    registry.register(ScriptedHelper::blocked("stuck", &journal)).unwrap();
    registry.register(ScriptedHelper::remediating("last", &journal)).unwrap();
    let (_sink, context) = memory_context();

    let result = registry
        .plan(&["first", "stuck", "last"])
        .unwrap()
        .run(&context)
        .await;

    assert_eq!(
        result.statuses().into_iter().map(|(_, s)| s).collect::<Vec<_>>(),
        vec![
            OutcomeStatus::Ready,
            OutcomeStatus::Blocked,
            OutcomeStatus::Updated
        ]
    );
    assert!(result.error.is_none());
    assert!(journal.with_prefix("rollback:").is_empty());
    assert!(journal.with_prefix("cleanup:").is_empty());
}

#[tokio::test]
async fn unconfirmed_remediation_stays_pending() {
    let journal = Journal::default();
    let mut helper = ScriptedHelper::remediating("slow", &journal);
    helper.confirm = ConfirmationStatus::Pending;
    let mut registry = ReadinessRegistry::new();
    registry.register(helper).unwrap();
    let (_sink, context) = memory_context();

    let result = registry.plan(&["slow"]).unwrap().run(&context).await;

    let outcome = result.outcome("slow").unwrap();
    assert_eq!(outcome.status, OutcomeStatus::Pending);
    assert_eq!(
        outcome.detection.as_ref().unwrap().status,
        ReadinessStatus::Pending
    );
    assert_eq!(outcome.message(), Some("slow detected pending"));
}

#[tokio::test]
async fn pending_without_optional_phases_goes_straight_to_confirm() {
    let journal = Journal::default();
    let mut helper = ScriptedHelper::ready("check", &journal);
    helper.detect = ReadinessStatus::Pending;
    let mut registry = ReadinessRegistry::new();
    registry.register(helper).unwrap();
    let (_sink, context) = memory_context();

    let result = registry.plan(&["check"]).unwrap().run(&context).await;

    assert_eq!(journal.entries(), vec!["detect:check", "confirm:check"]);
    // Confirmed ready but nothing ran, so this is not an update.
    assert_eq!(result.outcome("check").unwrap().status, OutcomeStatus::Ready);
}

#[tokio::test]
async fn reruns_of_ready_plans_are_side_effect_free() {
    let journal = Journal::default();
    let mut registry = ReadinessRegistry::new();
    registry.register(ScriptedHelper::ready("a", &journal)).unwrap();
    registry.register(ScriptedHelper::ready("b", &journal)).unwrap();
    let plan = registry.plan(&["a", "b"]).unwrap();

    let (_first_sink, first_context) = memory_context();
    let (_second_sink, second_context) = memory_context();
    let first = plan.run(&first_context).await;
    let second = plan.run(&second_context).await;

    assert_eq!(first.statuses(), second.statuses());
    assert!(first.error.is_none() && second.error.is_none());
    assert!(journal.with_prefix("execute:").is_empty());
    assert!(journal.with_prefix("cleanup:").is_empty());
    assert!(journal.with_prefix("rollback:").is_empty());
}

#[test]
fn duplicate_and_unknown_keys_are_developer_errors() {
    let journal = Journal::default();
    let mut registry = ReadinessRegistry::new();
    registry.register(ScriptedHelper::ready("git", &journal)).unwrap();

    let duplicate = registry
        .register(ScriptedHelper::ready("git", &journal))
        .unwrap_err();
    assert_eq!(duplicate.code(), "DeveloperError");
    assert!(duplicate
        .to_string()
        .contains("Readiness helper already registered for git."));
    assert_eq!(registry.len(), 1);

    let unknown = registry.plan(&["git", "missing"]).unwrap_err();
    assert_eq!(unknown.code(), "DeveloperError");
    assert!(unknown.to_string().contains("Unknown readiness helper: missing."));
}

#[test]
fn repeated_plan_keys_are_developer_errors() {
    let journal = Journal::default();
    let mut registry = ReadinessRegistry::new();
    registry
        .register(ScriptedHelper::remediating("git", &journal))
        .unwrap();

    let err = registry.plan(&["git", "git"]).unwrap_err();

    assert_eq!(err.code(), "DeveloperError");
    assert!(err
        .to_string()
        .contains("Readiness helper listed more than once in plan: git."));
    assert!(journal.entries().is_empty());
}

#[tokio::test]
async fn plan_order_is_the_callers_order() {
    let journal = Journal::default();
    let mut registry = ReadinessRegistry::new();
    for key in ["a", "b", "c"] {
        registry.register(ScriptedHelper::ready(key, &journal)).unwrap();
    }
    let (_sink, context) = memory_context();

    let result = registry.plan(&["c", "a"]).unwrap().run(&context).await;

    let keys: Vec<&str> = result.outcomes.iter().map(|o| o.key.as_str()).collect();
    assert_eq!(keys, vec!["c", "a"]);
    assert_eq!(journal.with_prefix("detect:"), vec!["detect:c", "detect:a"]);
}
