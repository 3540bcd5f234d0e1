//! Unwinding order and aggregate errors when a helper fails mid-plan.

use crate::integration::test_utils::{memory_context, Journal, ScriptedHelper};
use dxready::error::{CompensationKind, ReadinessError};
use dxready::readiness::{OutcomeStatus, ReadinessPhase, ReadinessRegistry};
use std::sync::Arc;

fn registry_with(helpers: Vec<ScriptedHelper>) -> ReadinessRegistry {
    let mut registry = ReadinessRegistry::new();
    for helper in helpers {
        registry.register(helper).unwrap();
    }
    registry
}

#[tokio::test]
async fn failure_unwinds_executed_helpers_in_reverse() {
    let journal = Journal::default();
    let registry = registry_with(vec![
        ScriptedHelper::remediating("a", &journal),
        ScriptedHelper::remediating("b", &journal),
        ScriptedHelper::remediating("c", &journal).failing_in(ReadinessPhase::Execute),
    ]);
    let (_sink, context) = memory_context();

    let result = registry.plan(&["a", "b", "c"]).unwrap().run(&context).await;

    assert_eq!(
        result.statuses().into_iter().map(|(_, s)| s).collect::<Vec<_>>(),
        vec![
            OutcomeStatus::Updated,
            OutcomeStatus::Updated,
            OutcomeStatus::Failed
        ]
    );
    assert_eq!(journal.with_prefix("cleanup:"), vec!["cleanup:b", "cleanup:a"]);
    assert_eq!(
        journal.with_prefix("rollback:"),
        vec!["rollback:c@0", "rollback:b@1", "rollback:a@1"]
    );

    // Each executed helper unwinds fully (cleanups, then rollback) before the previous one.
    let entries = journal.entries();
    let tail: Vec<&str> = entries[entries.len() - 5..]
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(
        tail,
        vec![
            "rollback:c@0",
            "cleanup:b",
            "rollback:b@1",
            "cleanup:a",
            "rollback:a@1"
        ]
    );

    let aggregate = result.error.as_ref().expect("run should abort");
    assert_eq!(aggregate.key.as_str(), "c");
    assert_eq!(aggregate.phase, ReadinessPhase::Execute);
    assert!(matches!(aggregate.primary, ReadinessError::Remediation(_)));
    assert!(aggregate.primary.to_string().contains("c failed during execute"));
    assert!(!aggregate.has_secondary());

    let failed = result.outcome("c").unwrap();
    assert!(Arc::ptr_eq(failed.error.as_ref().unwrap(), aggregate));
}

#[tokio::test]
async fn failing_helper_unwinds_its_own_cleanups_first() {
    let journal = Journal::default();
    let registry = registry_with(vec![
        ScriptedHelper::remediating("a", &journal),
        ScriptedHelper::remediating("b", &journal)
            .with_prepare()
            .failing_in(ReadinessPhase::Execute),
    ]);
    let (_sink, context) = memory_context();

    let result = registry.plan(&["a", "b"]).unwrap().run(&context).await;

    assert!(result.is_aborted());
    assert_eq!(
        journal.entries(),
        vec![
            "detect:a",
            "execute:a",
            "confirm:a",
            "detect:b",
            "prepare:b",
            "execute:b",
            "cleanup:b-prepare",
            "rollback:b@1",
            "cleanup:a",
            "rollback:a@1",
        ]
    );
}

#[tokio::test]
async fn later_helpers_are_not_attempted_after_abort() {
    let journal = Journal::default();
    let registry = registry_with(vec![
        ScriptedHelper::ready("a", &journal).failing_in(ReadinessPhase::Confirm),
        ScriptedHelper::ready("b", &journal),
    ]);
    let (_sink, context) = memory_context();

    let result = registry.plan(&["a", "b"]).unwrap().run(&context).await;

    assert_eq!(result.outcomes.len(), 1);
    assert!(result.outcome("b").is_none());
    assert!(journal.with_prefix("detect:b").is_empty());
    assert_eq!(result.error.as_ref().unwrap().phase, ReadinessPhase::Confirm);
}

#[tokio::test]
async fn compensation_failures_become_secondary_errors() {
    let journal = Journal::default();
    let mut a = ScriptedHelper::remediating("a", &journal);
    a.cleanup_fails = true;
    let mut b = ScriptedHelper::remediating("b", &journal);
    b.rollback_fails = true;
    let registry = registry_with(vec![
        a,
        b,
        ScriptedHelper::ready("c", &journal).failing_in(ReadinessPhase::Detect),
    ]);
    let (_sink, context) = memory_context();

    let result = registry.plan(&["a", "b", "c"]).unwrap().run(&context).await;
    let aggregate = result.error.expect("run should abort");

    // Detect failed, so there is no state to roll `c` back with.
    assert!(journal.with_prefix("rollback:c").is_empty());
    // Every compensation still ran despite the failures.
    assert_eq!(journal.with_prefix("cleanup:"), vec!["cleanup:b", "cleanup:a"]);
    assert_eq!(journal.with_prefix("rollback:").len(), 2);

    let sources: Vec<(&str, CompensationKind)> = aggregate
        .secondary
        .iter()
        .map(|s| (s.key.as_str(), s.kind))
        .collect();
    assert_eq!(
        sources,
        vec![
            ("b", CompensationKind::Rollback),
            ("a", CompensationKind::Cleanup)
        ]
    );
    assert!(aggregate.primary.to_string().contains("c failed during detect"));
    let text = aggregate.to_string();
    assert!(text.starts_with("Readiness helper 'c' failed during detect"));
    assert!(text.contains("rollback reported 2 additional failure(s)"));
}

#[tokio::test]
async fn blocked_helpers_are_never_rolled_back() {
    let journal = Journal::default();
    let registry = registry_with(vec![
        ScriptedHelper::blocked("x", &journal),
        ScriptedHelper::remediating("y", &journal).failing_in(ReadinessPhase::Execute),
    ]);
    let (_sink, context) = memory_context();

    let result = registry.plan(&["x", "y"]).unwrap().run(&context).await;

    assert_eq!(result.outcome("x").unwrap().status, OutcomeStatus::Blocked);
    assert!(result.is_aborted());
    assert_eq!(journal.with_prefix("rollback:"), vec!["rollback:y@0"]);
}
