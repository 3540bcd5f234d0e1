//! Panics, assertion layer and phase logging around failed runs.

use crate::integration::test_utils::{memory_context, Journal, ScriptedHelper};
use dxready::context::ReportLevel;
use dxready::error::ReadinessError;
use dxready::readiness::{assert_ready, OutcomeStatus, ReadinessPhase, ReadinessRegistry};
use std::sync::Arc;

#[tokio::test]
async fn panicking_phase_is_handled_like_an_error() {
    let journal = Journal::default();
    let mut registry = ReadinessRegistry::new();
    registry
        .register(ScriptedHelper::remediating("a", &journal))
        .unwrap();
    registry
        .register(ScriptedHelper::ready("b", &journal).panicking_in(ReadinessPhase::Confirm))
        .unwrap();
    let (_sink, context) = memory_context();

    let result = registry.plan(&["a", "b"]).unwrap().run(&context).await;

    assert_eq!(result.outcome("b").unwrap().status, OutcomeStatus::Failed);
    let aggregate = result.error.as_ref().unwrap();
    assert_eq!(aggregate.primary.code(), "UnknownError");
    assert!(aggregate.primary.to_string().contains("b exploded during confirm"));
    assert_eq!(journal.with_prefix("cleanup:"), vec!["cleanup:a"]);
    assert_eq!(journal.with_prefix("rollback:"), vec!["rollback:b@0", "rollback:a@1"]);
}

#[tokio::test]
async fn assertion_reports_every_unusable_helper() {
    let journal = Journal::default();
    let mut registry = ReadinessRegistry::new();
    registry.register(ScriptedHelper::ready("ok", &journal)).unwrap();
    registry.register(ScriptedHelper::blocked("x", &journal)).unwrap();
    registry.register(ScriptedHelper::blocked("y", &journal)).unwrap();
    let (_sink, context) = memory_context();

    let result = registry.plan(&["ok", "x", "y"]).unwrap().run(&context).await;

    match assert_ready(&result) {
        Err(ReadinessError::Unready(unready)) => {
            let keys: Vec<&str> = unready.entries.iter().map(|e| e.key.as_str()).collect();
            assert_eq!(keys, vec!["x", "y"]);
            assert!(unready.entries.iter().all(|e| e.status == OutcomeStatus::Blocked));
        }
        other => panic!("expected unready error, got {:?}", other),
    }
}

#[tokio::test]
async fn assertion_surfaces_the_aggregate_of_an_aborted_run() {
    let journal = Journal::default();
    let mut registry = ReadinessRegistry::new();
    registry
        .register(ScriptedHelper::ready("a", &journal).failing_in(ReadinessPhase::Detect))
        .unwrap();
    let (_sink, context) = memory_context();

    let result = registry.plan(&["a"]).unwrap().run(&context).await;

    match assert_ready(&result) {
        Err(ReadinessError::Aborted(aggregate)) => {
            assert!(Arc::ptr_eq(&aggregate, result.error.as_ref().unwrap()));
        }
        other => panic!("expected aborted error, got {:?}", other),
    }
}

#[tokio::test]
async fn ready_runs_pass_the_assertion() {
    let journal = Journal::default();
    let mut registry = ReadinessRegistry::new();
    registry
        .register(ScriptedHelper::remediating("fix", &journal))
        .unwrap();
    let (_sink, context) = memory_context();

    let result = registry.plan(&["fix"]).unwrap().run(&context).await;

    assert!(assert_ready(&result).is_ok());
}

#[tokio::test]
async fn phase_records_land_under_helper_namespaces() {
    let journal = Journal::default();
    let mut registry = ReadinessRegistry::new();
    registry
        .register(ScriptedHelper::remediating("fix", &journal))
        .unwrap();
    registry
        .register(ScriptedHelper::remediating("broken", &journal).failing_in(ReadinessPhase::Execute))
        .unwrap();
    let (sink, context) = memory_context();

    registry
        .plan(&["fix", "broken"])
        .unwrap()
        .run(&context)
        .await;

    let execute: Vec<String> = sink
        .records_for("test.fix.execute")
        .into_iter()
        .map(|r| r.message)
        .collect();
    assert_eq!(
        execute,
        vec!["Execute phase started.", "Execute phase completed."]
    );

    let failure = sink.records_for("test.broken.execute");
    let headline = failure
        .iter()
        .find(|r| r.level == ReportLevel::Error)
        .expect("failure headline");
    assert!(headline
        .message
        .starts_with("Execute phase failed: RemediationError: "));

    let detect = sink.records_for("test.fix.detect");
    let pending = detect
        .iter()
        .find(|r| r.level == ReportLevel::Warn)
        .expect("pending detection record");
    assert_eq!(pending.message, "Detect phase reported pending readiness.");
    assert_eq!(pending.fields.as_ref().unwrap()["status"], "pending");
}
