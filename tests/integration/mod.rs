//! Integration tests for the dxready readiness orchestrator


mod builtin_helpers;
mod failure_handling;
mod plan_runs;
mod rollback_ordering;
