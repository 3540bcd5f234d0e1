//! Readiness orchestration: helper contract, registry, plan runner.
//!
//! Callers register helpers, resolve an ordered plan from keys, and run it
//! against a [`Context`](crate::context::Context). The runner records one
//! [`Outcome`] per attempted helper and unwinds completed work when a phase
//! fails.

pub mod assertion;
pub mod helper;
pub mod outcome;
pub mod phase_log;
pub mod registry;
mod runner;
pub mod types;

pub use assertion::assert_ready;
pub use helper::{HelperPhases, ReadinessHelper};
pub use outcome::outcome_status;
pub use registry::{HelperDescriptor, ReadinessPlan, ReadinessRegistry};
pub use types::{
    Cleanup, Confirmation, ConfirmationStatus, Detection, HelperMetadata, Outcome, OutcomeStatus,
    PhaseSummary, ReadinessKey, ReadinessPhase, ReadinessStatus, RunResult, StepResult,
};
