//! Helper contract: the unit of work a plan runs.
//!
//! `detect` and `confirm` are required. `prepare`, `execute` and `rollback`
//! are optional; a helper declares the ones it implements through
//! [`ReadinessHelper::phases`] and the runner checks that declaration before
//! invoking them.

use crate::context::Context;
use crate::error::ReadinessError;
use crate::readiness::types::{Confirmation, Detection, HelperMetadata, StepResult};
use async_trait::async_trait;
use serde::Serialize;
use std::any::Any;

/// Optional phases a helper implements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HelperPhases {
    pub prepare: bool,
    pub execute: bool,
    pub rollback: bool,
}

impl HelperPhases {
    /// Detect and confirm only.
    pub const CHECK_ONLY: HelperPhases = HelperPhases {
        prepare: false,
        execute: false,
        rollback: false,
    };

    pub fn with_prepare(mut self) -> Self {
        self.prepare = true;
        self
    }

    pub fn with_execute(mut self) -> Self {
        self.execute = true;
        self
    }

    pub fn with_rollback(mut self) -> Self {
        self.rollback = true;
        self
    }
}

fn undeclared(key: &str, phase: &str) -> ReadinessError {
    ReadinessError::developer(format!(
        "Readiness helper {} declares a {} phase but does not implement it.",
        key, phase
    ))
}

/// A readiness check plus optional remediation.
///
/// Each phase receives the latest state by reference and returns a new one,
/// so the runner always holds the state from before a failed phase.
#[async_trait]
pub trait ReadinessHelper: Send + Sync + 'static {
    type State: Send + Sync + 'static;

    fn key(&self) -> &str;

    fn metadata(&self) -> HelperMetadata {
        HelperMetadata::new(ReadinessHelper::key(self))
    }

    fn phases(&self) -> HelperPhases {
        HelperPhases::CHECK_ONLY
    }

    async fn detect(&self, context: &Context) -> Result<Detection<Self::State>, ReadinessError>;

    async fn prepare(
        &self,
        _context: &Context,
        _state: &Self::State,
    ) -> Result<StepResult<Self::State>, ReadinessError> {
        Err(undeclared(ReadinessHelper::key(self), "prepare"))
    }

    async fn execute(
        &self,
        _context: &Context,
        _state: &Self::State,
    ) -> Result<StepResult<Self::State>, ReadinessError> {
        Err(undeclared(ReadinessHelper::key(self), "execute"))
    }

    async fn confirm(
        &self,
        context: &Context,
        state: &Self::State,
    ) -> Result<Confirmation<Self::State>, ReadinessError>;

    /// Invoked when this helper or a later one in the same plan fails.
    async fn rollback(&self, _context: &Context, _state: &Self::State) -> Result<(), ReadinessError> {
        Err(undeclared(ReadinessHelper::key(self), "rollback"))
    }
}

pub(crate) type AnyState = Box<dyn Any + Send + Sync>;

/// Object-safe view of a helper with its state type erased.
#[async_trait]
pub(crate) trait DynHelper: Send + Sync {
    fn key(&self) -> &str;
    fn metadata(&self) -> HelperMetadata;
    fn phases(&self) -> HelperPhases;
    async fn detect(&self, context: &Context) -> Result<Detection<AnyState>, ReadinessError>;
    async fn prepare(
        &self,
        context: &Context,
        state: &AnyState,
    ) -> Result<StepResult<AnyState>, ReadinessError>;
    async fn execute(
        &self,
        context: &Context,
        state: &AnyState,
    ) -> Result<StepResult<AnyState>, ReadinessError>;
    async fn confirm(
        &self,
        context: &Context,
        state: &AnyState,
    ) -> Result<Confirmation<AnyState>, ReadinessError>;
    async fn rollback(&self, context: &Context, state: &AnyState) -> Result<(), ReadinessError>;
}

fn typed_state<'a, S: 'static>(key: &str, state: &'a AnyState) -> Result<&'a S, ReadinessError> {
    (**state).downcast_ref::<S>().ok_or_else(|| {
        ReadinessError::developer(format!(
            "State payload for readiness helper {} has an unexpected type.",
            key
        ))
    })
}

fn erase_step<S: Send + Sync + 'static>(step: StepResult<S>) -> StepResult<AnyState> {
    StepResult {
        state: Box::new(step.state),
        cleanup: step.cleanup,
    }
}

#[async_trait]
impl<H> DynHelper for H
where
    H: ReadinessHelper,
{
    fn key(&self) -> &str {
        ReadinessHelper::key(self)
    }

    fn metadata(&self) -> HelperMetadata {
        ReadinessHelper::metadata(self)
    }

    fn phases(&self) -> HelperPhases {
        ReadinessHelper::phases(self)
    }

    async fn detect(&self, context: &Context) -> Result<Detection<AnyState>, ReadinessError> {
        let detection = ReadinessHelper::detect(self, context).await?;
        Ok(Detection {
            status: detection.status,
            state: Box::new(detection.state),
            message: detection.message,
        })
    }

    async fn prepare(
        &self,
        context: &Context,
        state: &AnyState,
    ) -> Result<StepResult<AnyState>, ReadinessError> {
        let state = typed_state::<H::State>(ReadinessHelper::key(self), state)?;
        let step = ReadinessHelper::prepare(self, context, state).await?;
        Ok(erase_step(step))
    }

    async fn execute(
        &self,
        context: &Context,
        state: &AnyState,
    ) -> Result<StepResult<AnyState>, ReadinessError> {
        let state = typed_state::<H::State>(ReadinessHelper::key(self), state)?;
        let step = ReadinessHelper::execute(self, context, state).await?;
        Ok(erase_step(step))
    }

    async fn confirm(
        &self,
        context: &Context,
        state: &AnyState,
    ) -> Result<Confirmation<AnyState>, ReadinessError> {
        let state = typed_state::<H::State>(ReadinessHelper::key(self), state)?;
        let confirmation = ReadinessHelper::confirm(self, context, state).await?;
        Ok(Confirmation {
            status: confirmation.status,
            state: Box::new(confirmation.state),
            message: confirmation.message,
        })
    }

    async fn rollback(&self, context: &Context, state: &AnyState) -> Result<(), ReadinessError> {
        let state = typed_state::<H::State>(ReadinessHelper::key(self), state)?;
        ReadinessHelper::rollback(self, context, state).await
    }
}
