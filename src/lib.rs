//! dxready: readiness orchestration for developer tooling.
//!
//! Helpers detect whether a precondition holds, optionally repair it, and
//! confirm the result. A plan runs helpers in order and unwinds completed work
//! when one of them fails.

pub mod cli;
pub mod config;
pub mod context;
pub mod doctor;
pub mod error;
pub mod helpers;
pub mod logging;
pub mod readiness;
