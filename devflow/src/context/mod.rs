//! Shared flow state.
//!
//! This module provides:
//! - The project description a flow starts with
//! - The stage ledger that keeps at most one stage in progress
//! - The typed, shared context all components read and write

mod ledger;
mod project;
mod records;
mod store;

pub use ledger::{SettledStatus, StageLedger};
pub use project::ProjectContext;
pub use records::{FailureRecord, TransitionTrigger};
pub use store::{ContextSnapshot, FlowContext};
