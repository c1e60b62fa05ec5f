//! Review orchestration.
//!
//! Bounds the rework loop per stage and signals the next stage when a
//! review passes.

mod orchestrator;
mod types;

pub use orchestrator::{ReviewConfig, ReviewOrchestrator};
pub use types::{Decision, ReviewComment, ReviewDecision, ReviewState, ReviewStatus};
