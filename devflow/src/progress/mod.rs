//! Progress tracking.
//!
//! Aggregates stage progress into overall completion, risk level and
//! milestone status, and renders progress reports.

mod tracker;
mod types;

pub use tracker::{milestones_by_state, ProgressTracker, TrackerConfig};
pub use types::{
    Milestone, MilestoneState, RiskLevel, StageProgress, StageProgressUpdate, TrackerProgress,
};
