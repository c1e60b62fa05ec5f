//! Per-stage feedback collection.
//!
//! Feedback is classified by keyword, persisted one JSON file per entry and
//! summarized into `feedback-summary.{json,csv}` exports.

mod classify;
mod collector;
mod types;

pub use classify::classify;
pub use collector::{FeedbackCollector, FeedbackConfig};
pub use types::{
    ExportFormat, Feedback, FeedbackAction, FeedbackCategory, FeedbackInput, FeedbackPriority,
    FeedbackSource, FeedbackState, FeedbackSummary,
};
