//! Core domain model types for devflow.
//!
//! This module contains the fundamental types used throughout the engine:
//! - The fixed stage registry and per-stage configuration
//! - Stage status and report format enums

mod stage;
mod status;

pub use stage::{default_thresholds, Stage, StageConfig};
pub use status::{ReportFormat, StageStatus};
