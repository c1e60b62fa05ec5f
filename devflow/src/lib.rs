//! # Devflow
//!
//! Coordination engine for a fixed, thirteen-stage software-delivery flow,
//! from requirements proposal to release and project sign-off.
//!
//! Devflow provides:
//!
//! - **Stage state machine**: forward-only transitions with a single active stage
//! - **Failure policy**: bounded retries, skip-after-max-retries and critical abort
//! - **Review loop**: bounded self-review attempts that can signal the next stage
//! - **Quality gating**: per-stage thresholds, scores, grades and alerts
//! - **Artifacts**: a versioned, file-backed registry of stage deliverables
//! - **Progress**: overall completion, risk level, milestones and reports
//! - **Feedback**: per-stage feedback collection and exports
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use devflow::prelude::*;
//!
//! # async fn run() -> devflow::errors::Result<()> {
//! let mut flow = FlowCoordinator::new(FlowConfig::default());
//! flow.start(devflow::testing::demo_project())?;
//!
//! flow.pass_artifact(Stage::RequirementsProposal, serde_json::json!({"scope": "MVP"}))?;
//! flow.transition_to(Stage::RequirementsAnalysis)?;
//!
//! let report = flow.complete().await?;
//! println!("{:.1}% complete", report.progress.overall_progress);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod artifacts;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod core;
pub mod errors;
pub mod events;
pub mod feedback;
pub mod observability;
pub mod progress;
pub mod quality;
pub mod review;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::artifacts::{
        ArtifactConfig, ArtifactConfigUpdate, ArtifactFormat, ArtifactMetadata,
        ArtifactStoreConfig, ArtifactType, DeliveryArtifactsManager, FileContent,
        ValidationResult,
    };
    pub use crate::config::DevflowConfig;
    pub use crate::context::{FlowContext, ProjectContext};
    pub use crate::coordinator::{
        FlowConfig, FlowCoordinator, FlowHandle, FlowReport, ProgressInfo, StageOutcome,
    };
    pub use crate::core::{ReportFormat, Stage, StageStatus};
    pub use crate::errors::{ErrorKind, FlowError, StageError};
    pub use crate::events::{EventSink, FlowEvent, LoggingEventSink, NoOpEventSink};
    pub use crate::feedback::{
        ExportFormat, FeedbackAction, FeedbackCollector, FeedbackConfig, FeedbackInput,
    };
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::progress::{Milestone, ProgressTracker, StageProgressUpdate, TrackerConfig};
    pub use crate::quality::{QualityConfig, QualityMetricsCollector};
    pub use crate::review::{Decision, ReviewConfig, ReviewOrchestrator};
}
