//! Typed flow lifecycle events.

use crate::core::Stage;
use crate::errors::ErrorKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Something observable that happened to a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FlowEvent {
    /// The flow was started for a project.
    #[serde(rename = "flow.started")]
    FlowStarted {
        /// Project name.
        project: String,
    },
    /// A stage became active.
    #[serde(rename = "stage.activated")]
    StageActivated {
        /// The activated stage.
        stage: Stage,
        /// The stage completed to make room for it.
        from: Option<Stage>,
    },
    /// A stage was completed.
    #[serde(rename = "stage.completed")]
    StageCompleted {
        /// The completed stage.
        stage: Stage,
    },
    /// The active stage handed off an artifact.
    #[serde(rename = "stage.artifact_passed")]
    ArtifactPassed {
        /// The handing-off stage.
        stage: Stage,
    },
    /// A stage failure was reported.
    #[serde(rename = "stage.failed")]
    StageFailed {
        /// The failed stage.
        stage: Stage,
        /// Failure severity.
        kind: ErrorKind,
        /// Failure message.
        message: String,
    },
    /// A failed stage was reset for another attempt.
    #[serde(rename = "stage.retrying")]
    StageRetrying {
        /// The stage.
        stage: Stage,
        /// Retry number, starting at 1.
        attempt: u32,
    },
    /// A stage exhausted its retries and was completed without an artifact.
    #[serde(rename = "stage.skipped")]
    StageSkipped {
        /// The skipped stage.
        stage: Stage,
        /// The stage after it, if any.
        next: Option<Stage>,
    },
    /// A critical failure terminated the flow.
    #[serde(rename = "flow.aborted")]
    FlowAborted {
        /// The failing stage.
        stage: Stage,
        /// Failure message.
        message: String,
    },
    /// The flow report was written.
    #[serde(rename = "flow.completed")]
    FlowCompleted {
        /// Where the report was written.
        path: PathBuf,
    },
}

impl FlowEvent {
    /// Returns the dotted event type, e.g. `stage.completed`.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::FlowStarted { .. } => "flow.started",
            Self::StageActivated { .. } => "stage.activated",
            Self::StageCompleted { .. } => "stage.completed",
            Self::ArtifactPassed { .. } => "stage.artifact_passed",
            Self::StageFailed { .. } => "stage.failed",
            Self::StageRetrying { .. } => "stage.retrying",
            Self::StageSkipped { .. } => "stage.skipped",
            Self::FlowAborted { .. } => "flow.aborted",
            Self::FlowCompleted { .. } => "flow.completed",
        }
    }

    /// Returns the stage the event concerns, if any.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::StageActivated { stage, .. }
            | Self::StageCompleted { stage }
            | Self::ArtifactPassed { stage }
            | Self::StageFailed { stage, .. }
            | Self::StageRetrying { stage, .. }
            | Self::StageSkipped { stage, .. }
            | Self::FlowAborted { stage, .. } => Some(*stage),
            Self::FlowStarted { .. } | Self::FlowCompleted { .. } => None,
        }
    }

    /// Converts the event to a JSON value.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
