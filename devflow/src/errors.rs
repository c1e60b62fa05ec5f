//! Error types for the devflow engine.
//!
//! Fatal conditions surface as [`FlowError`]. Soft failures (a missing
//! artifact file on read, a metric without a threshold, an exhausted review
//! budget) never reach this module: they degrade to `None` or an empty
//! result plus a `tracing` warning.

use crate::core::Stage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// The main error type for devflow operations.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The project context is missing a required field.
    #[error("Invalid project context: {reason}")]
    InvalidContext {
        /// What was missing.
        reason: String,
    },

    /// The stage name is not part of the registry.
    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    /// The requested transition violates the forward-only gap rule.
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        /// The active stage.
        from: Stage,
        /// The requested stage.
        to: Stage,
    },

    /// An artifact handoff was attempted from a stage that is not active.
    #[error("Cannot pass artifact from {stage}: not current stage")]
    NotCurrentStage {
        /// The stage the caller claimed.
        stage: Stage,
        /// The stage that is actually active, if any.
        current: Option<Stage>,
    },

    /// The flow has not been started yet.
    #[error("Flow has not been started")]
    NotStarted,

    /// An operation needed an active stage and none is in progress.
    #[error("No stage is in progress")]
    NoActiveStage,

    /// The artifact was never registered.
    #[error("Artifact not found: {stage}/{name}")]
    ArtifactNotFound {
        /// The stage the artifact belongs to.
        stage: Stage,
        /// The artifact name.
        name: String,
    },

    /// Archiving is turned off in the artifact store configuration.
    #[error("Archiving is disabled. Enable it by setting enable_archive in the artifact store config")]
    ArchivingDisabled,

    /// An artifact or file name would escape its stage directory.
    #[error("Invalid artifact name: {0:?}")]
    InvalidArtifactName(String),

    /// No feedback entry carries the given id.
    #[error("Feedback not found: {0}")]
    FeedbackNotFound(String),

    /// A critical failure terminated the flow.
    #[error("Flow aborted at {stage}: {message}")]
    FlowAborted {
        /// The stage that failed.
        stage: Stage,
        /// The critical error message.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FlowError {
    /// Creates an invalid context error.
    #[must_use]
    pub fn invalid_context(reason: impl Into<String>) -> Self {
        Self::InvalidContext {
            reason: reason.into(),
        }
    }

    /// Creates an artifact not found error.
    #[must_use]
    pub fn artifact_not_found(stage: Stage, name: impl Into<String>) -> Self {
        Self::ArtifactNotFound {
            stage,
            name: name.into(),
        }
    }

    /// Returns true if the error terminates the flow.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidContext { .. } | Self::FlowAborted { .. })
    }

    /// Returns a stable machine-readable code for the error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidContext { .. } => "INVALID_CONTEXT",
            Self::UnknownStage(_) => "UNKNOWN_STAGE",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotCurrentStage { .. } => "NOT_CURRENT_STAGE",
            Self::NotStarted => "NOT_STARTED",
            Self::NoActiveStage => "NO_ACTIVE_STAGE",
            Self::ArtifactNotFound { .. } => "ARTIFACT_NOT_FOUND",
            Self::ArchivingDisabled => "ARCHIVING_DISABLED",
            Self::InvalidArtifactName(_) => "INVALID_ARTIFACT_NAME",
            Self::FeedbackNotFound(_) => "FEEDBACK_NOT_FOUND",
            Self::FlowAborted { .. } => "FLOW_ABORTED",
            Self::Io(_) => "IO",
            Self::Serialization(_) => "SERIALIZATION",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::json!(self.code()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map.insert("fatal".to_string(), serde_json::json!(self.is_fatal()));
        map
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = FlowError> = std::result::Result<T, E>;

/// Severity of a stage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The stage can be retried or skipped.
    #[default]
    Recoverable,
    /// The flow cannot continue when `fail_on_critical` is set.
    Critical,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "recoverable"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// A failure reported by whoever drives a stage.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct StageError {
    /// Failure severity.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl StageError {
    /// Creates a recoverable stage error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Recoverable,
            message: message.into(),
        }
    }

    /// Creates a critical stage error.
    #[must_use]
    pub fn critical(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Critical,
            message: message.into(),
        }
    }

    /// Returns true if the error is critical.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.kind == ErrorKind::Critical
    }
}
