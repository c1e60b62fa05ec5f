//! Small records exchanged through the flow context.

use crate::core::Stage;
use crate::errors::{ErrorKind, StageError};
use crate::utils::{now_utc, Timestamp};
use serde::{Deserialize, Serialize};

/// The last failure recorded for a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRecord {
    /// The error message.
    pub message: String,
    /// Failure severity.
    pub kind: ErrorKind,
    /// When the failure was handled.
    pub timestamp: Timestamp,
}

impl From<&StageError> for FailureRecord {
    fn from(error: &StageError) -> Self {
        Self {
            message: error.message.clone(),
            kind: error.kind,
            timestamp: now_utc(),
        }
    }
}

/// Advisory signal that the stage before `stage` passed its review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionTrigger {
    /// The stage whose review passed.
    pub from_stage: Stage,
    /// When the decision was recorded.
    pub timestamp: Timestamp,
}

impl TransitionTrigger {
    /// Creates a trigger stamped with the current time.
    #[must_use]
    pub fn new(from_stage: Stage) -> Self {
        Self {
            from_stage,
            timestamp: now_utc(),
        }
    }
}
