//! Review records.

use crate::core::Stage;
use crate::utils::{now_utc, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a stage's current review attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewState {
    /// Waiting for a reviewer.
    #[default]
    Pending,
    /// Being reviewed.
    InProgress,
    /// Passed.
    Completed,
    /// Failed or sent back for revision.
    Failed,
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A reviewer's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decision {
    /// The stage output is accepted.
    Pass,
    /// The stage output is rejected.
    Fail,
    /// The stage output needs another iteration.
    NeedsRevision,
}

impl Decision {
    /// Returns true for [`Decision::Pass`].
    #[must_use]
    pub fn is_pass(self) -> bool {
        self == Self::Pass
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Fail => write!(f, "fail"),
            Self::NeedsRevision => write!(f, "needs-revision"),
        }
    }
}

/// A timestamped review comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewComment {
    /// Who wrote the comment.
    pub author: String,
    /// Comment text.
    pub content: String,
    /// When the comment was added.
    pub timestamp: Timestamp,
}

impl ReviewComment {
    /// Creates a comment stamped with the current time.
    #[must_use]
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            content: content.into(),
            timestamp: now_utc(),
        }
    }
}

/// The recorded outcome of a review attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDecision {
    /// Who decided.
    pub reviewer: String,
    /// The verdict.
    pub decision: Decision,
    /// Optional closing remarks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
    /// When the decision was recorded.
    pub timestamp: Timestamp,
}

/// Review state of one stage.
///
/// One record per stage; a new attempt overwrites the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStatus {
    /// The reviewed stage.
    pub stage: Stage,
    /// Attempt number, starting at 1.
    pub attempt: u32,
    /// Attempt budget for the stage.
    pub max_attempts: u32,
    /// Status of the current attempt.
    pub status: ReviewState,
    /// Comments collected during the attempt.
    #[serde(default)]
    pub comments: Vec<ReviewComment>,
    /// The decision, once recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<ReviewDecision>,
    /// When the attempt was opened.
    pub started_at: Timestamp,
}

impl ReviewStatus {
    /// Opens a new pending attempt.
    #[must_use]
    pub fn new(stage: Stage, attempt: u32, max_attempts: u32) -> Self {
        Self {
            stage,
            attempt,
            max_attempts,
            status: ReviewState::Pending,
            comments: Vec::new(),
            decision: None,
            started_at: now_utc(),
        }
    }

    /// Returns true once the attempt budget is used up.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}
