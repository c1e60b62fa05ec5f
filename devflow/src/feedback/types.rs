//! Feedback records and summaries.

use crate::core::Stage;
use crate::utils::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Who gave the feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackSource {
    /// The customer.
    #[default]
    Customer,
    /// The delivery team.
    Internal,
    /// An end user.
    User,
}

/// What the feedback is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackCategory {
    /// Feature request.
    Feature,
    /// Defect report.
    Bug,
    /// Speed or responsiveness.
    Performance,
    /// Usability.
    Ux,
    /// Documentation.
    Doc,
    /// Anything else.
    Other,
}

impl FeedbackCategory {
    /// Every category, in summary order.
    pub const ALL: [Self; 6] = [
        Self::Feature,
        Self::Bug,
        Self::Performance,
        Self::Ux,
        Self::Doc,
        Self::Other,
    ];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Bug => "bug",
            Self::Performance => "performance",
            Self::Ux => "ux",
            Self::Doc => "doc",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for FeedbackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgent the feedback is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackPriority {
    /// Critical.
    Critical,
    /// High.
    High,
    /// Medium.
    Medium,
    /// Low.
    Low,
}

impl FeedbackPriority {
    /// Every priority, most urgent first.
    pub const ALL: [Self; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// What to do with a feedback entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackAction {
    /// Mark as resolved.
    Resolve,
    /// Mark as rejected.
    Reject,
    /// Put off for later.
    Defer,
}

/// Processing state derived from the action timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackState {
    /// No action taken.
    Pending,
    /// Deferred.
    Processing,
    /// Resolved or rejected.
    Completed,
}

/// Caller-supplied part of a feedback entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackInput {
    /// Who gave it.
    #[serde(default)]
    pub source: FeedbackSource,
    /// Explicit category; keyword classification fills it in otherwise.
    #[serde(default)]
    pub category: Option<FeedbackCategory>,
    /// Urgency.
    #[serde(default)]
    pub priority: Option<FeedbackPriority>,
    /// The feedback text.
    pub content: String,
    /// Author name.
    #[serde(default)]
    pub author: Option<String>,
}

impl FeedbackInput {
    /// Creates customer feedback with the given text.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Sets the source.
    #[must_use]
    pub fn with_source(mut self, source: FeedbackSource) -> Self {
        self.source = source;
        self
    }

    /// Sets an explicit category.
    #[must_use]
    pub fn with_category(mut self, category: FeedbackCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: FeedbackPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the author.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// A stored feedback entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    /// `FB_<millis>_<6 chars>`.
    pub id: String,
    /// Stage the feedback concerns.
    pub stage: Stage,
    /// Who gave it.
    pub source: FeedbackSource,
    /// Category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<FeedbackCategory>,
    /// Urgency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<FeedbackPriority>,
    /// The feedback text.
    pub content: String,
    /// Author name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// When it was collected.
    pub created_at: Timestamp,
    /// When it was resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<Timestamp>,
    /// When it was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<Timestamp>,
    /// When it was deferred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deferred_at: Option<Timestamp>,
}

impl Feedback {
    /// Derives the processing state.
    #[must_use]
    pub fn state(&self) -> FeedbackState {
        if self.resolved_at.is_some() || self.rejected_at.is_some() {
            FeedbackState::Completed
        } else if self.deferred_at.is_some() {
            FeedbackState::Processing
        } else {
            FeedbackState::Pending
        }
    }
}

/// Counts over all collected feedback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummary {
    /// All entries.
    pub total: usize,
    /// Entries with no action taken.
    pub pending: usize,
    /// Deferred entries.
    pub processing: usize,
    /// Resolved or rejected entries.
    pub completed: usize,
    /// Entries per category, every category present.
    pub by_category: BTreeMap<FeedbackCategory, usize>,
    /// Entries per priority, every priority present.
    pub by_priority: BTreeMap<FeedbackPriority, usize>,
    /// Entries per stage.
    pub by_stage: BTreeMap<Stage, usize>,
}

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// `feedback-summary.json`: the summary counts.
    #[default]
    Json,
    /// `feedback-summary.csv`: one row per entry.
    Csv,
}

impl ExportFormat {
    /// File extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}
