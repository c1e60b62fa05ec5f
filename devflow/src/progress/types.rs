//! Progress tracker records.

use crate::core::{Stage, StageStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tracker-side progress of one stage.
///
/// Maintained independently of the coordinator's ledger; callers keep the
/// two in sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageProgress {
    /// The stage.
    pub stage: Stage,
    /// Completion percentage, 0 to 100.
    pub progress: f64,
    /// Tracker-side status.
    pub status: StageStatus,
    /// Days actually spent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_duration: Option<f64>,
    /// Days planned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<f64>,
    /// When work on the stage began.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// When work on the stage ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl StageProgress {
    /// Creates a pending record with no progress.
    #[must_use]
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            progress: 0.0,
            status: StageStatus::Pending,
            actual_duration: None,
            estimated_duration: None,
            start_date: None,
            end_date: None,
        }
    }

    /// Merges the fields set in `update` into the record.
    pub fn apply(&mut self, update: StageProgressUpdate) {
        if let Some(progress) = update.progress {
            self.progress = progress;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if update.actual_duration.is_some() {
            self.actual_duration = update.actual_duration;
        }
        if update.estimated_duration.is_some() {
            self.estimated_duration = update.estimated_duration;
        }
        if update.start_date.is_some() {
            self.start_date = update.start_date;
        }
        if update.end_date.is_some() {
            self.end_date = update.end_date;
        }
    }
}

/// Partial update for a [`StageProgress`]; unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageProgressUpdate {
    /// New completion percentage.
    pub progress: Option<f64>,
    /// New status.
    pub status: Option<StageStatus>,
    /// New actual duration.
    pub actual_duration: Option<f64>,
    /// New estimated duration.
    pub estimated_duration: Option<f64>,
    /// New start date.
    pub start_date: Option<NaiveDate>,
    /// New end date.
    pub end_date: Option<NaiveDate>,
}

impl StageProgressUpdate {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the completion percentage.
    #[must_use]
    pub fn progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn status(mut self, status: StageStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the start date.
    #[must_use]
    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Sets the end date.
    #[must_use]
    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    /// Sets the planned and actual durations.
    #[must_use]
    pub fn durations(mut self, estimated: f64, actual: f64) -> Self {
        self.estimated_duration = Some(estimated);
        self.actual_duration = Some(actual);
        self
    }
}

/// A named checkpoint spanning one or more stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    /// Milestone name.
    pub name: String,
    /// Planned date.
    pub target_date: NaiveDate,
    /// Stages that must all be completed.
    pub stages: Vec<Stage>,
    /// Derived: all listed stages are completed.
    #[serde(default)]
    pub completed: bool,
}

impl Milestone {
    /// Creates a milestone.
    #[must_use]
    pub fn new(name: impl Into<String>, target_date: NaiveDate, stages: Vec<Stage>) -> Self {
        Self {
            name: name.into(),
            target_date,
            stages,
            completed: false,
        }
    }
}

/// Derived milestone state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneState {
    /// At least one stage is not completed.
    Pending,
    /// Every stage is completed.
    Completed,
}

/// Health classification of the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Nothing is in progress.
    Low,
    /// In-progress stages are on track.
    Medium,
    /// An in-progress stage is below the warning threshold.
    High,
    /// An in-progress stage is below the critical threshold.
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Roll-up computed by the progress tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerProgress {
    /// First in-progress stage, if any.
    pub current_stage: Option<Stage>,
    /// Rounded overall completion percentage.
    pub overall_progress: f64,
    /// Stages marked completed.
    pub completed_stages: Vec<Stage>,
    /// Stages marked in progress.
    pub in_progress_stages: Vec<Stage>,
    /// Derived state per milestone name.
    pub milestones_status: BTreeMap<String, MilestoneState>,
    /// Risk classification.
    pub risk_level: RiskLevel,
    /// One line per lagging in-progress stage.
    pub recommendations: Vec<String>,
}
