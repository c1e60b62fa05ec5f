//! Per-stage status ledger with a single active slot.

use crate::core::{Stage, StageStatus};
use crate::utils::{now_utc, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A status a stage can be put in directly.
///
/// `in-progress` is missing on purpose: a stage only becomes active through
/// [`StageLedger::activate`], which keeps at most one stage in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettledStatus {
    /// Waiting to run.
    Pending,
    /// Finished or skipped.
    Completed,
    /// Failed.
    Failed,
    /// Parked.
    OnHold,
}

impl From<SettledStatus> for StageStatus {
    fn from(status: SettledStatus) -> Self {
        match status {
            SettledStatus::Pending => Self::Pending,
            SettledStatus::Completed => Self::Completed,
            SettledStatus::Failed => Self::Failed,
            SettledStatus::OnHold => Self::OnHold,
        }
    }
}

/// Status bookkeeping for all stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageLedger {
    active: Option<Stage>,
    settled: BTreeMap<Stage, SettledStatus>,
    updated_at: BTreeMap<Stage, Timestamp>,
}

impl StageLedger {
    /// Creates a ledger with every stage pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the active stage, if any.
    #[must_use]
    pub fn active(&self) -> Option<Stage> {
        self.active
    }

    /// Returns the status of a stage.
    #[must_use]
    pub fn status(&self, stage: Stage) -> StageStatus {
        if self.active == Some(stage) {
            return StageStatus::InProgress;
        }
        self.settled
            .get(&stage)
            .copied()
            .map_or(StageStatus::Pending, StageStatus::from)
    }

    /// Returns when the stage status last changed.
    #[must_use]
    pub fn updated_at(&self, stage: Stage) -> Option<Timestamp> {
        self.updated_at.get(&stage).copied()
    }

    /// Makes `stage` the active stage.
    ///
    /// A different stage that was still active is completed first. Returns
    /// that stage, if there was one.
    pub fn activate(&mut self, stage: Stage) -> Option<Stage> {
        let displaced = self.active.filter(|current| *current != stage);
        if let Some(previous) = displaced {
            self.settle(previous, SettledStatus::Completed);
        }
        self.settled.remove(&stage);
        self.active = Some(stage);
        self.updated_at.insert(stage, now_utc());
        displaced
    }

    /// Puts a stage into a settled status, releasing the active slot if it held it.
    pub fn settle(&mut self, stage: Stage, status: SettledStatus) {
        if self.active == Some(stage) {
            self.active = None;
        }
        self.settled.insert(stage, status);
        self.updated_at.insert(stage, now_utc());
    }

    /// Resets every stage to pending.
    pub fn reset(&mut self) {
        self.active = None;
        self.settled.clear();
        self.updated_at.clear();
    }

    /// Returns the status of every stage in flow order.
    #[must_use]
    pub fn statuses(&self) -> BTreeMap<Stage, StageStatus> {
        Stage::ALL
            .into_iter()
            .map(|stage| (stage, self.status(stage)))
            .collect()
    }

    /// Counts stages in a status.
    #[must_use]
    pub fn count(&self, status: StageStatus) -> usize {
        Stage::ALL
            .into_iter()
            .filter(|stage| self.status(*stage) == status)
            .count()
    }
}
