//! The shared flow context.
//!
//! The coordinator, the review orchestrator and the progress tracker all
//! exchange state through one [`FlowContext`]. Every entry is a typed,
//! per-stage record instead of a string-keyed value. Ledger and artifact
//! writes are crate-private: only the coordinator drives stage status.

use super::ledger::{SettledStatus, StageLedger};
use super::project::ProjectContext;
use super::records::{FailureRecord, TransitionTrigger};
use crate::core::{Stage, StageStatus};
use crate::progress::StageProgress;
use crate::review::ReviewStatus;
use crate::utils::Timestamp;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Point-in-time copy of everything held in a [`FlowContext`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    /// The project, once the flow has started.
    pub project: Option<ProjectContext>,
    /// Stage statuses and the active stage.
    pub ledger: StageLedger,
    /// Artifact handed off by each stage; `None` for a skipped stage.
    pub artifacts: BTreeMap<Stage, Option<serde_json::Value>>,
    /// Artifact of the stage completed by the last transition.
    pub previous_artifact: Option<serde_json::Value>,
    /// The most recently passed artifact.
    pub latest_artifact: Option<serde_json::Value>,
    /// Last failure per stage.
    pub failures: BTreeMap<Stage, FailureRecord>,
    /// Failure retries consumed per stage.
    pub retry_counts: BTreeMap<Stage, u32>,
    /// Review record per stage.
    pub reviews: BTreeMap<Stage, ReviewStatus>,
    /// Pending review-driven transition signals, keyed by target stage.
    pub transition_triggers: BTreeMap<Stage, TransitionTrigger>,
    /// Progress records maintained by the progress tracker.
    pub stage_progress: BTreeMap<Stage, StageProgress>,
}

/// Thread-safe, cheaply cloneable handle to the shared flow state.
#[derive(Debug, Clone, Default)]
pub struct FlowContext {
    inner: Arc<RwLock<ContextSnapshot>>,
}

impl FlowContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the whole context.
    #[must_use]
    pub fn snapshot(&self) -> ContextSnapshot {
        self.inner.read().clone()
    }

    // --- project ---------------------------------------------------------

    /// Returns the project, once the flow has started.
    #[must_use]
    pub fn project(&self) -> Option<ProjectContext> {
        self.inner.read().project.clone()
    }

    pub(crate) fn set_project(&self, project: ProjectContext) {
        self.inner.write().project = Some(project);
    }

    // --- ledger ----------------------------------------------------------

    /// Returns the active stage, if any.
    #[must_use]
    pub fn active_stage(&self) -> Option<Stage> {
        self.inner.read().ledger.active()
    }

    /// Returns the status of a stage.
    #[must_use]
    pub fn stage_status(&self, stage: Stage) -> StageStatus {
        self.inner.read().ledger.status(stage)
    }

    /// Returns the status of every stage in flow order.
    #[must_use]
    pub fn stage_statuses(&self) -> BTreeMap<Stage, StageStatus> {
        self.inner.read().ledger.statuses()
    }

    /// Returns when a stage's status last changed.
    #[must_use]
    pub fn stage_updated_at(&self, stage: Stage) -> Option<Timestamp> {
        self.inner.read().ledger.updated_at(stage)
    }

    pub(crate) fn activate_stage(&self, stage: Stage) -> Option<Stage> {
        self.inner.write().ledger.activate(stage)
    }

    pub(crate) fn settle_stage(&self, stage: Stage, status: SettledStatus) {
        self.inner.write().ledger.settle(stage, status);
    }

    /// Clears all per-run stage state, reviews and pending triggers
    /// included. Tracker records are kept.
    pub(crate) fn reset_stages(&self) {
        let mut board = self.inner.write();
        board.ledger.reset();
        board.artifacts = Stage::ALL.into_iter().map(|s| (s, None)).collect();
        board.previous_artifact = None;
        board.latest_artifact = None;
        board.failures.clear();
        board.retry_counts.clear();
        board.reviews.clear();
        board.transition_triggers.clear();
    }

    // --- artifacts -------------------------------------------------------

    /// Returns the artifact handed off by a stage.
    #[must_use]
    pub fn stage_artifact(&self, stage: Stage) -> Option<serde_json::Value> {
        self.inner.read().artifacts.get(&stage).cloned().flatten()
    }

    /// Returns the artifact carried over by the last transition.
    #[must_use]
    pub fn previous_artifact(&self) -> Option<serde_json::Value> {
        self.inner.read().previous_artifact.clone()
    }

    /// Returns the most recently passed artifact.
    #[must_use]
    pub fn latest_artifact(&self) -> Option<serde_json::Value> {
        self.inner.read().latest_artifact.clone()
    }

    pub(crate) fn set_stage_artifact(&self, stage: Stage, artifact: Option<serde_json::Value>) {
        self.inner.write().artifacts.insert(stage, artifact);
    }

    pub(crate) fn set_previous_artifact(&self, artifact: Option<serde_json::Value>) {
        self.inner.write().previous_artifact = artifact;
    }

    pub(crate) fn set_latest_artifact(&self, artifact: serde_json::Value) {
        self.inner.write().latest_artifact = Some(artifact);
    }

    // --- failures and retries --------------------------------------------

    /// Returns the last failure recorded for a stage.
    #[must_use]
    pub fn failure(&self, stage: Stage) -> Option<FailureRecord> {
        self.inner.read().failures.get(&stage).cloned()
    }

    /// Returns how many failure retries a stage has consumed.
    #[must_use]
    pub fn retry_count(&self, stage: Stage) -> u32 {
        self.inner.read().retry_counts.get(&stage).copied().unwrap_or(0)
    }

    pub(crate) fn record_failure(&self, stage: Stage, record: FailureRecord) {
        self.inner.write().failures.insert(stage, record);
    }

    pub(crate) fn increment_retry(&self, stage: Stage) -> u32 {
        let mut board = self.inner.write();
        let count = board.retry_counts.entry(stage).or_insert(0);
        *count += 1;
        *count
    }

    // --- reviews ---------------------------------------------------------

    /// Returns the review record of a stage.
    #[must_use]
    pub fn review(&self, stage: Stage) -> Option<ReviewStatus> {
        self.inner.read().reviews.get(&stage).cloned()
    }

    /// Returns every review record.
    #[must_use]
    pub fn reviews(&self) -> BTreeMap<Stage, ReviewStatus> {
        self.inner.read().reviews.clone()
    }

    /// Stores a review record, replacing any previous one.
    pub fn put_review(&self, review: ReviewStatus) {
        self.inner.write().reviews.insert(review.stage, review);
    }

    /// Mutates the review record of a stage in place.
    ///
    /// Returns `None` if the stage has no review record.
    pub fn update_review<R>(&self, stage: Stage, f: impl FnOnce(&mut ReviewStatus) -> R) -> Option<R> {
        self.inner.write().reviews.get_mut(&stage).map(f)
    }

    // --- transition triggers ---------------------------------------------

    /// Publishes a review-driven transition signal for `target`.
    pub fn publish_transition_trigger(&self, target: Stage, trigger: TransitionTrigger) {
        self.inner.write().transition_triggers.insert(target, trigger);
    }

    /// Returns the pending transition signal for `target`, if any.
    #[must_use]
    pub fn transition_trigger(&self, target: Stage) -> Option<TransitionTrigger> {
        self.inner.read().transition_triggers.get(&target).cloned()
    }

    /// Removes and returns the pending transition signal for `target`.
    pub fn take_transition_trigger(&self, target: Stage) -> Option<TransitionTrigger> {
        self.inner.write().transition_triggers.remove(&target)
    }

    // --- tracker progress ------------------------------------------------

    /// Returns the tracker's progress record for a stage.
    #[must_use]
    pub fn stage_progress(&self, stage: Stage) -> StageProgress {
        self.inner
            .read()
            .stage_progress
            .get(&stage)
            .cloned()
            .unwrap_or_else(|| StageProgress::new(stage))
    }

    /// Stores the tracker's progress record for a stage.
    pub fn put_stage_progress(&self, progress: StageProgress) {
        self.inner.write().stage_progress.insert(progress.stage, progress);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StageError;

    #[test]
    fn test_clones_share_state() {
        let ctx = FlowContext::new();
        let other = ctx.clone();

        ctx.activate_stage(Stage::ProductDesign);
        assert_eq!(other.active_stage(), Some(Stage::ProductDesign));
        assert_eq!(other.stage_status(Stage::ProductDesign), StageStatus::InProgress);
    }

    #[test]
    fn test_reset_stages_nulls_artifacts() {
        let ctx = FlowContext::new();
        ctx.set_stage_artifact(Stage::UiDesign, Some(serde_json::json!({"screens": 4})));
        ctx.increment_retry(Stage::UiDesign);
        ctx.reset_stages();

        let snapshot = ctx.snapshot();
        assert_eq!(snapshot.artifacts.len(), Stage::COUNT);
        assert!(snapshot.artifacts.values().all(Option::is_none));
        assert_eq!(ctx.retry_count(Stage::UiDesign), 0);
    }

    #[test]
    fn test_reset_stages_drops_reviews_and_triggers() {
        let ctx = FlowContext::new();
        ctx.put_review(ReviewStatus::new(Stage::UiDesign, 3, 3));
        ctx.publish_transition_trigger(Stage::UiDesign, TransitionTrigger::new(Stage::ProductDesign));
        ctx.put_stage_progress(StageProgress::new(Stage::UiDesign));
        ctx.reset_stages();

        assert!(ctx.review(Stage::UiDesign).is_none());
        assert!(ctx.transition_trigger(Stage::UiDesign).is_none());
        assert_eq!(ctx.snapshot().stage_progress.len(), 1);
    }

    #[test]
    fn test_retry_counter() {
        let ctx = FlowContext::new();
        assert_eq!(ctx.retry_count(Stage::SecurityReview), 0);
        assert_eq!(ctx.increment_retry(Stage::SecurityReview), 1);
        assert_eq!(ctx.increment_retry(Stage::SecurityReview), 2);
        assert_eq!(ctx.retry_count(Stage::SecurityReview), 2);
    }

    #[test]
    fn test_failure_record() {
        let ctx = FlowContext::new();
        let err = StageError::critical("db down");
        ctx.record_failure(Stage::BackendDevelopment, FailureRecord::from(&err));

        let record = ctx.failure(Stage::BackendDevelopment).unwrap();
        assert_eq!(record.message, "db down");
        assert!(ctx.failure(Stage::UiDesign).is_none());
    }

    #[test]
    fn test_take_transition_trigger() {
        let ctx = FlowContext::new();
        ctx.publish_transition_trigger(
            Stage::ProductDesign,
            TransitionTrigger::new(Stage::RequirementsAnalysis),
        );

        assert!(ctx.transition_trigger(Stage::ProductDesign).is_some());
        let trigger = ctx.take_transition_trigger(Stage::ProductDesign).unwrap();
        assert_eq!(trigger.from_stage, Stage::RequirementsAnalysis);
        assert!(ctx.transition_trigger(Stage::ProductDesign).is_none());
    }

    #[test]
    fn test_default_stage_progress() {
        let ctx = FlowContext::new();
        let progress = ctx.stage_progress(Stage::UiDesign);
        assert_eq!(progress.stage, Stage::UiDesign);
        assert_eq!(progress.status, StageStatus::Pending);
    }

    #[test]
    fn test_snapshot_serializes() {
        let ctx = FlowContext::new();
        ctx.activate_stage(Stage::first());
        let json = serde_json::to_value(ctx.snapshot()).unwrap();
        assert_eq!(json["ledger"]["active"], "requirements-proposal");
    }
}
