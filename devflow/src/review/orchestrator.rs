//! Bounded self-review loop per stage.

use super::types::{Decision, ReviewComment, ReviewDecision, ReviewState, ReviewStatus};
use crate::context::{FlowContext, TransitionTrigger};
use crate::core::Stage;
use crate::utils::now_utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Configuration for the review loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Maximum review attempts per stage.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Whether a passing review signals the next stage.
    #[serde(default = "default_auto_transition")]
    pub auto_transition: bool,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_auto_transition() -> bool {
    true
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            auto_transition: default_auto_transition(),
        }
    }
}

impl ReviewConfig {
    /// Creates a new review config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the attempt budget.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Enables or disables transition signalling.
    #[must_use]
    pub fn with_auto_transition(mut self, enabled: bool) -> Self {
        self.auto_transition = enabled;
        self
    }
}

/// Runs the self-review loop and records review decisions.
///
/// A passing review never drives the coordinator directly. It publishes a
/// [`TransitionTrigger`] for the next stage into the shared context, which
/// the coordinator may pick up.
#[derive(Debug, Clone)]
pub struct ReviewOrchestrator {
    ctx: FlowContext,
    config: ReviewConfig,
}

impl ReviewOrchestrator {
    /// Author recorded on comments added through [`Self::add_comment`].
    pub const SYSTEM_AUTHOR: &'static str = "system";

    /// Creates an orchestrator over a shared context.
    #[must_use]
    pub fn new(ctx: FlowContext, config: ReviewConfig) -> Self {
        Self { ctx, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    /// Opens the next self-review attempt for a stage.
    ///
    /// Returns the new attempt number, or `None` if the stage already used
    /// its whole budget.
    pub fn trigger_self_review(&self, stage: Stage) -> Option<u32> {
        let previous = self.ctx.review(stage);

        if let Some(ref status) = previous {
            if status.is_exhausted() {
                warn!(stage = %stage, attempt = status.attempt, "Stage has reached max review attempts");
                return None;
            }
        }

        let attempt = previous.map_or(1, |status| status.attempt + 1);
        self.ctx
            .put_review(ReviewStatus::new(stage, attempt, self.config.max_attempts));

        info!(stage = %stage, attempt, "Self-review initiated");
        Some(attempt)
    }

    /// Appends a comment to the stage's review.
    ///
    /// Returns false, with a warning, if the stage has no review.
    pub fn add_comment(&self, stage: Stage, text: impl Into<String>) -> bool {
        let comment = ReviewComment::new(Self::SYSTEM_AUTHOR, text);
        let added = self
            .ctx
            .update_review(stage, |status| status.comments.push(comment))
            .is_some();

        if added {
            info!(stage = %stage, "Comment added to review");
        } else {
            warn!(stage = %stage, "No active review for stage");
        }
        added
    }

    /// Records the reviewer's decision for a stage.
    ///
    /// Returns the stage that was signalled to start next, if any.
    pub fn record_decision(
        &self,
        stage: Stage,
        decision: Decision,
        reviewer: impl Into<String>,
        comments: Vec<String>,
    ) -> Option<Stage> {
        let reviewer = reviewer.into();
        let recorded = ReviewDecision {
            reviewer: reviewer.clone(),
            decision,
            comments,
            timestamp: now_utc(),
        };

        let updated = self.ctx.update_review(stage, |status| {
            status.status = if decision.is_pass() {
                ReviewState::Completed
            } else {
                ReviewState::Failed
            };
            status.decision = Some(recorded);
        });

        if updated.is_none() {
            warn!(stage = %stage, "No active review for stage");
            return None;
        }

        info!(stage = %stage, decision = %decision, reviewer = %reviewer, "Review decision recorded");

        if self.config.auto_transition && decision.is_pass() {
            return self.signal_next_stage(stage);
        }
        None
    }

    fn signal_next_stage(&self, stage: Stage) -> Option<Stage> {
        let Some(next) = stage.next() else {
            warn!(stage = %stage, "Cannot auto-transition from last stage");
            return None;
        };

        info!(from = %stage, to = %next, "Signalling transition to next stage");
        self.ctx
            .publish_transition_trigger(next, TransitionTrigger::new(stage));
        Some(next)
    }

    /// Returns the review record of a stage.
    #[must_use]
    pub fn get_review_status(&self, stage: Stage) -> Option<ReviewStatus> {
        self.ctx.review(stage)
    }

    /// Returns every review record, keyed by stage.
    #[must_use]
    pub fn get_all_review_statuses(&self) -> BTreeMap<Stage, ReviewStatus> {
        self.ctx.reviews()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orchestrator(config: ReviewConfig) -> (FlowContext, ReviewOrchestrator) {
        let ctx = FlowContext::new();
        (ctx.clone(), ReviewOrchestrator::new(ctx, config))
    }

    #[test]
    fn test_review_config_default() {
        let config = ReviewConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert!(config.auto_transition);
    }

    #[test]
    fn test_trigger_creates_pending_review() {
        let (_, reviews) = orchestrator(ReviewConfig::default());

        assert_eq!(reviews.trigger_self_review(Stage::ProductDesign), Some(1));
        let status = reviews.get_review_status(Stage::ProductDesign).unwrap();
        assert_eq!(status.attempt, 1);
        assert_eq!(status.max_attempts, 3);
        assert_eq!(status.status, ReviewState::Pending);
    }

    #[test]
    fn test_trigger_respects_budget() {
        let (_, reviews) = orchestrator(ReviewConfig::new().with_max_attempts(2));

        assert_eq!(reviews.trigger_self_review(Stage::UiDesign), Some(1));
        assert_eq!(reviews.trigger_self_review(Stage::UiDesign), Some(2));
        assert_eq!(reviews.trigger_self_review(Stage::UiDesign), None);
        assert_eq!(reviews.get_review_status(Stage::UiDesign).unwrap().attempt, 2);
    }

    #[test]
    fn test_new_attempt_overwrites_record() {
        let (_, reviews) = orchestrator(ReviewConfig::default());
        reviews.trigger_self_review(Stage::UiDesign);
        reviews.add_comment(Stage::UiDesign, "contrast too low");
        reviews.record_decision(Stage::UiDesign, Decision::NeedsRevision, "alice", vec![]);

        reviews.trigger_self_review(Stage::UiDesign);
        let status = reviews.get_review_status(Stage::UiDesign).unwrap();
        assert_eq!(status.attempt, 2);
        assert!(status.comments.is_empty());
        assert!(status.decision.is_none());
    }

    #[test]
    fn test_add_comment_without_review() {
        let (_, reviews) = orchestrator(ReviewConfig::default());
        assert!(!reviews.add_comment(Stage::SecurityReview, "hello"));
        assert!(reviews.get_review_status(Stage::SecurityReview).is_none());
    }

    #[test]
    fn test_add_comment() {
        let (_, reviews) = orchestrator(ReviewConfig::default());
        reviews.trigger_self_review(Stage::SecurityReview);
        assert!(reviews.add_comment(Stage::SecurityReview, "rotate the keys"));

        let status = reviews.get_review_status(Stage::SecurityReview).unwrap();
        assert_eq!(status.comments.len(), 1);
        assert_eq!(status.comments[0].author, "system");
        assert_eq!(status.comments[0].content, "rotate the keys");
    }

    #[test]
    fn test_pass_signals_next_stage() {
        let (ctx, reviews) = orchestrator(ReviewConfig::default());
        reviews.trigger_self_review(Stage::RequirementsProposal);

        let next = reviews.record_decision(
            Stage::RequirementsProposal,
            Decision::Pass,
            "bob",
            vec!["looks good".to_string()],
        );

        assert_eq!(next, Some(Stage::RequirementsAnalysis));
        let trigger = ctx.transition_trigger(Stage::RequirementsAnalysis).unwrap();
        assert_eq!(trigger.from_stage, Stage::RequirementsProposal);

        let status = reviews.get_review_status(Stage::RequirementsProposal).unwrap();
        assert_eq!(status.status, ReviewState::Completed);
        assert_eq!(status.decision.unwrap().reviewer, "bob");
    }

    #[test]
    fn test_fail_does_not_signal() {
        let (ctx, reviews) = orchestrator(ReviewConfig::default());
        reviews.trigger_self_review(Stage::BackendDevelopment);

        let next = reviews.record_decision(Stage::BackendDevelopment, Decision::Fail, "carol", vec![]);
        assert_eq!(next, None);
        assert!(ctx.transition_trigger(Stage::ArchitectureGuarantee).is_none());
        assert_eq!(
            reviews.get_review_status(Stage::BackendDevelopment).unwrap().status,
            ReviewState::Failed
        );
    }

    #[test]
    fn test_pass_without_auto_transition() {
        let (ctx, reviews) = orchestrator(ReviewConfig::new().with_auto_transition(false));
        reviews.trigger_self_review(Stage::ProductDesign);

        assert_eq!(reviews.record_decision(Stage::ProductDesign, Decision::Pass, "dan", vec![]), None);
        assert!(ctx.transition_trigger(Stage::UiDesign).is_none());
    }

    #[test]
    fn test_pass_on_terminal_stage() {
        let (ctx, reviews) = orchestrator(ReviewConfig::default());
        reviews.trigger_self_review(Stage::ProjectCoordination);

        let next = reviews.record_decision(Stage::ProjectCoordination, Decision::Pass, "erin", vec![]);
        assert_eq!(next, None);
        assert!(ctx.snapshot().transition_triggers.is_empty());
        assert_eq!(
            reviews.get_review_status(Stage::ProjectCoordination).unwrap().status,
            ReviewState::Completed
        );
    }

    #[test]
    fn test_decision_without_review() {
        let (_, reviews) = orchestrator(ReviewConfig::default());
        assert_eq!(reviews.record_decision(Stage::UiDesign, Decision::Pass, "x", vec![]), None);
    }

    #[test]
    fn test_all_review_statuses() {
        let (_, reviews) = orchestrator(ReviewConfig::default());
        reviews.trigger_self_review(Stage::UiDesign);
        reviews.trigger_self_review(Stage::RequirementsProposal);

        let all = reviews.get_all_review_statuses();
        let stages: Vec<_> = all.keys().copied().collect();
        assert_eq!(stages, vec![Stage::RequirementsProposal, Stage::UiDesign]);
    }

    #[test]
    fn test_decision_serializes_kebab_case() {
        let json = serde_json::to_string(&Decision::NeedsRevision).unwrap();
        assert_eq!(json, r#""needs-revision""#);
    }
}
