//! Failure handling policy and stage outcomes.

use super::config::FlowConfig;
use crate::core::Stage;
use crate::errors::StageError;
use serde::{Deserialize, Serialize};

/// What a handled stage operation led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageOutcome {
    /// `from` was completed; `to` is the stage activated after it, if any.
    Advanced {
        /// The completed stage.
        from: Stage,
        /// The newly active stage.
        to: Option<Stage>,
    },
    /// The stage was reset to pending for another attempt.
    Retrying {
        /// The failed stage.
        stage: Stage,
        /// Retry number, starting at 1.
        attempt: u32,
    },
    /// The stage ran out of retries and was completed without an artifact.
    Skipped {
        /// The skipped stage.
        stage: Stage,
        /// The stage activated after it, if any.
        next: Option<Stage>,
    },
}

/// Decision taken for a reported stage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDecision {
    /// Terminate the flow.
    Abort,
    /// Reset the stage for another attempt.
    Retry,
    /// Complete the stage without an artifact.
    Skip,
}

/// Maps a stage failure and the retries already used to a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailurePolicy {
    /// Retries allowed per stage.
    pub max_retries: u32,
    /// Abort on critical failures.
    pub fail_on_critical: bool,
}

impl FailurePolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(max_retries: u32, fail_on_critical: bool) -> Self {
        Self {
            max_retries,
            fail_on_critical,
        }
    }

    /// Decides how to handle `error`.
    ///
    /// A critical error aborts regardless of the retries used.
    #[must_use]
    pub fn decide(&self, error: &StageError, retries_used: u32) -> FailureDecision {
        if self.fail_on_critical && error.is_critical() {
            FailureDecision::Abort
        } else if retries_used < self.max_retries {
            FailureDecision::Retry
        } else {
            FailureDecision::Skip
        }
    }
}

impl From<&FlowConfig> for FailurePolicy {
    fn from(config: &FlowConfig) -> Self {
        Self::new(config.max_review_attempts, config.fail_on_critical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_until_budget_spent() {
        let policy = FailurePolicy::new(2, false);
        let err = StageError::new("flaky");
        assert_eq!(policy.decide(&err, 0), FailureDecision::Retry);
        assert_eq!(policy.decide(&err, 1), FailureDecision::Retry);
        assert_eq!(policy.decide(&err, 2), FailureDecision::Skip);
    }

    #[test]
    fn test_zero_budget_skips() {
        let policy = FailurePolicy::new(0, false);
        assert_eq!(policy.decide(&StageError::new("x"), 0), FailureDecision::Skip);
    }

    #[test]
    fn test_critical_aborts_only_when_enabled() {
        let err = StageError::critical("disk gone");
        assert_eq!(FailurePolicy::new(3, true).decide(&err, 0), FailureDecision::Abort);
        assert_eq!(FailurePolicy::new(3, true).decide(&err, 3), FailureDecision::Abort);
        assert_eq!(FailurePolicy::new(3, false).decide(&err, 0), FailureDecision::Retry);
    }

    #[test]
    fn test_outcome_wire_format() {
        let outcome = StageOutcome::Skipped {
            stage: Stage::UiDesign,
            next: Some(Stage::FrontendDevelopment),
        };
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(json["outcome"], "skipped");
        assert_eq!(json["next"], "frontend-development");
    }
}
