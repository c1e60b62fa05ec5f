//! Flow coordinator configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the [`FlowCoordinator`](super::FlowCoordinator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Activate the next stage when a stage completes.
    #[serde(default = "default_enable_auto_transition")]
    pub enable_auto_transition: bool,

    /// Failure retries per stage before it is skipped.
    #[serde(default = "default_max_review_attempts")]
    pub max_review_attempts: u32,

    /// Abort the flow on a critical stage failure.
    #[serde(default)]
    pub fail_on_critical: bool,

    /// Where [`complete`](super::FlowCoordinator::complete) writes the flow report.
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,
}

fn default_enable_auto_transition() -> bool {
    true
}

fn default_max_review_attempts() -> u32 {
    3
}

fn default_report_path() -> PathBuf {
    PathBuf::from("./flow-report.json")
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            enable_auto_transition: default_enable_auto_transition(),
            max_review_attempts: default_max_review_attempts(),
            fail_on_critical: false,
            report_path: default_report_path(),
        }
    }
}

impl FlowConfig {
    /// Creates a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables auto-transition.
    #[must_use]
    pub fn with_auto_transition(mut self, enabled: bool) -> Self {
        self.enable_auto_transition = enabled;
        self
    }

    /// Sets the retry budget per stage.
    #[must_use]
    pub fn with_max_review_attempts(mut self, attempts: u32) -> Self {
        self.max_review_attempts = attempts;
        self
    }

    /// Enables or disables aborting on critical failures.
    #[must_use]
    pub fn with_fail_on_critical(mut self, enabled: bool) -> Self {
        self.fail_on_critical = enabled;
        self
    }

    /// Sets the report path.
    #[must_use]
    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FlowConfig::default();
        assert!(config.enable_auto_transition);
        assert_eq!(config.max_review_attempts, 3);
        assert!(!config.fail_on_critical);
        assert_eq!(config.report_path, PathBuf::from("./flow-report.json"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: FlowConfig =
            serde_json::from_str(r#"{"fail_on_critical": true, "max_review_attempts": 1}"#)
                .unwrap();
        assert!(config.fail_on_critical);
        assert_eq!(config.max_review_attempts, 1);
        assert!(config.enable_auto_transition);
    }
}
