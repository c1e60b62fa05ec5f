//! Engine-wide configuration.
//!
//! Every section is optional in JSON; missing sections and fields take
//! their defaults.

use crate::artifacts::ArtifactStoreConfig;
use crate::coordinator::FlowConfig;
use crate::errors::Result;
use crate::feedback::FeedbackConfig;
use crate::observability::LogFormat;
use crate::progress::TrackerConfig;
use crate::quality::QualityConfig;
use crate::review::ReviewConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of every devflow component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevflowConfig {
    /// Flow coordinator.
    #[serde(default)]
    pub flow: FlowConfig,
    /// Review orchestrator.
    #[serde(default)]
    pub review: ReviewConfig,
    /// Artifact store.
    #[serde(default)]
    pub artifacts: ArtifactStoreConfig,
    /// Progress tracker.
    #[serde(default)]
    pub tracker: TrackerConfig,
    /// Quality metrics collector.
    #[serde(default)]
    pub quality: QualityConfig,
    /// Feedback collector.
    #[serde(default)]
    pub feedback: FeedbackConfig,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

impl DevflowConfig {
    /// Parses a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&json)
    }

    /// Serializes to pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FlowError;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(DevflowConfig::from_json_str("{}").unwrap(), DevflowConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = DevflowConfig::from_json_str(
            r#"{
                "flow": {"fail_on_critical": true},
                "artifacts": {"storage_dir": "/tmp/store", "enable_archive": false},
                "tracker": {"critical_threshold": 50},
                "log_format": "json"
            }"#,
        )
        .unwrap();

        assert!(config.flow.fail_on_critical);
        assert_eq!(config.flow.max_review_attempts, 3);
        assert_eq!(config.artifacts.storage_dir, PathBuf::from("/tmp/store"));
        assert!(config.artifacts.enable_versioning);
        assert!(!config.artifacts.enable_archive);
        assert_eq!(config.tracker.critical_threshold, 50.0);
        assert_eq!(config.tracker.warning_threshold, 80.0);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.feedback.auto_classify);
    }

    #[test]
    fn test_invalid_json() {
        let err = DevflowConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, FlowError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_load_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("devflow.json");
        let config = DevflowConfig {
            review: ReviewConfig::new().with_max_attempts(5),
            ..DevflowConfig::default()
        };
        std::fs::write(&path, config.to_json_string().unwrap()).unwrap();

        assert_eq!(DevflowConfig::load(&path).await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = DevflowConfig::load("/nonexistent/devflow.json").await.unwrap_err();
        assert!(matches!(err, FlowError::Io(_)));
    }
}
