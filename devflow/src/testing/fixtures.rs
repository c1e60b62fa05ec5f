//! Fixtures for exercising flows against a scratch directory.

use crate::artifacts::{
    ArtifactConfig, ArtifactFormat, ArtifactStoreConfig, ArtifactType, DeliveryArtifactsManager,
    FileContent,
};
use crate::context::ProjectContext;
use crate::coordinator::FlowConfig;
use crate::core::Stage;
use crate::errors::Result;
use crate::feedback::{FeedbackCollector, FeedbackConfig};
use crate::progress::Milestone;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The demo project: `Demo`, starting 2024-01-01.
#[must_use]
pub fn demo_project() -> ProjectContext {
    ProjectContext::new("Demo", date(2024, 1, 1))
}

/// Two milestones covering the requirements and design stages.
#[must_use]
pub fn sample_milestones() -> Vec<Milestone> {
    vec![
        Milestone::new(
            "Requirements signed off",
            date(2024, 2, 1),
            vec![Stage::RequirementsProposal, Stage::RequirementsAnalysis],
        ),
        Milestone::new(
            "Design complete",
            date(2024, 3, 15),
            vec![Stage::ProductDesign, Stage::UiDesign],
        ),
    ]
}

/// One artifact config per kind, spread over the early stages.
#[must_use]
pub fn sample_artifact_configs() -> Vec<ArtifactConfig> {
    vec![
        ArtifactConfig::new(
            Stage::RequirementsAnalysis,
            "requirements",
            ArtifactType::Document,
            ArtifactFormat::Json,
        )
        .with_description("Consolidated requirements"),
        ArtifactConfig::new(
            Stage::UiDesign,
            "designs",
            ArtifactType::Design,
            ArtifactFormat::Figma,
        ),
        ArtifactConfig::new(
            Stage::FrontendDevelopment,
            "web-client",
            ArtifactType::Code,
            ArtifactFormat::Zip,
        )
        .with_version("2.1"),
    ]
}

/// Auxiliary files for a sample artifact.
#[must_use]
pub fn sample_files() -> Vec<FileContent> {
    vec![
        FileContent::new("README.md", "# Deliverable\n"),
        FileContent::new("notes.txt", "reviewed"),
    ]
}

/// A scratch directory that holds every file a flow writes.
///
/// Removed when dropped.
#[derive(Debug)]
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh workspace.
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    /// Root of the workspace.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the flow report.
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.path().join("flow-report.json")
    }

    /// Flow config writing its report into the workspace.
    #[must_use]
    pub fn flow_config(&self) -> FlowConfig {
        FlowConfig::default().with_report_path(self.report_path())
    }

    /// Artifact store config rooted in the workspace.
    #[must_use]
    pub fn artifact_store_config(&self) -> ArtifactStoreConfig {
        ArtifactStoreConfig::new(self.path().join("artifacts"))
    }

    /// Feedback config rooted in the workspace.
    #[must_use]
    pub fn feedback_config(&self) -> FeedbackConfig {
        FeedbackConfig::new(self.path().join("feedback"))
    }

    /// Creates an artifact manager over the workspace store.
    pub async fn artifacts_manager(&self) -> Result<DeliveryArtifactsManager> {
        DeliveryArtifactsManager::new(self.artifact_store_config()).await
    }

    /// Creates a feedback collector over the workspace store.
    pub async fn feedback_collector(&self) -> Result<FeedbackCollector> {
        FeedbackCollector::new(self.feedback_config()).await
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}
