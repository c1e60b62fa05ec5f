//! Artifact records stored by the delivery artifacts manager.

use crate::core::Stage;
use crate::utils::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Kind of deliverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    /// Written document.
    Document,
    /// Design file.
    Design,
    /// Source code.
    Code,
    /// Configuration.
    Configuration,
    /// Distributable package.
    Package,
}

/// Encoding of the primary artifact file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    /// JSON; checked for well-formedness on validation.
    Json,
    /// Markdown.
    Markdown,
    /// PDF.
    Pdf,
    /// Figma export.
    Figma,
    /// Zip archive.
    Zip,
}

/// Describes a deliverable of a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactConfig {
    /// Owning stage.
    pub stage: Stage,
    /// Artifact name, unique within the stage.
    pub name: String,
    /// Kind of deliverable.
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
    /// Primary file format.
    pub format: ArtifactFormat,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Version label.
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl ArtifactConfig {
    /// Creates a config with an empty description and version `1.0`.
    #[must_use]
    pub fn new(
        stage: Stage,
        name: impl Into<String>,
        artifact_type: ArtifactType,
        format: ArtifactFormat,
    ) -> Self {
        Self {
            stage,
            name: name.into(),
            artifact_type,
            format,
            description: String::new(),
            version: default_version(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the version label.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Applies a partial update. `stage` and `name` identify the artifact
    /// and never change.
    pub fn apply(&mut self, update: ArtifactConfigUpdate) {
        if let Some(artifact_type) = update.artifact_type {
            self.artifact_type = artifact_type;
        }
        if let Some(format) = update.format {
            self.format = format;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(version) = update.version {
            self.version = version;
        }
    }
}

/// Partial update of an [`ArtifactConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactConfigUpdate {
    /// New kind.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<ArtifactType>,
    /// New format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ArtifactFormat>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New version label. Does not move the files on disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ArtifactConfigUpdate {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the format.
    #[must_use]
    pub fn format(mut self, format: ArtifactFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Sets the kind.
    #[must_use]
    pub fn artifact_type(mut self, artifact_type: ArtifactType) -> Self {
        self.artifact_type = Some(artifact_type);
        self
    }

    /// Sets the version label.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// An auxiliary file supplied at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    /// File name inside the artifact's `_files` directory.
    pub name: String,
    /// File content.
    pub content: String,
}

impl FileContent {
    /// Creates a file entry.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Registry entry of an artifact, mirrored to the `_metadata.json` sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactMetadata {
    /// The artifact description.
    pub config: ArtifactConfig,
    /// Path of the primary file.
    pub path: PathBuf,
    /// Total byte length of the auxiliary files.
    pub size: u64,
    /// Hex SHA-256 over the auxiliary files; empty when there are none.
    pub checksum: String,
    /// Registration time.
    pub created_at: Timestamp,
    /// Last update time.
    pub updated_at: Timestamp,
}

/// Outcome of [`validate_artifact`](super::DeliveryArtifactsManager::validate_artifact).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// True when `errors` is empty.
    pub is_valid: bool,
    /// Blocking problems.
    pub errors: Vec<String>,
    /// Non-blocking findings.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub(crate) fn from_findings(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Counts over the in-memory registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactStatistics {
    /// Registered artifacts.
    pub total: usize,
    /// Registered artifacts per stage.
    pub by_stage: BTreeMap<Stage, usize>,
    /// Sum of artifact sizes.
    pub total_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_wire_format() {
        let config = ArtifactConfig::new(
            Stage::UiDesign,
            "designs",
            ArtifactType::Design,
            ArtifactFormat::Figma,
        );
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["stage"], "ui-design");
        assert_eq!(json["type"], "design");
        assert_eq!(json["format"], "figma");
        assert_eq!(json["version"], "1.0");
    }

    #[test]
    fn test_config_defaults_on_deserialize() {
        let config: ArtifactConfig = serde_json::from_str(
            r#"{"stage":"product-design","name":"prd","type":"document","format":"markdown"}"#,
        )
        .unwrap();
        assert_eq!(config.version, "1.0");
        assert!(config.description.is_empty());
    }

    #[test]
    fn test_apply_update_keeps_identity() {
        let mut config = ArtifactConfig::new(
            Stage::BackendDevelopment,
            "api",
            ArtifactType::Code,
            ArtifactFormat::Zip,
        );
        config.apply(
            ArtifactConfigUpdate::new()
                .description("REST API")
                .format(ArtifactFormat::Json),
        );

        assert_eq!(config.name, "api");
        assert_eq!(config.stage, Stage::BackendDevelopment);
        assert_eq!(config.description, "REST API");
        assert_eq!(config.format, ArtifactFormat::Json);
        assert_eq!(config.artifact_type, ArtifactType::Code);
    }
}
