//! File-backed registry of stage deliverables.
//!
//! Layout under the storage directory:
//!
//! ```text
//! <stage>/<name>[_v<version>]                primary file, written by the caller
//! <stage>/<name>[_v<version>]_files/<file>   auxiliary files
//! <stage>/<name>[_v<version>]_metadata.json  metadata sidecar
//! _archive/<YYYY-MM-DD>/<stage>/<name>/      archived copies
//! ```

use super::types::{
    ArtifactConfig, ArtifactConfigUpdate, ArtifactFormat, ArtifactMetadata, ArtifactStatistics,
    FileContent, ValidationResult,
};
use crate::core::Stage;
use crate::errors::{FlowError, Result};
use crate::utils::{date_stamp, now_utc};
use dashmap::DashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::fs;
use tracing::{debug, info, warn};

static PLAIN_FILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("file name pattern is valid"));

const ARCHIVE_DIR: &str = "_archive";

/// Configuration for the artifact store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactStoreConfig {
    /// Root directory of the store.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
    /// Append `_v<version>` to artifact paths.
    #[serde(default = "default_true")]
    pub enable_versioning: bool,
    /// Allow archiving.
    #[serde(default = "default_true")]
    pub enable_archive: bool,
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("./artifacts")
}

fn default_true() -> bool {
    true
}

impl Default for ArtifactStoreConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            enable_versioning: true,
            enable_archive: true,
        }
    }
}

impl ArtifactStoreConfig {
    /// Creates a config rooted at `storage_dir`.
    #[must_use]
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            ..Self::default()
        }
    }

    /// Enables or disables versioned paths.
    #[must_use]
    pub fn with_versioning(mut self, enabled: bool) -> Self {
        self.enable_versioning = enabled;
        self
    }

    /// Enables or disables archiving.
    #[must_use]
    pub fn with_archive(mut self, enabled: bool) -> Self {
        self.enable_archive = enabled;
        self
    }
}

/// Versioned, file-backed registry of stage deliverables.
///
/// The registry itself is in memory; only the files and sidecars live on
/// disk.
#[derive(Debug)]
pub struct DeliveryArtifactsManager {
    config: ArtifactStoreConfig,
    registry: DashMap<(Stage, String), ArtifactMetadata>,
}

impl DeliveryArtifactsManager {
    /// Creates the storage directory and one subdirectory per artifact stage.
    pub async fn new(config: ArtifactStoreConfig) -> Result<Self> {
        for stage in Stage::artifact_stages() {
            fs::create_dir_all(config.storage_dir.join(stage.as_str())).await?;
        }
        info!(storage_dir = %config.storage_dir.display(), "Artifact storage initialized");

        Ok(Self {
            config,
            registry: DashMap::new(),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub fn config(&self) -> &ArtifactStoreConfig {
        &self.config
    }

    /// Registers an artifact, writes its auxiliary files and its sidecar.
    ///
    /// Re-registering the same stage and name replaces the registry entry.
    /// Returns the primary file path; the caller writes the primary file
    /// itself, for example through [`write_primary`](Self::write_primary).
    pub async fn register_artifact(
        &self,
        config: ArtifactConfig,
        files: &[FileContent],
    ) -> Result<PathBuf> {
        check_file_name(&config.name)?;
        check_file_name(&config.version)?;
        for file in files {
            check_file_name(&file.name)?;
        }

        info!(stage = %config.stage, name = %config.name, "Registering artifact");

        let stage_dir = self.config.storage_dir.join(config.stage.as_str());
        fs::create_dir_all(&stage_dir).await?;

        let path = if self.config.enable_versioning {
            stage_dir.join(format!("{}_v{}", config.name, config.version))
        } else {
            stage_dir.join(&config.name)
        };

        let files: BTreeMap<&str, &str> = files
            .iter()
            .map(|f| (f.name.as_str(), f.content.as_str()))
            .collect();
        let mut size = 0u64;
        if !files.is_empty() {
            let files_dir = with_suffix(&path, "_files");
            fs::create_dir_all(&files_dir).await?;
            for (name, content) in &files {
                fs::write(files_dir.join(name), content).await?;
                size += content.len() as u64;
            }
        }

        let now = now_utc();
        let metadata = ArtifactMetadata {
            config,
            path: path.clone(),
            size,
            checksum: checksum(files.iter().map(|(n, c)| (*n, c.as_bytes()))),
            created_at: now,
            updated_at: now,
        };
        write_sidecar(&metadata).await?;

        let key = (metadata.config.stage, metadata.config.name.clone());
        self.registry.insert(key, metadata);

        info!(path = %path.display(), size, "Artifact registered");
        Ok(path)
    }

    /// Registers an artifact under an explicit version, overriding the
    /// version carried by `config`.
    pub async fn register_artifact_version(
        &self,
        mut config: ArtifactConfig,
        files: &[FileContent],
        version: impl Into<String>,
    ) -> Result<PathBuf> {
        config.version = version.into();
        self.register_artifact(config, files).await
    }

    /// Writes the primary file of a registered artifact.
    pub async fn write_primary(
        &self,
        stage: Stage,
        name: &str,
        contents: impl AsRef<[u8]>,
    ) -> Result<PathBuf> {
        let path = self.entry(stage, name)?.path;
        fs::write(&path, contents).await?;
        debug!(path = %path.display(), "Primary artifact file written");
        Ok(path)
    }

    /// Returns the metadata of an artifact.
    ///
    /// Returns `None` when the artifact is unregistered, and also, with a
    /// warning, when its primary file is missing on disk.
    pub async fn get_artifact(&self, stage: Stage, name: &str) -> Option<ArtifactMetadata> {
        let metadata = self.lookup(stage, name)?;

        if !exists(&metadata.path).await {
            warn!(path = %metadata.path.display(), "Artifact file not found");
            return None;
        }

        Some(metadata)
    }

    /// Merges `update` into the artifact's config and rewrites its sidecar.
    pub async fn update_artifact(
        &self,
        stage: Stage,
        name: &str,
        update: ArtifactConfigUpdate,
    ) -> Result<ArtifactMetadata> {
        let mut metadata = self.entry(stage, name)?;
        info!(stage = %stage, name, "Updating artifact");

        metadata.config.apply(update);
        metadata.updated_at = now_utc();
        write_sidecar(&metadata).await?;

        self.registry
            .insert((stage, name.to_string()), metadata.clone());

        info!(path = %metadata.path.display(), "Artifact updated");
        Ok(metadata)
    }

    /// Checks an artifact on disk.
    ///
    /// Checks run in order: registry entry, primary file, sidecar, then the
    /// primary file's JSON syntax for `json` artifacts. A missing registry
    /// entry or sidecar ends the check early. Auxiliary files that no
    /// longer match the recorded checksum produce a warning.
    pub async fn validate_artifact(&self, stage: Stage, name: &str) -> ValidationResult {
        let Some(metadata) = self.lookup(stage, name) else {
            return ValidationResult::from_findings(
                vec![format!("Artifact not found: {stage}/{name}")],
                Vec::new(),
            );
        };

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let primary_exists = exists(&metadata.path).await;
        if !primary_exists {
            errors.push(format!(
                "Artifact file not found: {}",
                metadata.path.display()
            ));
        }

        let sidecar = with_suffix(&metadata.path, "_metadata.json");
        if !exists(&sidecar).await {
            errors.push(format!("Metadata file not found: {}", sidecar.display()));
            return ValidationResult::from_findings(errors, warnings);
        }

        if primary_exists && metadata.config.format == ArtifactFormat::Json {
            let parsed = match fs::read(&metadata.path).await {
                Ok(bytes) => serde_json::from_slice::<serde_json::Value>(&bytes).is_ok(),
                Err(_) => false,
            };
            if !parsed {
                errors.push(format!(
                    "Invalid JSON format: {}",
                    metadata.path.display()
                ));
            }
        }

        match current_checksum(&metadata.path).await {
            Ok(actual) if actual != metadata.checksum => warnings.push(format!(
                "Auxiliary files changed since registration: {}",
                metadata.path.display()
            )),
            Ok(_) => {}
            Err(err) => warnings.push(format!("Could not read auxiliary files: {err}")),
        }

        let result = ValidationResult::from_findings(errors, warnings);
        info!(stage = %stage, name, valid = result.is_valid, "Artifact validated");
        result
    }

    /// Copies the primary file and sidecar into
    /// `_archive/<YYYY-MM-DD>/<stage>/<name>/` and returns that directory.
    pub async fn archive_artifact(&self, stage: Stage, name: &str) -> Result<PathBuf> {
        if !self.config.enable_archive {
            return Err(FlowError::ArchivingDisabled);
        }

        let metadata = self.entry(stage, name)?;
        let archive_dir = self
            .config
            .storage_dir
            .join(ARCHIVE_DIR)
            .join(date_stamp(&now_utc()))
            .join(stage.as_str())
            .join(name);
        fs::create_dir_all(&archive_dir).await?;

        let sidecar = with_suffix(&metadata.path, "_metadata.json");
        for source in [&metadata.path, &sidecar] {
            let Some(file_name) = source.file_name() else {
                continue;
            };
            if exists(source).await {
                fs::copy(source, archive_dir.join(file_name)).await?;
            }
        }

        info!(path = %archive_dir.display(), "Artifact archived");
        Ok(archive_dir)
    }

    /// Lists registered artifacts, optionally filtered by stage, ordered by
    /// stage and name.
    #[must_use]
    pub fn list_artifacts(&self, stage: Option<Stage>) -> Vec<ArtifactMetadata> {
        let mut artifacts: Vec<ArtifactMetadata> = self
            .registry
            .iter()
            .filter(|entry| stage.map_or(true, |s| entry.key().0 == s))
            .map(|entry| entry.value().clone())
            .collect();
        artifacts.sort_by(|a, b| {
            (a.config.stage, &a.config.name).cmp(&(b.config.stage, &b.config.name))
        });
        artifacts
    }

    /// Returns registry counts.
    #[must_use]
    pub fn get_statistics(&self) -> ArtifactStatistics {
        let mut stats = ArtifactStatistics::default();
        for entry in &self.registry {
            stats.total += 1;
            stats.total_size += entry.size;
            *stats.by_stage.entry(entry.config.stage).or_insert(0) += 1;
        }
        stats
    }

    fn lookup(&self, stage: Stage, name: &str) -> Option<ArtifactMetadata> {
        self.registry
            .get(&(stage, name.to_string()))
            .map(|entry| entry.value().clone())
    }

    fn entry(&self, stage: Stage, name: &str) -> Result<ArtifactMetadata> {
        self.lookup(stage, name)
            .ok_or_else(|| FlowError::artifact_not_found(stage, name))
    }
}

fn check_file_name(name: &str) -> Result<()> {
    if !PLAIN_FILE_NAME.is_match(name) || name == "." || name == ".." {
        return Err(FlowError::InvalidArtifactName(name.to_string()));
    }
    Ok(())
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw = OsString::from(path.as_os_str());
    raw.push(suffix);
    PathBuf::from(raw)
}

async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

async fn write_sidecar(metadata: &ArtifactMetadata) -> Result<()> {
    let json = serde_json::to_string_pretty(metadata)?;
    fs::write(with_suffix(&metadata.path, "_metadata.json"), json).await?;
    Ok(())
}

/// SHA-256 over `(name, content)` pairs in name order.
fn checksum<'a>(files: impl IntoIterator<Item = (&'a str, &'a [u8])>) -> String {
    let mut hasher = Sha256::new();
    let mut any = false;
    for (name, content) in files {
        any = true;
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(content);
    }
    if any {
        hex::encode(hasher.finalize())
    } else {
        String::new()
    }
}

async fn current_checksum(path: &Path) -> std::io::Result<String> {
    let files_dir = with_suffix(path, "_files");
    if !exists(&files_dir).await {
        return Ok(String::new());
    }

    let mut files = BTreeMap::new();
    let mut entries = fs::read_dir(&files_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            let name = entry.file_name().to_string_lossy().into_owned();
            files.insert(name, fs::read(entry.path()).await?);
        }
    }

    Ok(checksum(
        files.iter().map(|(n, c)| (n.as_str(), c.as_slice())),
    ))
}
