//! Collects per-stage feedback and exports summaries.

use super::classify::classify;
use super::types::{
    ExportFormat, Feedback, FeedbackAction, FeedbackCategory, FeedbackInput, FeedbackPriority,
    FeedbackState, FeedbackSummary,
};
use crate::core::Stage;
use crate::errors::{FlowError, Result};
use crate::utils::{epoch_millis, now_utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;
use uuid::Uuid;

const CSV_HEADER: &str = "id,stage,source,category,priority,content,author,createdAt,resolvedAt";

/// Configuration for the feedback collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Root directory for feedback files and exports.
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
    /// Classify feedback by keyword when no category is given.
    #[serde(default = "default_auto_classify")]
    pub auto_classify: bool,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./feedback")
}

fn default_auto_classify() -> bool {
    true
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            auto_classify: default_auto_classify(),
        }
    }
}

impl FeedbackConfig {
    /// Creates a config rooted at `storage_path`.
    #[must_use]
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
            ..Self::default()
        }
    }

    /// Enables or disables keyword classification.
    #[must_use]
    pub fn with_auto_classify(mut self, enabled: bool) -> Self {
        self.auto_classify = enabled;
        self
    }
}

/// Records feedback per stage and persists each entry as JSON.
#[derive(Debug)]
pub struct FeedbackCollector {
    config: FeedbackConfig,
    entries: RwLock<BTreeMap<Stage, Vec<Feedback>>>,
}

impl FeedbackCollector {
    /// Creates the storage directory.
    pub async fn new(config: FeedbackConfig) -> Result<Self> {
        fs::create_dir_all(&config.storage_path).await?;
        info!(storage_path = %config.storage_path.display(), "Feedback storage initialized");

        Ok(Self {
            config,
            entries: RwLock::new(BTreeMap::new()),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &FeedbackConfig {
        &self.config
    }

    /// Records feedback for a stage and returns its id.
    pub async fn collect(&self, stage: Stage, input: FeedbackInput) -> Result<String> {
        let now = now_utc();
        let suffix = Uuid::new_v4().simple().to_string();
        let id = format!("FB_{}_{}", epoch_millis(&now), &suffix[..6]);

        let category = match input.category {
            Some(category) => Some(category),
            None if self.config.auto_classify => {
                let category = classify(&input.content);
                info!(id = %id, category = %category, "Feedback auto-classified");
                Some(category)
            }
            None => None,
        };

        let feedback = Feedback {
            id: id.clone(),
            stage,
            source: input.source,
            category,
            priority: input.priority,
            content: input.content,
            author: input.author,
            created_at: now,
            resolved_at: None,
            rejected_at: None,
            deferred_at: None,
        };

        self.save(&feedback).await?;
        self.entries.write().entry(stage).or_default().push(feedback);

        info!(id = %id, stage = %stage, "Feedback collected");
        Ok(id)
    }

    /// Stamps the action's timestamp on a feedback entry and persists it.
    pub async fn process_feedback(&self, id: &str, action: FeedbackAction) -> Result<Feedback> {
        let updated = {
            let mut entries = self.entries.write();
            let feedback = entries
                .values_mut()
                .flat_map(|list| list.iter_mut())
                .find(|f| f.id == id)
                .ok_or_else(|| FlowError::FeedbackNotFound(id.to_string()))?;

            let now = now_utc();
            match action {
                FeedbackAction::Resolve => feedback.resolved_at = Some(now),
                FeedbackAction::Reject => feedback.rejected_at = Some(now),
                FeedbackAction::Defer => feedback.deferred_at = Some(now),
            }
            feedback.clone()
        };

        self.save(&updated).await?;
        info!(id, action = ?action, "Feedback processed");
        Ok(updated)
    }

    /// Counts feedback by state, category, priority and stage.
    #[must_use]
    pub fn get_summary(&self) -> FeedbackSummary {
        let mut summary = FeedbackSummary {
            by_category: FeedbackCategory::ALL.iter().map(|c| (*c, 0)).collect(),
            by_priority: FeedbackPriority::ALL.iter().map(|p| (*p, 0)).collect(),
            ..FeedbackSummary::default()
        };

        for (stage, list) in self.entries.read().iter() {
            for feedback in list {
                summary.total += 1;
                match feedback.state() {
                    FeedbackState::Pending => summary.pending += 1,
                    FeedbackState::Processing => summary.processing += 1,
                    FeedbackState::Completed => summary.completed += 1,
                }
                if let Some(category) = feedback.category {
                    *summary.by_category.entry(category).or_insert(0) += 1;
                }
                if let Some(priority) = feedback.priority {
                    *summary.by_priority.entry(priority).or_insert(0) += 1;
                }
                *summary.by_stage.entry(*stage).or_insert(0) += 1;
            }
        }

        summary
    }

    /// Returns a stage's feedback in collection order.
    #[must_use]
    pub fn get_feedback_by_stage(&self, stage: Stage) -> Vec<Feedback> {
        self.entries.read().get(&stage).cloned().unwrap_or_default()
    }

    /// Returns every entry no action was taken on.
    #[must_use]
    pub fn get_pending_feedback(&self) -> Vec<Feedback> {
        self.entries
            .read()
            .values()
            .flatten()
            .filter(|f| f.state() == FeedbackState::Pending)
            .cloned()
            .collect()
    }

    /// Writes `feedback-summary.{json,csv}` and returns its path.
    ///
    /// JSON holds the summary counts; CSV holds one row per entry.
    pub async fn export_data(&self, format: ExportFormat) -> Result<PathBuf> {
        let path = self
            .config
            .storage_path
            .join(format!("feedback-summary.{}", format.extension()));

        let body = match format {
            ExportFormat::Json => serde_json::to_string_pretty(&self.get_summary())?,
            ExportFormat::Csv => self.render_csv(),
        };
        fs::write(&path, body).await?;

        info!(path = %path.display(), "Feedback data exported");
        Ok(path)
    }

    fn render_csv(&self) -> String {
        let entries = self.entries.read();
        let rows = entries.values().flatten().map(|f| {
            [
                f.id.clone(),
                f.stage.to_string(),
                serde_plain(&f.source),
                f.category.map(|c| c.as_str().to_string()).unwrap_or_default(),
                f.priority.map(|p| p.as_str().to_string()).unwrap_or_default(),
                f.content.clone(),
                f.author.clone().unwrap_or_default(),
                f.created_at.to_rfc3339(),
                f.resolved_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            ]
            .iter()
            .map(|field| csv_field(field))
            .collect::<Vec<_>>()
            .join(",")
        });

        std::iter::once(CSV_HEADER.to_string())
            .chain(rows)
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn save(&self, feedback: &Feedback) -> Result<()> {
        let dir = self.config.storage_path.join(feedback.stage.as_str());
        fs::create_dir_all(&dir).await?;
        write_json(&dir.join(format!("{}.json", feedback.id)), feedback).await
    }
}

async fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(value)?).await?;
    Ok(())
}

/// Serializes a unit enum variant to its bare wire name.
fn serde_plain(value: &impl Serialize) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

/// Quotes a CSV field when it holds a delimiter, quote or line break.
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
