//! Progress projection and the final flow report.

use crate::context::ProjectContext;
use crate::core::{Stage, StageStatus};
use crate::utils::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metric values recorded per stage, last write wins.
pub type QualityMetrics = BTreeMap<Stage, BTreeMap<String, f64>>;

/// Status line of one stage in a [`ProgressInfo`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageStatusInfo {
    /// Current status.
    pub status: StageStatus,
    /// Share of the stage's thresholds met, 0 to 100.
    pub progress: f64,
    /// Failure retries consumed.
    pub review_count: u32,
}

/// The coordinator's view of flow progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressInfo {
    /// The active stage, if any.
    pub current_stage: Option<Stage>,
    /// Completed stages as a percentage of all stages.
    pub overall_progress: f64,
    /// Status line per stage, in flow order.
    pub stage_statuses: BTreeMap<Stage, StageStatusInfo>,
    /// Recorded metrics of every stage that has any.
    pub quality_metrics: QualityMetrics,
}

/// The JSON document written when a flow completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowReport {
    /// The project.
    pub project: Option<ProjectContext>,
    /// Progress at completion.
    pub progress: ProgressInfo,
    /// Status line per stage.
    pub stages: BTreeMap<Stage, StageStatusInfo>,
    /// Recorded metrics.
    pub quality_metrics: QualityMetrics,
    /// Completion time.
    pub completed_at: Timestamp,
}

/// Percentage of `stage`'s thresholds whose recorded value meets them.
///
/// Missing values count as 0. Stages without thresholds score 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn threshold_pass_ratio(stage: Stage, recorded: Option<&BTreeMap<String, f64>>) -> f64 {
    let config = stage.config();
    let thresholds = config.quality_thresholds;
    if thresholds.is_empty() {
        return 0.0;
    }

    let met = thresholds
        .iter()
        .filter(|(metric, threshold)| {
            let actual = recorded
                .and_then(|values| values.get(*metric))
                .copied()
                .unwrap_or(0.0);
            actual >= *threshold
        })
        .count();

    met as f64 / thresholds.len() as f64 * 100.0
}
