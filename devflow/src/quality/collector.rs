//! Continuous quality scoring against per-stage thresholds.
//!
//! This score is a weighted ratio of recorded values to their thresholds.
//! It is deliberately separate from the coordinator's binary pass-count
//! progress; the two can disagree for the same stage.

use super::grade::Grade;
use crate::core::{default_thresholds, ReportFormat, Stage};
use crate::errors::Result;
use crate::utils::{iso_timestamp, now_utc, Timestamp};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Thresholds keyed by stage, then metric name.
pub type ThresholdTable = BTreeMap<Stage, BTreeMap<String, f64>>;

/// Configuration for the quality collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Log an alert whenever a recorded metric misses its threshold.
    #[serde(default = "default_enable_alerts")]
    pub enable_alerts: bool,
}

fn default_enable_alerts() -> bool {
    true
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            enable_alerts: default_enable_alerts(),
        }
    }
}

/// One recorded metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricValue {
    /// The stage.
    pub stage: Stage,
    /// Metric name.
    pub metric: String,
    /// Recorded value.
    pub value: f64,
    /// Threshold at recording time.
    pub threshold: f64,
    /// `value >= threshold`.
    pub passed: bool,
    /// When the value was recorded.
    pub timestamp: Timestamp,
}

/// Recorded metrics and score of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageMetrics {
    /// The stage.
    pub stage: Stage,
    /// Last value per metric.
    pub metrics: BTreeMap<String, MetricValue>,
    /// `Σ values / Σ thresholds × 100`.
    pub overall_score: f64,
}

impl StageMetrics {
    fn new(stage: Stage) -> Self {
        Self {
            stage,
            metrics: BTreeMap::new(),
            overall_score: 0.0,
        }
    }

    fn recompute_score(&mut self) {
        let (values, thresholds) = self
            .metrics
            .values()
            .fold((0.0, 0.0), |(v, t), m| (v + m.value, t + m.threshold));
        self.overall_score = if thresholds > 0.0 {
            values / thresholds * 100.0
        } else {
            0.0
        };
    }
}

/// Scores across all stages that have recorded metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallMetrics {
    /// Unweighted mean of the stage scores.
    pub overall_score: f64,
    /// Score per scored stage.
    pub stage_scores: BTreeMap<Stage, f64>,
}

/// A metric currently below its threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdAlert {
    /// The stage.
    pub stage: Stage,
    /// Metric name.
    pub metric: String,
    /// Recorded value.
    pub value: f64,
    /// Threshold it missed.
    pub threshold: f64,
}

/// Records metric values and scores stages against their thresholds.
#[derive(Debug)]
pub struct QualityMetricsCollector {
    thresholds: ThresholdTable,
    metrics: RwLock<BTreeMap<Stage, StageMetrics>>,
    config: QualityConfig,
}

impl QualityMetricsCollector {
    /// Creates a collector with externally supplied thresholds.
    #[must_use]
    pub fn new(thresholds: ThresholdTable, config: QualityConfig) -> Self {
        info!(stages = thresholds.len(), "Quality thresholds initialized");
        Self {
            thresholds,
            metrics: RwLock::new(BTreeMap::new()),
            config,
        }
    }

    /// Creates a collector using the registry's default thresholds.
    #[must_use]
    pub fn with_stage_defaults(config: QualityConfig) -> Self {
        Self::new(default_thresholds(), config)
    }

    /// Returns the configured threshold for a metric.
    #[must_use]
    pub fn threshold(&self, stage: Stage, metric: &str) -> Option<f64> {
        self.thresholds.get(&stage).and_then(|t| t.get(metric)).copied()
    }

    /// Records a metric value.
    ///
    /// Metrics without a configured threshold are dropped with a warning
    /// and `None` is returned.
    pub fn record_metric(&self, stage: Stage, metric: &str, value: f64) -> Option<MetricValue> {
        let Some(threshold) = self.threshold(stage, metric) else {
            warn!(stage = %stage, metric, "No threshold defined for metric");
            return None;
        };

        let recorded = MetricValue {
            stage,
            metric: metric.to_string(),
            value,
            threshold,
            passed: value >= threshold,
            timestamp: now_utc(),
        };

        {
            let mut metrics = self.metrics.write();
            let stage_metrics = metrics
                .entry(stage)
                .or_insert_with(|| StageMetrics::new(stage));
            stage_metrics
                .metrics
                .insert(metric.to_string(), recorded.clone());
            stage_metrics.recompute_score();
        }

        if self.config.enable_alerts && !recorded.passed {
            warn!(stage = %stage, metric, value, threshold, "Quality alert: metric below threshold");
        }
        info!(stage = %stage, metric, value, "Metric recorded");

        Some(recorded)
    }

    /// Returns the metrics of a stage, if any were recorded.
    #[must_use]
    pub fn get_stage_metrics(&self, stage: Stage) -> Option<StageMetrics> {
        self.metrics.read().get(&stage).cloned()
    }

    /// Averages the stage scores over every stage with a recorded metric.
    #[must_use]
    pub fn get_overall_metrics(&self) -> OverallMetrics {
        let metrics = self.metrics.read();
        let stage_scores: BTreeMap<Stage, f64> = metrics
            .iter()
            .map(|(stage, m)| (*stage, m.overall_score))
            .collect();

        #[allow(clippy::cast_precision_loss)]
        let overall_score = if stage_scores.is_empty() {
            0.0
        } else {
            stage_scores.values().sum::<f64>() / stage_scores.len() as f64
        };

        OverallMetrics {
            overall_score,
            stage_scores,
        }
    }

    /// Returns every metric that currently misses its threshold.
    #[must_use]
    pub fn check_thresholds(&self) -> Vec<ThresholdAlert> {
        self.metrics
            .read()
            .values()
            .flat_map(|stage| stage.metrics.values())
            .filter(|m| !m.passed)
            .map(|m| ThresholdAlert {
                stage: m.stage,
                metric: m.metric.clone(),
                value: m.value,
                threshold: m.threshold,
            })
            .collect()
    }

    /// Renders the quality report.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::Serialization` if the JSON report cannot be encoded.
    pub fn get_report(&self, format: ReportFormat) -> Result<String> {
        let overall = self.get_overall_metrics();

        match format {
            ReportFormat::Json => {
                let report = serde_json::json!({
                    "overallScore": overall.overall_score,
                    "stageScores": overall.stage_scores,
                    "generatedAt": iso_timestamp(),
                });
                Ok(serde_json::to_string_pretty(&report)?)
            }
            ReportFormat::Markdown => Ok(self.render_markdown(&overall)),
        }
    }

    fn render_markdown(&self, overall: &OverallMetrics) -> String {
        let mut md = String::from("# Quality Metrics Report\n\n");
        md.push_str(&format!("**Generated at**: {}\n\n", iso_timestamp()));
        md.push_str("## Overall Score\n\n");
        md.push_str(&format!("**Score**: {:.2}/100\n\n", overall.overall_score));
        md.push_str(&format!("**Grade**: {}\n\n", Grade::from_score(overall.overall_score)));
        md.push_str("## Stage Scores\n\n");

        for (stage, score) in &overall.stage_scores {
            md.push_str(&format!("### {stage}\n\n"));
            md.push_str(&format!("- **Score**: {score:.2}/100\n"));
            md.push_str(&format!("- **Grade**: {}\n\n", Grade::from_score(*score)));
        }

        let alerts = self.check_thresholds();
        if !alerts.is_empty() {
            md.push_str("## Alerts\n\n");
            for alert in alerts {
                md.push_str(&format!("### {}.{}\n\n", alert.stage, alert.metric));
                md.push_str(&format!("- **Value**: {}\n", alert.value));
                md.push_str(&format!("- **Threshold**: {}\n", alert.threshold));
                md.push_str("- **Status**: ❌ below threshold\n\n");
            }
        }

        md
    }
}
