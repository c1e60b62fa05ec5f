//! Cross-stage progress roll-up and risk classification.

use super::types::{
    Milestone, MilestoneState, RiskLevel, StageProgress, StageProgressUpdate, TrackerProgress,
};
use crate::context::FlowContext;
use crate::core::{ReportFormat, Stage, StageStatus};
use crate::errors::Result;
use crate::utils::{format_date, iso_timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Thresholds used to classify lagging stages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// In-progress stages below this percentage raise the risk to high.
    #[serde(default = "default_warning_threshold")]
    pub warning_threshold: f64,
    /// In-progress stages below this percentage raise the risk to critical.
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: f64,
}

fn default_warning_threshold() -> f64 {
    80.0
}

fn default_critical_threshold() -> f64 {
    60.0
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            warning_threshold: default_warning_threshold(),
            critical_threshold: default_critical_threshold(),
        }
    }
}

impl TrackerConfig {
    /// Creates a new tracker config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets both thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, warning: f64, critical: f64) -> Self {
        self.warning_threshold = warning;
        self.critical_threshold = critical;
        self
    }
}

/// Rolls stage progress up into overall completion, risk and milestones.
///
/// Reads the project from the shared context but keeps its own
/// [`StageProgress`] records there, separate from the coordinator's ledger.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    ctx: FlowContext,
    milestones: Vec<Milestone>,
    config: TrackerConfig,
}

impl ProgressTracker {
    /// Creates a tracker over a shared context.
    #[must_use]
    pub fn new(ctx: FlowContext, milestones: Vec<Milestone>, config: TrackerConfig) -> Self {
        Self {
            ctx,
            milestones,
            config,
        }
    }

    /// Merges `update` into the stage's progress record and returns the result.
    pub fn update_stage_progress(&self, stage: Stage, update: StageProgressUpdate) -> StageProgress {
        let mut progress = self.ctx.stage_progress(stage);
        progress.apply(update);
        self.ctx.put_stage_progress(progress.clone());

        info!(stage = %stage, progress = progress.progress, status = %progress.status, "Stage progress updated");
        progress
    }

    /// Returns the progress record of a stage.
    #[must_use]
    pub fn stage_progress(&self, stage: Stage) -> StageProgress {
        self.ctx.stage_progress(stage)
    }

    fn stage_progresses(&self) -> Vec<StageProgress> {
        Stage::ALL
            .into_iter()
            .map(|stage| self.ctx.stage_progress(stage))
            .collect()
    }

    /// Computes the overall roll-up.
    #[must_use]
    pub fn get_progress(&self) -> TrackerProgress {
        let progresses = self.stage_progresses();

        let total: f64 = progresses
            .iter()
            .map(|p| {
                if p.status == StageStatus::Completed {
                    100.0
                } else {
                    p.progress
                }
            })
            .sum();

        let with_status = |status: StageStatus| -> Vec<Stage> {
            progresses
                .iter()
                .filter(|p| p.status == status)
                .map(|p| p.stage)
                .collect()
        };
        let completed_stages = with_status(StageStatus::Completed);
        let in_progress_stages = with_status(StageStatus::InProgress);

        let milestones_status = self
            .milestones
            .iter()
            .map(|m| (m.name.clone(), milestone_state(m, &completed_stages)))
            .collect();

        #[allow(clippy::cast_precision_loss)]
        let overall_progress = (total / Stage::COUNT as f64).round();

        TrackerProgress {
            current_stage: in_progress_stages.first().copied(),
            overall_progress,
            completed_stages,
            in_progress_stages,
            milestones_status,
            risk_level: self.risk_level(&progresses),
            recommendations: self.recommendations(&progresses),
        }
    }

    fn risk_level(&self, progresses: &[StageProgress]) -> RiskLevel {
        let active: Vec<&StageProgress> = progresses
            .iter()
            .filter(|p| p.status == StageStatus::InProgress)
            .collect();

        if active.is_empty() {
            RiskLevel::Low
        } else if active.iter().any(|p| p.progress < self.config.critical_threshold) {
            RiskLevel::Critical
        } else if active.iter().any(|p| p.progress < self.config.warning_threshold) {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        }
    }

    fn recommendations(&self, progresses: &[StageProgress]) -> Vec<String> {
        progresses
            .iter()
            .filter(|p| p.status == StageStatus::InProgress)
            .filter_map(|p| {
                if p.progress < self.config.critical_threshold {
                    Some(format!(
                        "Stage {} is critically behind ({}%), intervene immediately",
                        p.stage, p.progress
                    ))
                } else if p.progress < self.config.warning_threshold {
                    Some(format!(
                        "Stage {} is behind schedule ({}%), keep a close eye on it",
                        p.stage, p.progress
                    ))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Returns one line per in-progress stage below a threshold.
    #[must_use]
    pub fn generate_recommendations(&self) -> Vec<String> {
        self.recommendations(&self.stage_progresses())
    }

    /// Returns the milestones with their derived completion flag.
    #[must_use]
    pub fn milestones(&self) -> Vec<Milestone> {
        let completed: Vec<Stage> = self
            .stage_progresses()
            .into_iter()
            .filter(|p| p.status == StageStatus::Completed)
            .map(|p| p.stage)
            .collect();

        self.milestones
            .iter()
            .map(|m| Milestone {
                completed: milestone_state(m, &completed) == MilestoneState::Completed,
                ..m.clone()
            })
            .collect()
    }

    /// Renders the progress report.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::Serialization` if the JSON report cannot be encoded.
    pub fn generate_report(&self, format: ReportFormat) -> Result<String> {
        let progress = self.get_progress();
        let project = self.ctx.project();

        match format {
            ReportFormat::Json => {
                let milestones: Vec<serde_json::Value> = self
                    .milestones()
                    .into_iter()
                    .map(|m| {
                        let status = progress.milestones_status.get(&m.name).copied();
                        serde_json::json!({
                            "name": m.name,
                            "targetDate": m.target_date,
                            "stages": m.stages,
                            "completed": m.completed,
                            "status": status,
                        })
                    })
                    .collect();

                let report = serde_json::json!({
                    "project": {
                        "name": project.as_ref().map(|p| p.name.clone()),
                        "startDate": project.as_ref().and_then(|p| p.start_date),
                        "targetEndDate": project.as_ref().and_then(|p| p.target_end_date),
                    },
                    "progress": progress,
                    "milestones": milestones,
                    "generatedAt": iso_timestamp(),
                });
                Ok(serde_json::to_string_pretty(&report)?)
            }
            ReportFormat::Markdown => Ok(self.render_markdown(&progress, project.map(|p| p.name))),
        }
    }

    fn render_markdown(&self, progress: &TrackerProgress, project_name: Option<String>) -> String {
        let project = project_name.as_deref().unwrap_or("unknown");
        let current = progress
            .current_stage
            .map_or_else(|| "none".to_string(), |s| s.to_string());
        let risk = progress.risk_level.to_string().to_uppercase();

        let mut md = String::from("# Project Progress Report\n\n");
        md.push_str(&format!("**Project**: {project}\n\n"));
        md.push_str(&format!("**Overall progress**: {}%\n\n", progress.overall_progress));
        md.push_str(&format!("**Current stage**: {current}\n\n"));
        md.push_str(&format!("**Risk level**: {risk}\n\n"));

        md.push_str("## Milestones\n\n");
        for milestone in &self.milestones {
            let done = progress.milestones_status.get(&milestone.name) == Some(&MilestoneState::Completed);
            let marker = if done { "✅" } else { "⏳" };
            md.push_str(&format!(
                "{marker} {} ({})\n",
                milestone.name,
                format_date(&milestone.target_date)
            ));
        }

        if !progress.recommendations.is_empty() {
            md.push_str("\n## Recommendations\n\n");
            for rec in &progress.recommendations {
                md.push_str(&format!("- {rec}\n"));
            }
        }

        md
    }
}

fn milestone_state(milestone: &Milestone, completed: &[Stage]) -> MilestoneState {
    if milestone.stages.iter().all(|s| completed.contains(s)) {
        MilestoneState::Completed
    } else {
        MilestoneState::Pending
    }
}

/// Groups milestone names by derived state.
#[must_use]
pub fn milestones_by_state(progress: &TrackerProgress) -> BTreeMap<MilestoneState, Vec<String>> {
    let mut grouped: BTreeMap<MilestoneState, Vec<String>> = BTreeMap::new();
    for (name, state) in &progress.milestones_status {
        grouped.entry(*state).or_default().push(name.clone());
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ProjectContext;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn tracker() -> ProgressTracker {
        let milestones = vec![
            Milestone::new(
                "Requirements signed off",
                date(2, 1),
                vec![Stage::RequirementsProposal, Stage::RequirementsAnalysis],
            ),
            Milestone::new("Design frozen", date(3, 1), vec![Stage::ProductDesign, Stage::UiDesign]),
        ];
        ProgressTracker::new(FlowContext::new(), milestones, TrackerConfig::default())
    }

    fn set(tracker: &ProgressTracker, stage: Stage, status: StageStatus, progress: f64) {
        tracker.update_stage_progress(
            stage,
            StageProgressUpdate::new().status(status).progress(progress),
        );
    }

    #[test]
    fn test_empty_tracker() {
        let progress = tracker().get_progress();
        assert_eq!(progress.overall_progress, 0.0);
        assert_eq!(progress.current_stage, None);
        assert_eq!(progress.risk_level, RiskLevel::Low);
        assert!(progress.recommendations.is_empty());
    }

    #[test]
    fn test_overall_progress_formula() {
        let t = tracker();
        set(&t, Stage::RequirementsProposal, StageStatus::Completed, 10.0);
        set(&t, Stage::RequirementsAnalysis, StageStatus::InProgress, 30.0);

        // (100 + 30) / 13 = 10.0
        assert_eq!(t.get_progress().overall_progress, 10.0);
    }

    #[test]
    fn test_overall_progress_rounds() {
        let t = tracker();
        set(&t, Stage::RequirementsProposal, StageStatus::Completed, 0.0);
        // 100 / 13 = 7.69
        assert_eq!(t.get_progress().overall_progress, 8.0);
    }

    #[test]
    fn test_risk_levels() {
        let t = tracker();
        set(&t, Stage::ProductDesign, StageStatus::InProgress, 90.0);
        assert_eq!(t.get_progress().risk_level, RiskLevel::Medium);

        set(&t, Stage::ProductDesign, StageStatus::InProgress, 70.0);
        assert_eq!(t.get_progress().risk_level, RiskLevel::High);

        set(&t, Stage::ProductDesign, StageStatus::InProgress, 50.0);
        assert_eq!(t.get_progress().risk_level, RiskLevel::Critical);

        set(&t, Stage::ProductDesign, StageStatus::Completed, 100.0);
        assert_eq!(t.get_progress().risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_recommendations() {
        let t = tracker();
        set(&t, Stage::FrontendDevelopment, StageStatus::InProgress, 50.0);
        set(&t, Stage::BackendDevelopment, StageStatus::InProgress, 70.0);
        set(&t, Stage::UiDesign, StageStatus::Pending, 10.0);

        let recs = t.generate_recommendations();
        assert_eq!(recs.len(), 2);
        assert!(recs[0].contains("frontend-development"));
        assert!(recs[0].contains("critically"));
        assert!(recs[1].contains("backend-development"));
        assert!(recs[1].contains("70%"));
    }

    #[test]
    fn test_milestones_derived() {
        let t = tracker();
        set(&t, Stage::RequirementsProposal, StageStatus::Completed, 100.0);
        set(&t, Stage::RequirementsAnalysis, StageStatus::Completed, 100.0);
        set(&t, Stage::ProductDesign, StageStatus::Completed, 100.0);

        let progress = t.get_progress();
        assert_eq!(
            progress.milestones_status.get("Requirements signed off"),
            Some(&MilestoneState::Completed)
        );
        assert_eq!(progress.milestones_status.get("Design frozen"), Some(&MilestoneState::Pending));

        let milestones = t.milestones();
        assert!(milestones[0].completed);
        assert!(!milestones[1].completed);

        let grouped = milestones_by_state(&progress);
        assert_eq!(grouped[&MilestoneState::Completed], vec!["Requirements signed off".to_string()]);
    }

    #[test]
    fn test_markdown_report() {
        let ctx = FlowContext::new();
        ctx.set_project(ProjectContext::new("Demo", date(1, 1)));
        let t = ProgressTracker::new(
            ctx,
            vec![Milestone::new("Kickoff", date(1, 15), vec![Stage::RequirementsProposal])],
            TrackerConfig::default(),
        );
        set(&t, Stage::RequirementsProposal, StageStatus::Completed, 100.0);
        set(&t, Stage::RequirementsAnalysis, StageStatus::InProgress, 20.0);

        let md = t.generate_report(ReportFormat::Markdown).unwrap();
        assert!(md.starts_with("# Project Progress Report\n\n**Project**: Demo\n\n"));
        assert!(md.contains("**Risk level**: CRITICAL"));
        assert!(md.contains("✅ Kickoff (2024-01-15)"));
        assert!(md.contains("## Recommendations"));
    }

    #[test]
    fn test_markdown_omits_empty_recommendations() {
        let t = tracker();
        let md = t.generate_report(ReportFormat::Markdown).unwrap();
        assert!(md.contains("⏳ Design frozen (2024-03-01)"));
        assert!(!md.contains("## Recommendations"));
    }

    #[test]
    fn test_json_report() {
        let t = tracker();
        set(&t, Stage::RequirementsProposal, StageStatus::InProgress, 85.0);

        let json: serde_json::Value =
            serde_json::from_str(&t.generate_report(ReportFormat::Json).unwrap()).unwrap();
        assert_eq!(json["progress"]["currentStage"], "requirements-proposal");
        assert_eq!(json["progress"]["riskLevel"], "medium");
        assert_eq!(json["milestones"].as_array().unwrap().len(), 2);
        assert!(json["project"]["name"].is_null());
    }
}
