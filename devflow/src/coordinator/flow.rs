//! The flow coordinator: the stage state machine.

use super::config::FlowConfig;
use super::policy::{FailureDecision, FailurePolicy, StageOutcome};
use super::report::{threshold_pass_ratio, FlowReport, ProgressInfo, QualityMetrics, StageStatusInfo};
use crate::context::{FailureRecord, FlowContext, ProjectContext, SettledStatus};
use crate::core::{Stage, StageStatus};
use crate::errors::{FlowError, Result, StageError};
use crate::events::{EventSink, FlowEvent, NoOpEventSink};
use crate::utils::now_utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Drives the thirteen stages of a flow.
///
/// Stage status lives in the shared [`FlowContext`], so a
/// [`ReviewOrchestrator`](crate::review::ReviewOrchestrator) or
/// [`ProgressTracker`](crate::progress::ProgressTracker) built over the same
/// context sees every change.
pub struct FlowCoordinator {
    config: FlowConfig,
    policy: FailurePolicy,
    ctx: FlowContext,
    quality_metrics: QualityMetrics,
    sink: Arc<dyn EventSink>,
    started: bool,
    aborted: Option<(Stage, String)>,
}

impl std::fmt::Debug for FlowCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowCoordinator")
            .field("config", &self.config)
            .field("started", &self.started)
            .field("aborted", &self.aborted)
            .field("active_stage", &self.ctx.active_stage())
            .finish_non_exhaustive()
    }
}

impl FlowCoordinator {
    /// Largest forward step an explicit transition may take.
    ///
    /// A step of 2 passes over one stage, leaving it pending.
    pub const MAX_STAGE_GAP: usize = 2;

    /// Creates a coordinator with its own context and no event sink.
    #[must_use]
    pub fn new(config: FlowConfig) -> Self {
        Self {
            policy: FailurePolicy::from(&config),
            config,
            ctx: FlowContext::new(),
            quality_metrics: BTreeMap::new(),
            sink: Arc::new(NoOpEventSink),
            started: false,
            aborted: None,
        }
    }

    /// Uses a shared context instead of a private one.
    #[must_use]
    pub fn with_context(mut self, ctx: FlowContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Returns the shared context.
    #[must_use]
    pub fn context(&self) -> &FlowContext {
        &self.ctx
    }

    /// Returns the active stage, if any.
    #[must_use]
    pub fn current_stage(&self) -> Option<Stage> {
        self.ctx.active_stage()
    }

    /// Returns true once [`start`](Self::start) succeeded.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Returns true after a critical failure terminated the flow.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    /// Starts the flow.
    ///
    /// Every stage is reset to pending with no artifact and no metrics, and
    /// the first stage becomes active.
    pub fn start(&mut self, project: ProjectContext) -> Result<()> {
        self.ensure_not_aborted()?;
        project.validate()?;

        info!(project = %project.name, "Starting flow");
        let name = project.name.clone();

        self.ctx.reset_stages();
        self.ctx.set_project(project);
        self.quality_metrics.clear();
        self.started = true;

        self.emit(&FlowEvent::FlowStarted { project: name });
        self.activate(Stage::first(), None);
        Ok(())
    }

    /// Makes `stage` the active stage, completing the current one.
    ///
    /// From an active stage the step must be 1 to [`MAX_STAGE_GAP`](Self::MAX_STAGE_GAP)
    /// stages forward. With no active stage any stage may be activated,
    /// which is how a stage reset by a failure is driven again.
    pub fn transition_to(&mut self, stage: Stage) -> Result<()> {
        self.ensure_started()?;

        if let Some(current) = self.ctx.active_stage() {
            let gap = stage.index().checked_sub(current.index());
            if !matches!(gap, Some(g) if (1..=Self::MAX_STAGE_GAP).contains(&g)) {
                return Err(FlowError::InvalidTransition {
                    from: current,
                    to: stage,
                });
            }
        }

        self.activate(stage, None);
        Ok(())
    }

    /// Hands off the active stage's artifact.
    pub fn pass_artifact(&mut self, from: Stage, artifact: serde_json::Value) -> Result<()> {
        self.ensure_started()?;

        let current = self.ctx.active_stage();
        if current != Some(from) {
            return Err(FlowError::NotCurrentStage {
                stage: from,
                current,
            });
        }

        self.ctx.set_stage_artifact(from, Some(artifact.clone()));
        self.ctx.set_latest_artifact(artifact);

        info!(stage = %from, "Artifact passed");
        self.emit(&FlowEvent::ArtifactPassed { stage: from });
        Ok(())
    }

    /// Reports a stage failure.
    ///
    /// The stage is marked failed and the failure recorded. Then, in order:
    /// a critical error with `fail_on_critical` aborts the flow; a stage
    /// with retries left goes back to pending; otherwise the stage is
    /// completed with no artifact and, with auto-transition and no other
    /// stage active, the next stage is activated.
    pub fn handle_failure(&mut self, stage: Stage, err: &StageError) -> Result<StageOutcome> {
        self.ensure_started()?;

        error!(stage = %stage, kind = %err.kind, error = %err, "Stage failed");
        self.ctx.settle_stage(stage, SettledStatus::Failed);
        self.ctx.record_failure(stage, FailureRecord::from(err));
        self.emit(&FlowEvent::StageFailed {
            stage,
            kind: err.kind,
            message: err.message.clone(),
        });

        match self.policy.decide(err, self.ctx.retry_count(stage)) {
            FailureDecision::Abort => {
                error!(stage = %stage, "Critical failure, aborting flow");
                self.aborted = Some((stage, err.message.clone()));
                self.emit(&FlowEvent::FlowAborted {
                    stage,
                    message: err.message.clone(),
                });
                Err(FlowError::FlowAborted {
                    stage,
                    message: err.message.clone(),
                })
            }
            FailureDecision::Retry => {
                let attempt = self.ctx.increment_retry(stage);
                self.ctx.settle_stage(stage, SettledStatus::Pending);

                info!(stage = %stage, attempt, max = self.policy.max_retries, "Retrying stage");
                self.emit(&FlowEvent::StageRetrying { stage, attempt });
                Ok(StageOutcome::Retrying { stage, attempt })
            }
            FailureDecision::Skip => {
                warn!(stage = %stage, "Max retries reached, skipping stage");
                self.ctx.set_stage_artifact(stage, None);
                self.ctx.settle_stage(stage, SettledStatus::Completed);
                self.emit(&FlowEvent::StageCompleted { stage });

                let next = self.auto_advance(stage);
                self.emit(&FlowEvent::StageSkipped { stage, next });
                Ok(StageOutcome::Skipped { stage, next })
            }
        }
    }

    /// Completes the active stage and, with auto-transition, activates the
    /// next one.
    pub fn complete_stage(&mut self) -> Result<StageOutcome> {
        self.ensure_started()?;
        let current = self.ctx.active_stage().ok_or(FlowError::NoActiveStage)?;

        self.ctx.settle_stage(current, SettledStatus::Completed);
        info!(stage = %current, "Stage completed");
        self.emit(&FlowEvent::StageCompleted { stage: current });

        let to = self.auto_advance(current);
        Ok(StageOutcome::Advanced { from: current, to })
    }

    /// Follows a transition signalled by a passed review.
    ///
    /// Returns `None` when no review signalled a move from the active stage
    /// to the stage after it.
    pub fn follow_review_trigger(&mut self) -> Result<Option<StageOutcome>> {
        self.ensure_started()?;

        let Some(current) = self.ctx.active_stage() else {
            return Ok(None);
        };
        let Some(next) = current.next() else {
            return Ok(None);
        };
        match self.ctx.transition_trigger(next) {
            Some(trigger) if trigger.from_stage == current => {}
            _ => return Ok(None),
        }

        self.ctx.take_transition_trigger(next);
        info!(from = %current, to = %next, "Following review transition trigger");
        self.transition_to(next)?;
        Ok(Some(StageOutcome::Advanced {
            from: current,
            to: Some(next),
        }))
    }

    /// Records a metric value for the coordinator's own progress score.
    ///
    /// Independent of any [`QualityMetricsCollector`](crate::quality::QualityMetricsCollector).
    pub fn record_quality_metric(&mut self, stage: Stage, metric: &str, value: f64) -> Result<()> {
        self.ensure_not_aborted()?;

        self.quality_metrics
            .entry(stage)
            .or_default()
            .insert(metric.to_string(), value);

        info!(stage = %stage, metric, value, "Quality metric recorded");
        Ok(())
    }

    /// Returns the recorded metric values.
    #[must_use]
    pub fn quality_metrics(&self) -> &QualityMetrics {
        &self.quality_metrics
    }

    /// Returns the status line of every stage.
    #[must_use]
    pub fn stage_statuses(&self) -> BTreeMap<Stage, StageStatusInfo> {
        self.ctx
            .stage_statuses()
            .into_iter()
            .map(|(stage, status)| {
                let info = StageStatusInfo {
                    status,
                    progress: threshold_pass_ratio(stage, self.quality_metrics.get(&stage)),
                    review_count: self.ctx.retry_count(stage),
                };
                (stage, info)
            })
            .collect()
    }

    /// Returns the coordinator's progress view.
    ///
    /// Overall progress is the share of completed stages; per-stage
    /// progress is the share of that stage's thresholds met.
    #[must_use]
    pub fn get_progress(&self) -> ProgressInfo {
        let stage_statuses = self.stage_statuses();
        let completed = stage_statuses
            .values()
            .filter(|s| s.status == StageStatus::Completed)
            .count();

        #[allow(clippy::cast_precision_loss)]
        let overall_progress = completed as f64 / Stage::COUNT as f64 * 100.0;

        ProgressInfo {
            current_stage: self.ctx.active_stage(),
            overall_progress,
            stage_statuses,
            quality_metrics: self
                .quality_metrics
                .iter()
                .filter(|(_, values)| !values.is_empty())
                .map(|(stage, values)| (*stage, values.clone()))
                .collect(),
        }
    }

    /// Completes any active stage, without advancing, and writes the flow
    /// report to the configured report path.
    pub async fn complete(&mut self) -> Result<FlowReport> {
        self.ensure_started()?;

        if let Some(current) = self.ctx.active_stage() {
            self.ctx.settle_stage(current, SettledStatus::Completed);
            self.emit(&FlowEvent::StageCompleted { stage: current });
        }

        let progress = self.get_progress();
        let report = FlowReport {
            project: self.ctx.project(),
            stages: progress.stage_statuses.clone(),
            quality_metrics: progress.quality_metrics.clone(),
            progress,
            completed_at: now_utc(),
        };

        let path = &self.config.report_path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, serde_json::to_string_pretty(&report)?).await?;

        info!(path = %path.display(), "Flow completed, report generated");
        self.emit(&FlowEvent::FlowCompleted { path: path.clone() });
        Ok(report)
    }

    fn ensure_not_aborted(&self) -> Result<()> {
        match &self.aborted {
            Some((stage, message)) => Err(FlowError::FlowAborted {
                stage: *stage,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn ensure_started(&self) -> Result<()> {
        self.ensure_not_aborted()?;
        if self.started {
            Ok(())
        } else {
            Err(FlowError::NotStarted)
        }
    }

    /// Activates `stage`. `completed` names a stage that was settled just
    /// before and whose artifact should carry over.
    fn activate(&self, stage: Stage, completed: Option<Stage>) {
        let displaced = self.ctx.activate_stage(stage);
        if let Some(done) = displaced {
            self.emit(&FlowEvent::StageCompleted { stage: done });
        }

        let from = displaced.or(completed);
        if let Some(done) = from {
            self.ctx.set_previous_artifact(self.ctx.stage_artifact(done));
            info!(from = %done, to = %stage, "Stage transition");
        } else {
            info!(stage = %stage, "Stage activated");
        }
        self.emit(&FlowEvent::StageActivated { stage, from });
    }

    /// Activates the stage after `completed` when auto-transition is on and
    /// nothing else is active.
    fn auto_advance(&self, completed: Stage) -> Option<Stage> {
        if !self.config.enable_auto_transition || self.ctx.active_stage().is_some() {
            return None;
        }
        let next = completed.next()?;
        info!(from = %completed, to = %next, "Auto-transitioning to next stage");
        self.activate(next, Some(completed));
        Some(next)
    }

    fn emit(&self, event: &FlowEvent) {
        self.sink.try_emit(event);
    }
}
