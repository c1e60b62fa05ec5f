//! Shared, serialized access to a coordinator.

use super::flow::FlowCoordinator;
use super::policy::StageOutcome;
use super::report::{FlowReport, ProgressInfo};
use crate::context::{ContextSnapshot, FlowContext, ProjectContext};
use crate::core::Stage;
use crate::errors::{Result, StageError};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Cloneable handle that serializes every mutating call on one
/// [`FlowCoordinator`].
///
/// Context snapshots are read without taking the coordinator lock.
#[derive(Debug, Clone)]
pub struct FlowHandle {
    inner: Arc<Mutex<FlowCoordinator>>,
    ctx: FlowContext,
}

impl FlowHandle {
    /// Wraps a coordinator.
    #[must_use]
    pub fn new(coordinator: FlowCoordinator) -> Self {
        let ctx = coordinator.context().clone();
        Self {
            inner: Arc::new(Mutex::new(coordinator)),
            ctx,
        }
    }

    /// Locks the coordinator for a sequence of calls.
    pub async fn lock(&self) -> MutexGuard<'_, FlowCoordinator> {
        self.inner.lock().await
    }

    /// See [`FlowCoordinator::start`].
    pub async fn start(&self, project: ProjectContext) -> Result<()> {
        self.inner.lock().await.start(project)
    }

    /// See [`FlowCoordinator::transition_to`].
    pub async fn transition_to(&self, stage: Stage) -> Result<()> {
        self.inner.lock().await.transition_to(stage)
    }

    /// See [`FlowCoordinator::pass_artifact`].
    pub async fn pass_artifact(&self, from: Stage, artifact: serde_json::Value) -> Result<()> {
        self.inner.lock().await.pass_artifact(from, artifact)
    }

    /// See [`FlowCoordinator::handle_failure`].
    pub async fn handle_failure(&self, stage: Stage, err: &StageError) -> Result<StageOutcome> {
        self.inner.lock().await.handle_failure(stage, err)
    }

    /// See [`FlowCoordinator::complete_stage`].
    pub async fn complete_stage(&self) -> Result<StageOutcome> {
        self.inner.lock().await.complete_stage()
    }

    /// See [`FlowCoordinator::follow_review_trigger`].
    pub async fn follow_review_trigger(&self) -> Result<Option<StageOutcome>> {
        self.inner.lock().await.follow_review_trigger()
    }

    /// See [`FlowCoordinator::record_quality_metric`].
    pub async fn record_quality_metric(&self, stage: Stage, metric: &str, value: f64) -> Result<()> {
        self.inner
            .lock()
            .await
            .record_quality_metric(stage, metric, value)
    }

    /// See [`FlowCoordinator::get_progress`].
    pub async fn progress(&self) -> ProgressInfo {
        self.inner.lock().await.get_progress()
    }

    /// See [`FlowCoordinator::complete`].
    pub async fn complete(&self) -> Result<FlowReport> {
        self.inner.lock().await.complete().await
    }

    /// Returns the shared context.
    #[must_use]
    pub fn context(&self) -> &FlowContext {
        &self.ctx
    }

    /// Copies the shared context without waiting for the coordinator.
    #[must_use]
    pub fn snapshot(&self) -> ContextSnapshot {
        self.ctx.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::FlowConfig;
    use crate::core::StageStatus;
    use crate::testing::demo_project;

    #[tokio::test]
    async fn test_concurrent_callers_keep_one_active_stage() {
        let handle = FlowHandle::new(FlowCoordinator::new(FlowConfig::default()));
        handle.start(demo_project()).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move { handle.complete_stage().await }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.ledger.count(StageStatus::InProgress), 1);
        assert_eq!(snapshot.ledger.count(StageStatus::Completed), 8);
        assert_eq!(handle.progress().await.current_stage, Stage::from_index(8));
    }

    #[tokio::test]
    async fn test_lock_for_sequence() {
        let handle = FlowHandle::new(FlowCoordinator::new(FlowConfig::default()));
        {
            let mut flow = handle.lock().await;
            flow.start(demo_project()).unwrap();
            flow.transition_to(Stage::RequirementsAnalysis).unwrap();
        }
        assert_eq!(
            handle.context().active_stage(),
            Some(Stage::RequirementsAnalysis)
        );
    }
}
