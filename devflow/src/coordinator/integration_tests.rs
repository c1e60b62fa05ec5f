//! End-to-end flows that drive every component over one shared context.

use super::*;
use crate::artifacts::{ArtifactConfig, ArtifactFormat, ArtifactType};
use crate::context::FlowContext;
use crate::core::{ReportFormat, Stage, StageStatus};
use crate::errors::{FlowError, StageError};
use crate::events::CollectingEventSink;
use crate::feedback::{FeedbackAction, FeedbackCategory, FeedbackInput, FeedbackState};
use crate::progress::{ProgressTracker, StageProgressUpdate, TrackerConfig};
use crate::quality::{QualityConfig, QualityMetricsCollector};
use crate::review::{Decision, ReviewConfig, ReviewOrchestrator, ReviewState};
use crate::testing::{demo_project, sample_files, sample_milestones, TestWorkspace};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

struct Harness {
    ws: TestWorkspace,
    ctx: FlowContext,
    sink: Arc<CollectingEventSink>,
    flow: FlowCoordinator,
    review: ReviewOrchestrator,
    tracker: ProgressTracker,
}

impl Harness {
    fn new() -> Self {
        let ws = TestWorkspace::new().unwrap();
        let ctx = FlowContext::new();
        let sink = Arc::new(CollectingEventSink::new());
        let flow = FlowCoordinator::new(ws.flow_config())
            .with_context(ctx.clone())
            .with_event_sink(sink.clone());
        let review = ReviewOrchestrator::new(ctx.clone(), ReviewConfig::new());
        let tracker = ProgressTracker::new(ctx.clone(), sample_milestones(), TrackerConfig::new());

        Self {
            ws,
            ctx,
            sink,
            flow,
            review,
            tracker,
        }
    }
}

#[tokio::test]
async fn test_review_driven_flow_end_to_end() {
    let mut h = Harness::new();
    h.flow.start(demo_project()).unwrap();

    // Requirements proposal: hand off, review, follow the signal.
    let proposal = json!({"scope": "MVP", "stories": 12});
    h.flow
        .pass_artifact(Stage::RequirementsProposal, proposal.clone())
        .unwrap();
    assert_eq!(h.review.trigger_self_review(Stage::RequirementsProposal), Some(1));
    let signalled = h.review.record_decision(
        Stage::RequirementsProposal,
        Decision::Pass,
        "lead",
        vec!["clear scope".into()],
    );
    assert_eq!(signalled, Some(Stage::RequirementsAnalysis));

    let outcome = h.flow.follow_review_trigger().unwrap();
    assert_eq!(
        outcome,
        Some(StageOutcome::Advanced {
            from: Stage::RequirementsProposal,
            to: Some(Stage::RequirementsAnalysis),
        })
    );
    assert_eq!(h.ctx.previous_artifact(), Some(proposal.clone()));
    assert_eq!(h.ctx.stage_status(Stage::RequirementsProposal), StageStatus::Completed);
    assert_eq!(
        h.review.get_review_status(Stage::RequirementsProposal).unwrap().status,
        ReviewState::Completed
    );

    h.tracker.update_stage_progress(
        Stage::RequirementsProposal,
        StageProgressUpdate::new()
            .progress(100.0)
            .status(StageStatus::Completed),
    );

    // Requirements analysis fails once, is retried, then completes.
    let outcome = h
        .flow
        .handle_failure(Stage::RequirementsAnalysis, &StageError::new("missing use cases"))
        .unwrap();
    assert_eq!(
        outcome,
        StageOutcome::Retrying {
            stage: Stage::RequirementsAnalysis,
            attempt: 1,
        }
    );
    assert_eq!(h.flow.current_stage(), None);

    h.flow.transition_to(Stage::RequirementsAnalysis).unwrap();
    assert_eq!(h.ctx.previous_artifact(), Some(proposal));
    h.flow
        .pass_artifact(Stage::RequirementsAnalysis, json!({"useCases": 8}))
        .unwrap();
    h.flow
        .record_quality_metric(Stage::RequirementsAnalysis, "completeness", 100.0)
        .unwrap();
    h.flow
        .record_quality_metric(Stage::RequirementsAnalysis, "useCaseQuality", 70.0)
        .unwrap();

    let outcome = h.flow.complete_stage().unwrap();
    assert_eq!(
        outcome,
        StageOutcome::Advanced {
            from: Stage::RequirementsAnalysis,
            to: Some(Stage::ProductDesign),
        }
    );

    let progress = h.flow.get_progress();
    assert_eq!(progress.current_stage, Some(Stage::ProductDesign));
    let analysis = &progress.stage_statuses[&Stage::RequirementsAnalysis];
    assert_eq!(analysis.review_count, 1);
    // completeness and the zero consistency threshold are met; the other two are not.
    assert!((analysis.progress - 50.0).abs() < f64::EPSILON);

    let report = h.flow.complete().await.unwrap();
    assert_eq!(report.project.unwrap().name, "Demo");
    let completed = report
        .stages
        .values()
        .filter(|s| s.status == StageStatus::Completed)
        .count();
    assert_eq!(completed, 3);

    let written = tokio::fs::read_to_string(h.ws.report_path()).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(parsed["project"]["name"], "Demo");

    let tracked = h.tracker.get_progress();
    assert_eq!(tracked.completed_stages, vec![Stage::RequirementsProposal]);

    let types = h.sink.event_types();
    assert_eq!(types.first(), Some(&"flow.started"));
    assert_eq!(types.last(), Some(&"flow.completed"));
    assert!(types.contains(&"stage.retrying"));
}

#[tokio::test]
async fn test_exhausted_stage_is_skipped_and_flow_continues() {
    let mut h = Harness::new();
    h.flow = FlowCoordinator::new(h.ws.flow_config().with_max_review_attempts(1))
        .with_context(h.ctx.clone())
        .with_event_sink(h.sink.clone());
    h.flow.start(demo_project()).unwrap();

    let err = StageError::new("interview notes lost");
    h.flow
        .handle_failure(Stage::RequirementsProposal, &err)
        .unwrap();
    h.flow.transition_to(Stage::RequirementsProposal).unwrap();

    let outcome = h
        .flow
        .handle_failure(Stage::RequirementsProposal, &err)
        .unwrap();
    assert_eq!(
        outcome,
        StageOutcome::Skipped {
            stage: Stage::RequirementsProposal,
            next: Some(Stage::RequirementsAnalysis),
        }
    );
    assert_eq!(h.ctx.stage_artifact(Stage::RequirementsProposal), None);
    assert_eq!(h.flow.current_stage(), Some(Stage::RequirementsAnalysis));
    assert_eq!(h.ctx.previous_artifact(), None);
}

#[tokio::test]
async fn test_critical_failure_blocks_the_rest_of_the_flow() {
    let mut h = Harness::new();
    h.flow = FlowCoordinator::new(h.ws.flow_config().with_fail_on_critical(true))
        .with_context(h.ctx.clone())
        .with_event_sink(h.sink.clone());
    h.flow.start(demo_project()).unwrap();

    let err = h
        .flow
        .handle_failure(Stage::RequirementsProposal, &StageError::critical("customer withdrew"))
        .unwrap_err();
    assert!(matches!(err, FlowError::FlowAborted { .. }));

    assert!(matches!(
        h.flow.transition_to(Stage::RequirementsAnalysis),
        Err(FlowError::FlowAborted { .. })
    ));
    assert!(matches!(h.flow.complete().await, Err(FlowError::FlowAborted { .. })));
    assert!(!h.ws.report_path().exists());
    assert_eq!(h.sink.events_of_type("flow.aborted").len(), 1);
}

#[tokio::test]
async fn test_deliverables_quality_and_feedback_for_a_stage() {
    let ws = TestWorkspace::new().unwrap();
    let artifacts = ws.artifacts_manager().await.unwrap();
    let feedback = ws.feedback_collector().await.unwrap();
    let quality = QualityMetricsCollector::with_stage_defaults(QualityConfig::default());

    let config = ArtifactConfig::new(
        Stage::RequirementsAnalysis,
        "requirements",
        ArtifactType::Document,
        ArtifactFormat::Json,
    );
    let path = artifacts
        .register_artifact(config, &sample_files())
        .await
        .unwrap();
    artifacts
        .write_primary(Stage::RequirementsAnalysis, "requirements", br#"{"useCases": 8}"#)
        .await
        .unwrap();
    assert!(path.starts_with(ws.path()));

    let validation = artifacts
        .validate_artifact(Stage::RequirementsAnalysis, "requirements")
        .await;
    assert!(validation.is_valid, "{:?}", validation.errors);

    quality.record_metric(Stage::RequirementsAnalysis, "completeness", 100.0);
    quality.record_metric(Stage::RequirementsAnalysis, "useCaseQuality", 60.0);
    let alerts = quality.check_thresholds();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].metric, "useCaseQuality");
    let markdown = quality.get_report(ReportFormat::Markdown).unwrap();
    assert!(markdown.contains("# Quality Metrics Report"));

    let id = feedback
        .collect(
            Stage::RequirementsAnalysis,
            FeedbackInput::new("The export page is slow to load"),
        )
        .await
        .unwrap();
    let entry = &feedback.get_feedback_by_stage(Stage::RequirementsAnalysis)[0];
    assert_eq!(entry.category, Some(FeedbackCategory::Performance));

    let processed = feedback
        .process_feedback(&id, FeedbackAction::Resolve)
        .await
        .unwrap();
    assert_eq!(processed.state(), FeedbackState::Completed);
    assert!(feedback.get_pending_feedback().is_empty());

    let stats = artifacts.get_statistics();
    assert_eq!(stats.total, 1);
}
