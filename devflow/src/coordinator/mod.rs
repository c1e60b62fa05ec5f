//! Flow coordination.
//!
//! The [`FlowCoordinator`] owns the stage state machine: activation and
//! transitions, artifact handoff, failure policy and the final report.
//! [`FlowHandle`] shares one coordinator between concurrent callers.

mod config;
mod flow;
mod handle;
mod policy;
mod report;

pub use config::FlowConfig;
pub use flow::FlowCoordinator;
pub use handle::FlowHandle;
pub use policy::{FailureDecision, FailurePolicy, StageOutcome};
pub use report::{threshold_pass_ratio, FlowReport, ProgressInfo, QualityMetrics, StageStatusInfo};

#[cfg(test)]
mod integration_tests;
