//! Quality metrics collection and grading.

mod collector;
mod grade;

pub use collector::{
    MetricValue, OverallMetrics, QualityConfig, QualityMetricsCollector, StageMetrics,
    ThresholdAlert, ThresholdTable,
};
pub use grade::Grade;
