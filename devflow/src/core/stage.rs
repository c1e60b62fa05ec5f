//! The fixed, totally ordered stage registry.

use crate::errors::FlowError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One of the thirteen steps of the delivery flow.
///
/// The declaration order is the flow order; `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Customer-facing proposal of the requirements.
    RequirementsProposal,
    /// Analysis and consolidation of the requirements.
    RequirementsAnalysis,
    /// Product and feature design.
    ProductDesign,
    /// Visual and interaction design.
    UiDesign,
    /// Frontend implementation.
    FrontendDevelopment,
    /// Backend implementation.
    BackendDevelopment,
    /// Architecture review and hardening.
    ArchitectureGuarantee,
    /// Test execution and verification.
    TestingVerification,
    /// User and developer documentation.
    DocumentationDelivery,
    /// Security review.
    SecurityReview,
    /// Test framework and automation setup.
    TestFrameworkSetup,
    /// Release and operations.
    ReleaseOperations,
    /// Final project coordination and sign-off.
    ProjectCoordination,
}

impl Stage {
    /// Every stage, in flow order.
    pub const ALL: [Self; 13] = [
        Self::RequirementsProposal,
        Self::RequirementsAnalysis,
        Self::ProductDesign,
        Self::UiDesign,
        Self::FrontendDevelopment,
        Self::BackendDevelopment,
        Self::ArchitectureGuarantee,
        Self::TestingVerification,
        Self::DocumentationDelivery,
        Self::SecurityReview,
        Self::TestFrameworkSetup,
        Self::ReleaseOperations,
        Self::ProjectCoordination,
    ];

    /// Number of stages in the flow.
    pub const COUNT: usize = Self::ALL.len();

    /// Returns the first stage of the flow.
    #[must_use]
    pub const fn first() -> Self {
        Self::RequirementsProposal
    }

    /// Returns the terminal stage of the flow.
    #[must_use]
    pub const fn last() -> Self {
        Self::ProjectCoordination
    }

    /// Returns the zero-based position of the stage in the flow.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the stage at a position, if any.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns the stage that follows this one.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// Returns true for the final stage.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::last()
    }

    /// Returns the kebab-case identifier of the stage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RequirementsProposal => "requirements-proposal",
            Self::RequirementsAnalysis => "requirements-analysis",
            Self::ProductDesign => "product-design",
            Self::UiDesign => "ui-design",
            Self::FrontendDevelopment => "frontend-development",
            Self::BackendDevelopment => "backend-development",
            Self::ArchitectureGuarantee => "architecture-guarantee",
            Self::TestingVerification => "testing-verification",
            Self::DocumentationDelivery => "documentation-delivery",
            Self::SecurityReview => "security-review",
            Self::TestFrameworkSetup => "test-framework-setup",
            Self::ReleaseOperations => "release-operations",
            Self::ProjectCoordination => "project-coordination",
        }
    }

    /// Stages that get a pre-created artifact directory.
    ///
    /// Project coordination produces no deliverables of its own; its
    /// directory is created lazily on first registration.
    pub fn artifact_stages() -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(|s| *s != Self::ProjectCoordination)
    }

    /// Returns the static configuration of the stage.
    #[must_use]
    pub fn config(self) -> StageConfig {
        StageConfig {
            stage: self,
            skill_name: skill_name(self),
            required_roles: required_roles(self),
            quality_thresholds: quality_thresholds(self),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| FlowError::UnknownStage(s.to_string()))
    }
}

impl TryFrom<&str> for Stage {
    type Error = FlowError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Static configuration attached to every stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageConfig {
    /// The stage this configuration describes.
    pub stage: Stage,
    /// The skill that produces the stage's deliverables.
    pub skill_name: &'static str,
    /// Roles that must take part in the stage.
    pub required_roles: &'static [&'static str],
    /// Minimum values per quality metric.
    pub quality_thresholds: &'static [(&'static str, f64)],
}

impl StageConfig {
    /// Returns the threshold for a metric, if configured.
    #[must_use]
    pub fn threshold(&self, metric: &str) -> Option<f64> {
        self.quality_thresholds
            .iter()
            .find(|(key, _)| *key == metric)
            .map(|(_, value)| *value)
    }

    /// Returns the thresholds as an owned map.
    #[must_use]
    pub fn thresholds_map(&self) -> BTreeMap<String, f64> {
        self.quality_thresholds
            .iter()
            .map(|(key, value)| ((*key).to_string(), *value))
            .collect()
    }
}

/// Returns the default thresholds of every stage, keyed by stage.
#[must_use]
pub fn default_thresholds() -> BTreeMap<Stage, BTreeMap<String, f64>> {
    Stage::ALL
        .into_iter()
        .map(|stage| (stage, stage.config().thresholds_map()))
        .collect()
}

const fn skill_name(stage: Stage) -> &'static str {
    match stage {
        Stage::RequirementsProposal => "customer-representative",
        Stage::RequirementsAnalysis => "requirements-analyst",
        Stage::ProductDesign => "product-expert",
        Stage::UiDesign => "ui-expert",
        Stage::FrontendDevelopment => "frontend-engineer",
        Stage::BackendDevelopment => "backend-engineer",
        Stage::ArchitectureGuarantee => "technical-architect",
        Stage::TestingVerification => "tester",
        Stage::DocumentationDelivery => "product-documentation-expert",
        Stage::SecurityReview => "security-engineer",
        Stage::TestFrameworkSetup => "test-framework-builder",
        Stage::ReleaseOperations => "devops-generator",
        Stage::ProjectCoordination => "project-coordinator",
    }
}

const fn required_roles(stage: Stage) -> &'static [&'static str] {
    match stage {
        Stage::ReleaseOperations => &["devops-generator", "technical-architect"],
        Stage::ProjectCoordination => &["project-coordinator", "customer-representative"],
        // Single-role stages are staffed by the skill that produces them.
        Stage::RequirementsProposal => &["customer-representative"],
        Stage::RequirementsAnalysis => &["requirements-analyst"],
        Stage::ProductDesign => &["product-expert"],
        Stage::UiDesign => &["ui-expert"],
        Stage::FrontendDevelopment => &["frontend-engineer"],
        Stage::BackendDevelopment => &["backend-engineer"],
        Stage::ArchitectureGuarantee => &["technical-architect"],
        Stage::TestingVerification => &["tester"],
        Stage::DocumentationDelivery => &["product-documentation-expert"],
        Stage::SecurityReview => &["security-engineer"],
        Stage::TestFrameworkSetup => &["test-framework-builder"],
    }
}

const fn quality_thresholds(stage: Stage) -> &'static [(&'static str, f64)] {
    match stage {
        Stage::RequirementsProposal => &[
            ("clarity", 95.0),
            ("customerPerspective", 95.0),
            ("acceptanceCriteria", 100.0),
        ],
        Stage::RequirementsAnalysis => &[
            ("completeness", 100.0),
            ("consistency", 0.0),
            ("technicalFeasibility", 100.0),
            ("useCaseQuality", 80.0),
        ],
        Stage::ProductDesign => &[
            ("featureCoverage", 90.0),
            ("userFlowClarity", 85.0),
            ("prioritization", 80.0),
        ],
        Stage::UiDesign => &[
            ("designConsistency", 90.0),
            ("accessibility", 85.0),
            ("prototypeCoverage", 80.0),
        ],
        Stage::FrontendDevelopment => &[
            ("codeQuality", 80.0),
            ("testCoverage", 80.0),
            ("performanceScore", 85.0),
        ],
        Stage::BackendDevelopment => &[
            ("codeQuality", 80.0),
            ("testCoverage", 80.0),
            ("apiCompliance", 95.0),
        ],
        Stage::ArchitectureGuarantee => &[
            ("scalability", 85.0),
            ("maintainability", 80.0),
            ("architectureCompliance", 90.0),
        ],
        Stage::TestingVerification => &[
            ("testCoverage", 85.0),
            ("passRate", 95.0),
            ("criticalBugsResolved", 100.0),
        ],
        Stage::DocumentationDelivery => &[
            ("completeness", 90.0),
            ("accuracy", 95.0),
            ("readability", 80.0),
        ],
        Stage::SecurityReview => &[
            ("vulnerabilityScore", 90.0),
            ("complianceScore", 95.0),
        ],
        Stage::TestFrameworkSetup => &[
            ("frameworkCoverage", 85.0),
            ("automationRate", 80.0),
        ],
        Stage::ReleaseOperations => &[
            ("deploymentSuccessRate", 95.0),
            ("rollbackReadiness", 100.0),
        ],
        Stage::ProjectCoordination => &[
            ("deliveryOnTime", 90.0),
            ("stakeholderSatisfaction", 85.0),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_is_total() {
        assert_eq!(Stage::COUNT, 13);
        for (i, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
            assert_eq!(Stage::from_index(i), Some(*stage));
        }
        assert!(Stage::RequirementsProposal < Stage::ProjectCoordination);
    }

    #[test]
    fn test_stage_next() {
        assert_eq!(Stage::first().next(), Some(Stage::RequirementsAnalysis));
        assert_eq!(Stage::ReleaseOperations.next(), Some(Stage::ProjectCoordination));
        assert_eq!(Stage::last().next(), None);
        assert!(Stage::last().is_terminal());
    }

    #[test]
    fn test_stage_parse_roundtrip() {
        for stage in Stage::ALL {
            assert_eq!(stage.as_str().parse::<Stage>().unwrap(), stage);
        }
    }

    #[test]
    fn test_unknown_stage() {
        let err = "deployment".parse::<Stage>().unwrap_err();
        assert!(matches!(err, FlowError::UnknownStage(ref name) if name == "deployment"));
    }

    #[test]
    fn test_stage_serialize() {
        let json = serde_json::to_string(&Stage::UiDesign).unwrap();
        assert_eq!(json, r#""ui-design""#);

        let stage: Stage = serde_json::from_str(r#""security-review""#).unwrap();
        assert_eq!(stage, Stage::SecurityReview);
    }

    #[test]
    fn test_artifact_stages_exclude_coordination() {
        let stages: Vec<_> = Stage::artifact_stages().collect();
        assert_eq!(stages.len(), 12);
        assert!(!stages.contains(&Stage::ProjectCoordination));
    }

    #[test]
    fn test_stage_config() {
        let config = Stage::RequirementsProposal.config();
        assert_eq!(config.skill_name, "customer-representative");
        assert_eq!(config.threshold("acceptanceCriteria"), Some(100.0));
        assert_eq!(config.threshold("unknown"), None);

        let release = Stage::ReleaseOperations.config();
        assert_eq!(release.required_roles.len(), 2);
    }

    #[test]
    fn test_every_stage_has_thresholds() {
        let all = default_thresholds();
        assert_eq!(all.len(), Stage::COUNT);
        assert!(all.values().all(|t| !t.is_empty()));
    }
}
