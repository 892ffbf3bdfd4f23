//! Core lab-result analysis: deviation, severity, interpretation and recommendations.

mod interpret;
mod lifestyle;
mod normalize;
mod panel;
mod reference;
mod supplement;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use interpret::interpret;
pub use lifestyle::{lifestyle_recommendations, LabTest};
pub use normalize::{classify_severity, classify_status, deviation_percent, normalize, Normalized};
pub use panel::{dedup_supplements, overall_health, Analyzer};
pub use reference::{
    NutrientMapping, NutrientReferenceTable, RelatedSupplement, SupplementCondition,
    SupplementPriority,
};
pub use supplement::{matching_supplements, rank_supplements, recommend_supplements};

/// Thresholds used by the severity classifier and the panel aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzerConfig {
    /// Deviation (percent) at which a result stops being mild.
    pub moderate_threshold_percent: f64,
    /// Deviation (percent) at which a result becomes severe.
    pub severe_threshold_percent: f64,
    /// A panel with more moderate results than this is rated fair.
    pub fair_moderate_count: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            moderate_threshold_percent: 20.0,
            severe_threshold_percent: 40.0,
            fair_moderate_count: 2,
        }
    }
}

impl AnalyzerConfig {
    /// Reject thresholds the classifier cannot order.
    pub fn validate(&self) -> Result<(), PortalError> {
        let moderate = self.moderate_threshold_percent;
        let severe = self.severe_threshold_percent;
        if !moderate.is_finite() || !severe.is_finite() {
            return Err(PortalError::InvalidConfig(
                "severity thresholds must be finite".to_string(),
            ));
        }
        if moderate < 0.0 || severe <= moderate {
            return Err(PortalError::InvalidConfig(format!(
                "expected 0 <= moderate ({moderate}) < severe ({severe})"
            )));
        }
        Ok(())
    }
}

/// Position of a measured value relative to its reference interval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Low,
    Normal,
    High,
}

/// Severity tier of a single result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

/// Overall rating of a panel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OverallHealth {
    Excellent,
    Good,
    Fair,
    Poor,
}

/// One lab measurement as supplied by the records layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestResult {
    pub test_id: String,
    pub test_name: String,
    pub value: f64,
    pub unit: String,
    pub reference_min: f64,
    pub reference_max: f64,
    /// Caller-supplied classification; recomputed from the bounds during analysis.
    #[serde(default)]
    pub status: Option<TestStatus>,
    #[serde(default)]
    pub collected_at: Option<DateTime<Utc>>,
}

/// Analysis of one `TestResult`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub test_id: String,
    pub test_name: String,
    pub status: TestStatus,
    pub deviation_percent: f64,
    pub interpretation: String,
    pub severity: Severity,
    /// `None` when the reference table has nothing for this test and status.
    pub supplement_recommendations: Option<Vec<String>>,
    pub lifestyle_recommendations: Vec<String>,
    pub follow_up_recommended: bool,
}

/// A supplement ranked across the whole panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankedSupplement {
    pub supplement_id: String,
    pub priority: SupplementPriority,
    /// Test that first recommended this supplement.
    pub test_name: String,
}

/// A result that could not be analyzed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RejectedResult {
    pub test_id: String,
    pub test_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PanelSummary {
    pub overall_health: OverallHealth,
    pub key_findings: Vec<String>,
    pub priority_supplements: Vec<String>,
    #[serde(default)]
    pub ranked_supplements: Vec<RankedSupplement>,
    #[serde(default)]
    pub rejected: Vec<RejectedResult>,
}

/// Output of one panel run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PanelReport {
    pub generated_at: DateTime<Utc>,
    pub analyses: Vec<AnalysisResult>,
    pub summary: PanelSummary,
}

impl PanelReport {
    pub fn new(analyses: Vec<AnalysisResult>, summary: PanelSummary) -> Self {
        Self {
            generated_at: Utc::now(),
            analyses,
            summary,
        }
    }

    /// Analyses that call for a follow-up, in panel order.
    pub fn follow_ups(&self) -> impl Iterator<Item = &AnalysisResult> {
        self.analyses
            .iter()
            .filter(|analysis| analysis.follow_up_recommended)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("{test_name}: value or reference bound is not a finite number")]
    NonFiniteValue { test_name: String },
    #[error("{test_name}: reference range is inverted ({min} > {max})")]
    InvertedRange {
        test_name: String,
        min: f64,
        max: f64,
    },
    #[error("{test_name}: reference bound is zero, deviation is undefined")]
    ZeroReferenceBound { test_name: String },
    #[error("duplicate nutrient mapping for {0}")]
    DuplicateMapping(String),
    #[error("invalid analyzer config: {0}")]
    InvalidConfig(String),
    #[error("input is missing required data")]
    MissingData,
    #[error("could not parse input: {0}")]
    Parse(String),
}
