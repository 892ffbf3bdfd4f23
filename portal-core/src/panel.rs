//! Per-result analysis and panel-level aggregation.

use std::collections::HashSet;

use crate::{
    classify_severity, interpret, lifestyle_recommendations, normalize, rank_supplements,
    recommend_supplements, AnalysisResult, AnalyzerConfig, NutrientReferenceTable,
    OverallHealth, PanelReport, PanelSummary, PortalError, RejectedResult, Severity,
    TestResult, TestStatus,
};

/// Stateless analyzer over an injected config and reference table.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalyzerConfig,
    reference: NutrientReferenceTable,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            config: AnalyzerConfig::default(),
            reference: NutrientReferenceTable::standard(),
        }
    }
}

impl Analyzer {
    pub fn new(
        config: AnalyzerConfig,
        reference: NutrientReferenceTable,
    ) -> Result<Self, PortalError> {
        config.validate()?;
        Ok(Self { config, reference })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn reference(&self) -> &NutrientReferenceTable {
        &self.reference
    }

    /// Analyze one result in isolation.
    pub fn analyze_result(&self, result: &TestResult) -> Result<AnalysisResult, PortalError> {
        let normalized = normalize(result)?;
        let status = normalized.status;
        let severity = classify_severity(normalized.deviation_percent, status, &self.config);

        let follow_up_recommended = severity == Severity::Severe
            || (severity == Severity::Moderate && status != TestStatus::Normal);

        Ok(AnalysisResult {
            test_id: result.test_id.clone(),
            test_name: result.test_name.clone(),
            status,
            deviation_percent: normalized.deviation_percent,
            interpretation: interpret(result, status, severity),
            severity,
            supplement_recommendations: recommend_supplements(
                &self.reference,
                &result.test_name,
                status,
            ),
            lifestyle_recommendations: lifestyle_recommendations(&result.test_name, status),
            follow_up_recommended,
        })
    }

    /// Analyze a panel. A result that fails validation is reported in
    /// `summary.rejected` and does not stop the rest of the panel.
    pub fn analyze_panel(&self, results: &[TestResult]) -> PanelReport {
        let mut analyses = Vec::with_capacity(results.len());
        let mut rejected = Vec::new();

        for result in results {
            match self.analyze_result(result) {
                Ok(analysis) => analyses.push(analysis),
                Err(err) => {
                    tracing::warn!(test_id = %result.test_id, error = %err, "rejecting test result");
                    rejected.push(RejectedResult {
                        test_id: result.test_id.clone(),
                        test_name: result.test_name.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        let summary = PanelSummary {
            overall_health: overall_health(&analyses, &self.config),
            key_findings: analyses
                .iter()
                .filter(|analysis| analysis.severity != Severity::Mild)
                .map(|analysis| analysis.interpretation.clone())
                .collect(),
            priority_supplements: dedup_supplements(&analyses),
            ranked_supplements: rank_supplements(&self.reference, &analyses),
            rejected,
        };

        tracing::info!(
            analyzed = analyses.len(),
            rejected = summary.rejected.len(),
            overall = ?summary.overall_health,
            "panel analyzed"
        );

        PanelReport::new(analyses, summary)
    }
}

/// Panel tier: any severe result is poor, then the moderate count decides.
pub fn overall_health(analyses: &[AnalysisResult], config: &AnalyzerConfig) -> OverallHealth {
    let severe_count = analyses
        .iter()
        .filter(|analysis| analysis.severity == Severity::Severe)
        .count();
    let moderate_count = analyses
        .iter()
        .filter(|analysis| analysis.severity == Severity::Moderate)
        .count();

    if severe_count > 0 {
        OverallHealth::Poor
    } else if moderate_count > config.fair_moderate_count {
        OverallHealth::Fair
    } else if moderate_count > 0 {
        OverallHealth::Good
    } else {
        OverallHealth::Excellent
    }
}

/// All recommended supplement ids, first occurrence wins.
pub fn dedup_supplements(analyses: &[AnalysisResult]) -> Vec<String> {
    let mut seen = HashSet::new();
    analyses
        .iter()
        .filter_map(|analysis| analysis.supplement_recommendations.as_ref())
        .flatten()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        NutrientMapping, RelatedSupplement, SupplementCondition, SupplementPriority,
    };
    use proptest::prelude::*;

    fn result(id: &str, name: &str, value: f64, unit: &str, min: f64, max: f64) -> TestResult {
        TestResult {
            test_id: id.to_string(),
            test_name: name.to_string(),
            value,
            unit: unit.to_string(),
            reference_min: min,
            reference_max: max,
            status: None,
            collected_at: None,
        }
    }

    /// Sodium-like test with range 100-200: 150 normal, 90 mild, 70 moderate, 50 severe.
    fn generic(id: &str, value: f64) -> TestResult {
        result(id, "Sodium", value, "mmol/L", 100.0, 200.0)
    }

    #[test]
    fn severe_low_vitamin_d() {
        let analyzer = Analyzer::default();
        let mut input = result("vd", "Vitamin D (25-OH)", 18.0, "ng/mL", 30.0, 50.0);
        input.status = Some(TestStatus::Low);

        let analysis = analyzer.analyze_result(&input).unwrap();
        assert_eq!(analysis.deviation_percent, 40.0);
        assert_eq!(analysis.severity, Severity::Severe);
        assert!(analysis.follow_up_recommended);
        assert!(analysis
            .interpretation
            .contains("significantly below the optimal range (30-50 ng/mL)"));
        assert_eq!(
            analysis.supplement_recommendations,
            Some(vec!["1".to_string(), "2".to_string(), "3".to_string()])
        );
        assert_eq!(analysis.lifestyle_recommendations.len(), 3);
    }

    #[test]
    fn normal_magnesium() {
        let analyzer = Analyzer::default();
        let input = result("mg", "Magnesium, Serum", 1.7, "mg/dL", 1.6, 2.6);

        let analysis = analyzer.analyze_result(&input).unwrap();
        assert_eq!(analysis.deviation_percent, 0.0);
        assert_eq!(analysis.severity, Severity::Mild);
        assert!(!analysis.follow_up_recommended);
        assert_eq!(
            analysis.interpretation,
            "Your Magnesium, Serum level is within the normal range."
        );
        assert_eq!(analysis.supplement_recommendations, None);
        assert!(analysis.lifestyle_recommendations.is_empty());
    }

    #[test]
    fn moderate_result_needs_follow_up() {
        let analysis = Analyzer::default()
            .analyze_result(&generic("s", 70.0))
            .unwrap();
        assert_eq!(analysis.severity, Severity::Moderate);
        assert!(analysis.follow_up_recommended);

        let mild = Analyzer::default()
            .analyze_result(&generic("s", 90.0))
            .unwrap();
        assert!(!mild.follow_up_recommended);
    }

    #[test]
    fn one_severe_result_makes_panel_poor() {
        let panel = [
            generic("1", 50.0),
            generic("2", 70.0),
            generic("3", 70.0),
            generic("4", 150.0),
            generic("5", 90.0),
        ];
        let report = Analyzer::default().analyze_panel(&panel);
        assert_eq!(report.summary.overall_health, OverallHealth::Poor);
        assert_eq!(report.summary.key_findings.len(), 3);
        assert_eq!(report.follow_ups().count(), 3);
    }

    #[test]
    fn moderate_counts_decide_tier() {
        let analyzer = Analyzer::default();

        let fair = analyzer.analyze_panel(&[generic("1", 70.0), generic("2", 70.0), generic("3", 70.0)]);
        assert_eq!(fair.summary.overall_health, OverallHealth::Fair);

        let two = analyzer.analyze_panel(&[generic("1", 70.0), generic("2", 70.0)]);
        assert_eq!(two.summary.overall_health, OverallHealth::Good);

        let good = analyzer.analyze_panel(&[generic("1", 70.0), generic("2", 150.0)]);
        assert_eq!(good.summary.overall_health, OverallHealth::Good);

        let excellent = analyzer.analyze_panel(&[generic("1", 90.0), generic("2", 150.0)]);
        assert_eq!(excellent.summary.overall_health, OverallHealth::Excellent);
        assert!(excellent.summary.key_findings.is_empty());

        let empty = analyzer.analyze_panel(&[]);
        assert_eq!(empty.summary.overall_health, OverallHealth::Excellent);
    }

    #[test]
    fn shared_supplement_appears_once_at_first_position() {
        let low = |id: &str| RelatedSupplement {
            supplement_id: id.to_string(),
            condition: SupplementCondition::Low,
            priority: SupplementPriority::Medium,
        };
        let reference = NutrientReferenceTable::new(vec![
            NutrientMapping {
                test_name: "Ferritin".to_string(),
                related_supplements: vec![low("6"), low("5")],
            },
            NutrientMapping {
                test_name: "Iron, Serum".to_string(),
                related_supplements: vec![low("5"), low("14")],
            },
        ])
        .unwrap();
        let analyzer = Analyzer::new(AnalyzerConfig::default(), reference).unwrap();

        let report = analyzer.analyze_panel(&[
            result("f", "Ferritin", 20.0, "ng/mL", 30.0, 300.0),
            result("i", "Iron, Serum", 40.0, "ug/dL", 60.0, 170.0),
        ]);
        assert_eq!(report.summary.priority_supplements, vec!["6", "5", "14"]);
        assert_eq!(report.summary.ranked_supplements.len(), 3);
    }

    #[test]
    fn bad_record_is_isolated() {
        let report = Analyzer::default().analyze_panel(&[
            result("bad", "Zinc", -1.0, "ug/dL", 0.0, 120.0),
            generic("ok", 50.0),
        ]);
        assert_eq!(report.analyses.len(), 1);
        assert_eq!(report.summary.rejected.len(), 1);
        assert_eq!(report.summary.rejected[0].test_id, "bad");
        assert_eq!(report.summary.overall_health, OverallHealth::Poor);
    }

    proptest! {
        #[test]
        fn analysis_is_idempotent(
            value in 0.0f64..300.0,
            min in 1.0f64..100.0,
            span in 0.0f64..100.0,
            known in any::<bool>(),
        ) {
            let name = if known { "Vitamin D (25-OH)" } else { "Sodium" };
            let input = result("p", name, value, "ng/mL", min, min + span);
            let analyzer = Analyzer::default();

            let first = analyzer.analyze_result(&input).unwrap();
            let second = analyzer.analyze_result(&input).unwrap();
            prop_assert_eq!(&first, &second);

            let config = analyzer.config();
            prop_assert_eq!(
                classify_severity(first.deviation_percent, first.status, config),
                classify_severity(first.deviation_percent, first.status, config)
            );
            prop_assert_eq!(
                &interpret(&input, first.status, first.severity),
                &first.interpretation
            );
        }
    }

    #[test]
    fn invalid_config_is_refused() {
        let config = AnalyzerConfig {
            moderate_threshold_percent: 60.0,
            ..AnalyzerConfig::default()
        };
        assert!(Analyzer::new(config, NutrientReferenceTable::standard()).is_err());
    }
}
