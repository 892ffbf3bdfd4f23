//! Status, deviation and severity of a single result.

use crate::{AnalyzerConfig, PortalError, Severity, TestResult, TestStatus};

/// Status and deviation recomputed from the reference bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized {
    pub status: TestStatus,
    pub deviation_percent: f64,
}

/// Position of the value relative to `[reference_min, reference_max]`.
pub fn classify_status(result: &TestResult) -> TestStatus {
    if result.value < result.reference_min {
        TestStatus::Low
    } else if result.value > result.reference_max {
        TestStatus::High
    } else {
        TestStatus::Normal
    }
}

/// Distance outside the violated bound, as a percent of that bound.
pub fn deviation_percent(result: &TestResult, status: TestStatus) -> Result<f64, PortalError> {
    let (distance, bound) = match status {
        TestStatus::Normal => return Ok(0.0),
        TestStatus::Low => (result.reference_min - result.value, result.reference_min),
        TestStatus::High => (result.value - result.reference_max, result.reference_max),
    };

    if bound == 0.0 {
        return Err(PortalError::ZeroReferenceBound {
            test_name: result.test_name.clone(),
        });
    }

    Ok((distance / bound.abs()) * 100.0)
}

/// Validate the result, then derive its status and deviation.
pub fn normalize(result: &TestResult) -> Result<Normalized, PortalError> {
    if !result.value.is_finite()
        || !result.reference_min.is_finite()
        || !result.reference_max.is_finite()
    {
        return Err(PortalError::NonFiniteValue {
            test_name: result.test_name.clone(),
        });
    }

    if result.reference_min > result.reference_max {
        return Err(PortalError::InvertedRange {
            test_name: result.test_name.clone(),
            min: result.reference_min,
            max: result.reference_max,
        });
    }

    let status = classify_status(result);
    if let Some(supplied) = result.status {
        if supplied != status {
            tracing::debug!(
                test_id = %result.test_id,
                ?supplied,
                derived = ?status,
                "overriding caller-supplied status"
            );
        }
    }

    Ok(Normalized {
        status,
        deviation_percent: deviation_percent(result, status)?,
    })
}

/// Severity tier for a deviation. Upper bounds are exclusive: exactly the
/// moderate threshold is moderate, exactly the severe threshold is severe.
pub fn classify_severity(
    deviation_percent: f64,
    status: TestStatus,
    config: &AnalyzerConfig,
) -> Severity {
    if status == TestStatus::Normal {
        return Severity::Mild;
    }

    if deviation_percent < config.moderate_threshold_percent {
        Severity::Mild
    } else if deviation_percent < config.severe_threshold_percent {
        Severity::Moderate
    } else {
        Severity::Severe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn result(value: f64, min: f64, max: f64) -> TestResult {
        TestResult {
            test_id: "t-1".to_string(),
            test_name: "Vitamin D (25-OH)".to_string(),
            value,
            unit: "ng/mL".to_string(),
            reference_min: min,
            reference_max: max,
            status: None,
            collected_at: None,
        }
    }

    #[test]
    fn low_vitamin_d_is_forty_percent_below() {
        let normalized = normalize(&result(18.0, 30.0, 50.0)).unwrap();
        assert_eq!(normalized.status, TestStatus::Low);
        assert_eq!(normalized.deviation_percent, 40.0);
    }

    #[test]
    fn boundary_deviations_round_to_threshold() {
        let config = AnalyzerConfig::default();

        let forty = normalize(&result(1.74, 2.9, 5.0)).unwrap();
        assert_eq!(forty.deviation_percent, 40.0);
        assert_eq!(
            classify_severity(forty.deviation_percent, forty.status, &config),
            Severity::Severe
        );

        let twenty = normalize(&result(3.44, 4.3, 6.0)).unwrap();
        assert_eq!(twenty.deviation_percent, 20.0);
        assert_eq!(
            classify_severity(twenty.deviation_percent, twenty.status, &config),
            Severity::Moderate
        );
    }

    #[test]
    fn high_value_measures_against_max() {
        let normalized = normalize(&result(75.0, 30.0, 50.0)).unwrap();
        assert_eq!(normalized.status, TestStatus::High);
        assert_eq!(normalized.deviation_percent, 50.0);
    }

    #[test]
    fn bounds_are_inclusive_for_normal() {
        assert_eq!(classify_status(&result(30.0, 30.0, 50.0)), TestStatus::Normal);
        assert_eq!(classify_status(&result(50.0, 30.0, 50.0)), TestStatus::Normal);
    }

    #[test]
    fn supplied_status_is_overridden() {
        let mut input = result(40.0, 30.0, 50.0);
        input.status = Some(TestStatus::Low);
        assert_eq!(normalize(&input).unwrap().status, TestStatus::Normal);
    }

    #[test]
    fn zero_lower_bound_is_rejected_when_low() {
        let err = normalize(&result(-1.0, 0.0, 5.0)).unwrap_err();
        assert!(matches!(err, PortalError::ZeroReferenceBound { .. }));
        // The same range is fine while the value sits inside it.
        assert_eq!(normalize(&result(1.0, 0.0, 5.0)).unwrap().deviation_percent, 0.0);
    }

    #[test]
    fn inverted_and_non_finite_inputs_are_rejected() {
        assert!(matches!(
            normalize(&result(10.0, 50.0, 30.0)),
            Err(PortalError::InvertedRange { .. })
        ));
        assert!(matches!(
            normalize(&result(f64::NAN, 30.0, 50.0)),
            Err(PortalError::NonFiniteValue { .. })
        ));
    }

    #[test]
    fn severity_boundaries() {
        let config = AnalyzerConfig::default();
        assert_eq!(classify_severity(19.99, TestStatus::Low, &config), Severity::Mild);
        assert_eq!(classify_severity(20.0, TestStatus::Low, &config), Severity::Moderate);
        assert_eq!(classify_severity(39.99, TestStatus::High, &config), Severity::Moderate);
        assert_eq!(classify_severity(40.0, TestStatus::High, &config), Severity::Severe);
        assert_eq!(classify_severity(90.0, TestStatus::Normal, &config), Severity::Mild);
    }

    #[test]
    fn custom_thresholds_apply() {
        let config = AnalyzerConfig {
            moderate_threshold_percent: 10.0,
            severe_threshold_percent: 25.0,
            ..AnalyzerConfig::default()
        };
        assert_eq!(classify_severity(12.0, TestStatus::Low, &config), Severity::Moderate);
        assert_eq!(classify_severity(25.0, TestStatus::Low, &config), Severity::Severe);
    }

    proptest! {
        #[test]
        fn normal_results_have_no_deviation(min in 1.0f64..100.0, span in 0.0f64..100.0, t in 0.0f64..=1.0) {
            let max = min + span;
            let value = min + span * t;
            let normalized = normalize(&result(value, min, max)).unwrap();
            prop_assert_eq!(normalized.status, TestStatus::Normal);
            prop_assert_eq!(normalized.deviation_percent, 0.0);
            prop_assert_eq!(
                classify_severity(normalized.deviation_percent, normalized.status, &AnalyzerConfig::default()),
                Severity::Mild
            );
        }

        #[test]
        fn severity_is_monotonic(a in 0.0f64..200.0, b in 0.0f64..200.0, low in any::<bool>()) {
            let status = if low { TestStatus::Low } else { TestStatus::High };
            let config = AnalyzerConfig::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(classify_severity(lo, status, &config) <= classify_severity(hi, status, &config));
        }

        #[test]
        fn normalize_is_idempotent(value in 0.0f64..200.0, min in 1.0f64..100.0, span in 0.0f64..100.0) {
            let input = result(value, min, min + span);
            prop_assert_eq!(normalize(&input).unwrap(), normalize(&input).unwrap());
        }
    }
}
