use crate::{Severity, TestResult, TestStatus};

/// Plain-language explanation of one result.
pub fn interpret(result: &TestResult, status: TestStatus, severity: Severity) -> String {
    let direction = match status {
        TestStatus::Normal => {
            return format!(
                "Your {} level is within the normal range.",
                result.test_name
            )
        }
        TestStatus::Low => "below",
        TestStatus::High => "above",
    };

    let adverb = match severity {
        Severity::Mild => "slightly",
        Severity::Moderate => "moderately",
        Severity::Severe => "significantly",
    };

    let range = format!(
        "{}-{} {}",
        result.reference_min, result.reference_max, result.unit
    );

    format!(
        "Your {} level ({} {}) is {adverb} {direction} the optimal range ({range}). \
         This may indicate a need for intervention.",
        result.test_name, result.value, result.unit
    )
}
