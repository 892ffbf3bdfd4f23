//! Lab panel intake: FHIR `Bundle` or plain JSON results to `TestResult`s.

use chrono::{DateTime, Utc};
use portal_core::{Analyzer, PanelReport, PortalError, TestResult, TestStatus};
use serde_json::Value;

/// Analyze a panel from a JSON string.
pub fn analyze_str(input_json: &str, analyzer: &Analyzer) -> Result<PanelReport, PortalError> {
    let value: Value =
        serde_json::from_str(input_json).map_err(|err| PortalError::Parse(err.to_string()))?;
    analyze_value(&value, analyzer)
}

/// Analyze a panel from a `serde_json::Value`.
pub fn analyze_value(input: &Value, analyzer: &Analyzer) -> Result<PanelReport, PortalError> {
    let results = results_from_value(input)?;
    Ok(analyzer.analyze_panel(&results))
}

/// Read test results from either a FHIR `Bundle` or a JSON array of results.
pub fn results_from_value(input: &Value) -> Result<Vec<TestResult>, PortalError> {
    if input.is_array() {
        return serde_json::from_value(input.clone())
            .map_err(|err| PortalError::Parse(err.to_string()));
    }

    let resource_type = input
        .get("resourceType")
        .and_then(Value::as_str)
        .ok_or(PortalError::MissingData)?;

    if resource_type != "Bundle" {
        return Err(PortalError::Parse(format!(
            "Expected resourceType Bundle, received {resource_type}"
        )));
    }

    let entries = input
        .get("entry")
        .and_then(Value::as_array)
        .ok_or(PortalError::MissingData)?;

    let mut results = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let Some(resource) = entry.get("resource") else {
            continue;
        };

        if resource.get("resourceType").and_then(Value::as_str) != Some("Observation") {
            continue;
        }

        match observation_to_result(resource, index) {
            Some(result) => results.push(result),
            None => tracing::debug!(
                id = %resource_id(resource, index),
                "skipping observation without numeric value or reference range"
            ),
        }
    }

    Ok(results)
}

fn observation_to_result(resource: &Value, index: usize) -> Option<TestResult> {
    let test_name = resource.get("code").and_then(extract_codeable_text)?;

    let quantity = resource.get("valueQuantity")?;
    let value = quantity.get("value").and_then(Value::as_f64)?;
    let unit = quantity
        .get("unit")
        .or_else(|| quantity.get("code"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let range = resource
        .get("referenceRange")
        .and_then(Value::as_array)
        .and_then(|ranges| ranges.first())?;
    let reference_min = range.get("low").and_then(quantity_value)?;
    let reference_max = range.get("high").and_then(quantity_value)?;

    Some(TestResult {
        test_id: resource_id(resource, index),
        test_name,
        value,
        unit,
        reference_min,
        reference_max,
        status: status_from_interpretation(resource),
        collected_at: extract_datetime(
            resource,
            &["effectiveDateTime", "effectiveInstant", "effectivePeriod", "issued"],
        ),
    })
}

fn quantity_value(value: &Value) -> Option<f64> {
    value.get("value").and_then(Value::as_f64)
}

fn status_from_interpretation(resource: &Value) -> Option<TestStatus> {
    let interpretation = resource.get("interpretation")?.as_array()?;
    for entry in interpretation {
        let codes = entry
            .get("coding")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|coding| coding.get("code").and_then(Value::as_str))
            .map(str::to_string)
            .chain(extract_codeable_text(entry));

        for code in codes {
            match code.to_lowercase().as_str() {
                "l" | "ll" | "lu" | "low" => return Some(TestStatus::Low),
                "h" | "hh" | "hu" | "high" => return Some(TestStatus::High),
                "n" | "normal" => return Some(TestStatus::Normal),
                _ => {}
            }
        }
    }
    None
}

fn extract_codeable_text(value: &Value) -> Option<String> {
    if let Some(text) = value.get("text").and_then(Value::as_str) {
        if !text.trim().is_empty() {
            return Some(text.trim().to_string());
        }
    }

    if let Some(codings) = value.get("coding").and_then(Value::as_array) {
        for coding in codings {
            if let Some(display) = coding.get("display").and_then(Value::as_str) {
                if !display.trim().is_empty() {
                    return Some(display.trim().to_string());
                }
            }
            if let Some(code) = coding.get("code").and_then(Value::as_str) {
                if !code.trim().is_empty() {
                    return Some(code.trim().to_string());
                }
            }
        }
    }

    None
}

fn resource_id(resource: &Value, index: usize) -> String {
    resource
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("observation-{index}"))
}

fn extract_datetime(resource: &Value, fields: &[&str]) -> Option<DateTime<Utc>> {
    for field in fields {
        let Some(value) = resource.get(*field) else {
            continue;
        };

        if let Some(text) = value.as_str() {
            if let Some(dt) = parse_datetime(text) {
                return Some(dt);
            }
        }

        if let Some(start) = value.get("start").and_then(Value::as_str) {
            if let Some(dt) = parse_datetime(start) {
                return Some(dt);
            }
        }
    }
    None
}

fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
