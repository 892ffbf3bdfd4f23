//! Framework-neutral WASM <-> JavaScript bridge for panel analysis.

use portal_core::{Analyzer, AnalyzerConfig, NutrientReferenceTable, PortalError};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

/// Partial config from JS; missing fields keep their defaults.
#[derive(Deserialize, Default)]
struct JsAnalyzerConfig {
    #[serde(default)]
    moderate_threshold_percent: Option<f64>,
    #[serde(default)]
    severe_threshold_percent: Option<f64>,
    #[serde(default)]
    fair_moderate_count: Option<usize>,
}

impl From<JsAnalyzerConfig> for AnalyzerConfig {
    fn from(cfg: JsAnalyzerConfig) -> Self {
        let mut base = AnalyzerConfig::default();
        if let Some(percent) = cfg.moderate_threshold_percent {
            base.moderate_threshold_percent = percent;
        }
        if let Some(percent) = cfg.severe_threshold_percent {
            base.severe_threshold_percent = percent;
        }
        if let Some(count) = cfg.fair_moderate_count {
            base.fair_moderate_count = count;
        }
        base
    }
}

/// Analyze a FHIR bundle or an array of test results.
#[wasm_bindgen]
pub fn analyze_panel(input: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let input_value = from_value::<serde_json::Value>(input)
        .map_err(|err| JsValue::from_str(&format!("Could not read panel JSON: {err}")))?;

    let cfg = match config {
        Some(js_cfg) => {
            let cfg: JsAnalyzerConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Could not read config: {err}")))?;
            AnalyzerConfig::from(cfg)
        }
        None => AnalyzerConfig::default(),
    };

    let analyzer = Analyzer::new(cfg, NutrientReferenceTable::standard())
        .map_err(|err| JsValue::from_str(&format_portal_error(err)))?;

    let report = portal_fhir::analyze_value(&input_value, &analyzer)
        .map_err(|err| JsValue::from_str(&format_portal_error(err)))?;

    to_value(&report).map_err(|err| JsValue::from_str(&format!("Could not serialize report: {err}")))
}

fn format_portal_error(err: PortalError) -> String {
    format!("Panel analysis error: {err}")
}
