use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use portal_core::{
    Analyzer, AnalyzerConfig, NutrientMapping, NutrientReferenceTable, PanelReport,
};
use portal_fhir::analyze_str;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "portal-cli",
    about = "Analyze a lab panel (FHIR bundle or JSON results) and summarize recommendations."
)]
struct Args {
    /// Path to the panel JSON file.
    #[arg(short, long)]
    input: PathBuf,

    /// Analyzer thresholds as JSON; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Alternate nutrient reference table (JSON array of mappings).
    #[arg(short, long)]
    reference: Option<PathBuf>,

    /// Print the full report as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::debug!(input = ?args.input, "reading panel");
    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Could not read file {:?}", args.input))?;

    let config = match &args.config {
        Some(path) => read_json::<AnalyzerConfig>(path)?,
        None => AnalyzerConfig::default(),
    };

    let reference = match &args.reference {
        Some(path) => NutrientReferenceTable::new(read_json::<Vec<NutrientMapping>>(path)?)
            .with_context(|| format!("Invalid reference table {path:?}"))?,
        None => NutrientReferenceTable::standard(),
    };

    let analyzer = Analyzer::new(config, reference).context("Invalid analyzer config")?;
    let report = analyze_str(&data, &analyzer)
        .with_context(|| format!("Could not analyze {:?}", args.input))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("Could not read file {path:?}"))?;
    serde_json::from_str(&text).with_context(|| format!("Could not parse {path:?}"))
}

fn print_summary(report: &PanelReport) {
    let summary = &report.summary;
    println!(
        "Generated at: {}\nOverall health: {:?}\nAnalyzed: {}\nFollow-ups: {}",
        report.generated_at,
        summary.overall_health,
        report.analyses.len(),
        report.follow_ups().count()
    );

    if !summary.key_findings.is_empty() {
        println!("\nKey findings:");
        for finding in &summary.key_findings {
            println!("  - {finding}");
        }
    }

    if !summary.ranked_supplements.is_empty() {
        println!("\nSupplements:");
        for supplement in &summary.ranked_supplements {
            println!(
                "  - {} [{:?}] ({})",
                supplement.supplement_id, supplement.priority, supplement.test_name
            );
        }
    }

    if !summary.rejected.is_empty() {
        println!("\nRejected results:");
        for rejected in &summary.rejected {
            println!("  - {}: {}", rejected.test_id, rejected.reason);
        }
    }
}
