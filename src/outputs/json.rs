//! Persist a run's analysis, collected articles and report.
//!
//! # Output Structure
//!
//! Every run writes three timestamped files and refreshes two fixed-name
//! copies of the latest results:
//! ```text
//! output_dir/
//! ├── analysis_20250506_143000.json
//! ├── news_data_20250506_143000.json
//! ├── report_20250506_143000.txt
//! ├── latest_analysis.json
//! └── latest_report.txt
//! ```
//!
//! JSON is pretty-printed with two-space indentation and written as UTF-8
//! with non-ASCII characters kept literal. Files are overwritten whole.

use crate::models::{AnalysisResult, NewsSnapshot};
use crate::outputs::report::generate_report;
use crate::utils::{ensure_writable_dir, run_timestamp};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

pub const LATEST_ANALYSIS_FILE: &str = "latest_analysis.json";
pub const LATEST_REPORT_FILE: &str = "latest_report.txt";

/// Paths written by [`save_results`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifacts {
    pub analysis: PathBuf,
    pub news_data: PathBuf,
    pub report: PathBuf,
    pub latest_analysis: PathBuf,
    pub latest_report: PathBuf,
}

/// Serialize a value as two-space-indented JSON.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Save the run's outputs, keyed by the current UTC time.
pub async fn save_results(
    analysis: &AnalysisResult,
    snapshot: &NewsSnapshot,
    output_dir: &Path,
) -> Result<SavedArtifacts, Box<dyn Error>> {
    save_results_at(analysis, snapshot, output_dir, Utc::now()).await
}

/// Save the run's outputs, keyed by `at`.
///
/// Creates `output_dir` if needed. Any write failure is returned; files
/// written before the failure are left in place.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn save_results_at(
    analysis: &AnalysisResult,
    snapshot: &NewsSnapshot,
    output_dir: &Path,
    at: DateTime<Utc>,
) -> Result<SavedArtifacts, Box<dyn Error>> {
    ensure_writable_dir(output_dir).await?;
    let timestamp = run_timestamp(at);

    let artifacts = SavedArtifacts {
        analysis: output_dir.join(format!("analysis_{timestamp}.json")),
        news_data: output_dir.join(format!("news_data_{timestamp}.json")),
        report: output_dir.join(format!("report_{timestamp}.txt")),
        latest_analysis: output_dir.join(LATEST_ANALYSIS_FILE),
        latest_report: output_dir.join(LATEST_REPORT_FILE),
    };

    let analysis_json = to_pretty_json(analysis)?;
    fs::write(&artifacts.analysis, &analysis_json).await?;
    println!("\nAnalysis saved to: {}", artifacts.analysis.display());

    let news_json = to_pretty_json(snapshot)?;
    fs::write(&artifacts.news_data, &news_json).await?;
    println!("News data saved to: {}", artifacts.news_data.display());

    let report = generate_report(analysis);
    fs::write(&artifacts.report, &report).await?;
    println!("Report saved to: {}", artifacts.report.display());

    fs::write(&artifacts.latest_analysis, &analysis_json).await?;
    fs::write(&artifacts.latest_report, &report).await?;

    println!("\nLatest results also saved as:");
    println!("  - {}", artifacts.latest_analysis.display());
    println!("  - {}", artifacts.latest_report.display());

    info!(%timestamp, "Wrote analysis, news data and report");
    Ok(artifacts)
}
