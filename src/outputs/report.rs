//! Plain-text perspective gap report.
//!
//! Renders an [`AnalysisResult`] into a fixed-layout report. Fields the model
//! left out are shown as placeholder text, so rendering never fails.

use crate::models::{AnalysisResult, TopicAnalysis};
use chrono::Local;
use itertools::Itertools;

const HEAVY_RULE: &str = "======================================================================";
const LIGHT_RULE: &str = "----------------------------------------------------------------------";

/// Render the report, using today's local date if the analysis has none.
pub fn generate_report(analysis: &AnalysisResult) -> String {
    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    render_report(analysis, &today)
}

/// Render the report with an explicit fallback date.
///
/// Pure: identical inputs always produce identical text.
pub fn render_report(analysis: &AnalysisResult, fallback_date: &str) -> String {
    let mut lines: Vec<String> = vec![
        HEAVY_RULE.to_string(),
        "GLOBAL EMPATHY NEWS - Perspective Gap Report".to_string(),
        HEAVY_RULE.to_string(),
        format!(
            "\nAnalysis Date: {}",
            analysis.analysis_date().as_deref().unwrap_or(fallback_date)
        ),
        format!(
            "Overall Gap Score: {}/100",
            analysis.overall_gap_score().as_deref().unwrap_or("N/A")
        ),
        format!(
            "\nSummary: {}",
            analysis.summary().as_deref().unwrap_or("No summary available")
        ),
        format!("\n{LIGHT_RULE}"),
        "TOPIC ANALYSIS".to_string(),
        LIGHT_RULE.to_string(),
    ];

    for (i, topic) in analysis.topics().iter().enumerate() {
        push_topic(&mut lines, i + 1, topic);
    }

    lines.push(format!("\n{HEAVY_RULE}"));
    lines.push("END OF REPORT".to_string());
    lines.push(HEAVY_RULE.to_string());

    lines.join("\n")
}

fn push_topic(lines: &mut Vec<String>, number: usize, topic: &TopicAnalysis<'_>) {
    lines.push(format!(
        "\n{number}. {}",
        topic.topic_name().as_deref().unwrap_or("Unknown Topic")
    ));
    lines.push(format!(
        "   Gap Score: {}/100 ({})",
        topic.gap_score().as_deref().unwrap_or("N/A"),
        topic.gap_level().as_deref().unwrap_or("Unknown")
    ));
    lines.push(format!("   Sources: {}", topic.sources_covering().iter().join(", ")));
    lines.push("\n   Key Differences:".to_string());
    lines.push(format!(
        "   {}",
        topic
            .key_differences()
            .as_deref()
            .unwrap_or("No differences noted")
    ));
    lines.push("\n   Perspectives:".to_string());
    for (source, perspective) in topic.perspective_summary() {
        lines.push(format!("   - {source}: {perspective}"));
    }
    lines.push(String::new());
}
