//! Prompt construction for the perspective-gap analysis.
//!
//! The prompt is a fixed instruction template wrapped around a plain-text
//! digest of the snapshot. It embeds the gap-score bands and a literal JSON
//! example the model is asked to reproduce.

use crate::models::{GapBand, NewsSnapshot};
use crate::utils::truncate_chars;
use std::fmt::Write;

/// Summaries longer than this many characters are cut in the digest.
pub const SUMMARY_CHAR_LIMIT: usize = 300;

/// Appended to summaries that were cut.
pub const TRUNCATION_MARKER: &str = "...";

const PREAMBLE: &str = "You are a news analysis expert specializing in identifying perspective gaps across international media.";

const SCHEMA_EXAMPLE: &str = r#"{
    "analysis_date": "YYYY-MM-DD",
    "topics": [
        {
            "topic_name": "Topic title",
            "gap_score": 75,
            "gap_level": "High",
            "sources_covering": ["CNN", "Al Jazeera"],
            "perspective_summary": {
                "CNN": "Brief summary of CNN's perspective",
                "Al Jazeera": "Brief summary of Al Jazeera's perspective",
                "Global Times": "Brief summary or 'Not covered' if not applicable"
            },
            "key_differences": "Explanation of the main perspective differences",
            "related_articles": [
                {"source": "CNN", "title": "Article title", "link": "URL"},
                {"source": "Al Jazeera", "title": "Article title", "link": "URL"}
            ]
        }
    ],
    "overall_gap_score": 65,
    "summary": "Brief overall analysis of the current news landscape perspective gaps"
}"#;

/// Apply the digest's truncation rule to one summary.
pub fn digest_summary(summary: &str) -> String {
    truncate_chars(summary, SUMMARY_CHAR_LIMIT, TRUNCATION_MARKER)
}

/// Render the per-source article listing embedded in the prompt.
pub fn render_digest(snapshot: &NewsSnapshot) -> String {
    let mut digest = String::new();
    for (source, articles) in snapshot.iter() {
        let _ = write!(digest, "\n\n=== {source} ===\n");
        for (i, article) in articles.iter().enumerate() {
            let _ = write!(digest, "\n{}. {}\n", i + 1, article.title);
            let _ = writeln!(digest, "   Summary: {}", digest_summary(&article.summary));
        }
    }
    digest
}

/// Describe the sources in snapshot order, e.g. "CNN (Western (US) perspective)".
///
/// Regions are the ones recorded with each source, so a source whose feed
/// returned nothing is still described. A source without a region is listed
/// by name only.
fn describe_sources(snapshot: &NewsSnapshot) -> String {
    let described: Vec<String> = snapshot
        .regions()
        .map(|(source, region)| match region {
            Some(region) => format!("{source} ({region} perspective)"),
            None => source.to_string(),
        })
        .collect();
    match described.as_slice() {
        [] => "the sources below".to_string(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

/// Build the full analysis prompt for a snapshot.
///
/// Deterministic: the same snapshot always yields the same text.
pub fn build_prompt(snapshot: &NewsSnapshot) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "{PREAMBLE}");
    let _ = writeln!(
        prompt,
        "\nAnalyze the following news articles from {}.\n",
        describe_sources(snapshot)
    );
    let _ = writeln!(prompt, "{}\n", render_digest(snapshot));
    prompt.push_str("Your task:\n");
    prompt.push_str("1. Identify 3-5 COMMON TOPICS that appear across multiple sources (topics covered by at least 2 sources)\n");
    prompt.push_str("2. For each common topic, analyze the perspective differences between sources\n");
    prompt.push_str("3. Calculate a \"Gap Score\" (0-100) for each topic:\n");
    for band in GapBand::ALL {
        let (low, high) = band.range();
        let _ = writeln!(prompt, "   - {low}-{high}: {}", band_description(band));
    }
    prompt.push_str("\nRespond in the following JSON format ONLY (no additional text):\n");
    prompt.push_str(SCHEMA_EXAMPLE);
    prompt.push('\n');
    prompt
}

fn band_description(band: GapBand) -> &'static str {
    match band {
        GapBand::Minimal => "Minimal perspective gap (factual reporting, similar framing)",
        GapBand::Low => "Low gap (minor differences in emphasis)",
        GapBand::Moderate => "Moderate gap (noticeable differences in framing or focus)",
        GapBand::High => "High gap (significant perspective differences, potential bias)",
        GapBand::Extreme => "Extreme gap (completely opposing narratives or interpretations)",
    }
}
