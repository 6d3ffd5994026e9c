//! The end-to-end run: collect, analyze, save, summarize.
//!
//! Each step only starts if the previous one produced something usable. An
//! empty collection or a failed analysis ends the run early without writing
//! any files; that is a normal outcome, not an error. Only filesystem
//! failures while saving are returned as errors.

use crate::analysis::Analyst;
use crate::collector::collect_news;
use crate::models::{AnalysisResult, SourceDescriptor};
use crate::outputs::json::{SavedArtifacts, save_results};
use crate::scrapers::FetchFeed;
use chrono::Utc;
use std::error::Error;
use std::path::Path;
use tracing::{error, info, instrument};

const BANNER_RULE: &str = "======================================================================";

/// What the console summary reports about a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// The overall score as the model wrote it.
    pub overall_gap_score: Option<String>,
    pub topic_count: usize,
    /// `(topic name, gap score)` for every topic scoring 60 or more.
    pub high_gap_topics: Vec<(String, Option<String>)>,
}

impl RunSummary {
    pub fn from_analysis(analysis: &AnalysisResult) -> Self {
        Self {
            overall_gap_score: analysis.overall_gap_score(),
            topic_count: analysis.topics().len(),
            high_gap_topics: analysis
                .high_gap_topics()
                .into_iter()
                .map(|topic| {
                    (
                        topic.topic_name().unwrap_or_else(|| "Unknown Topic".to_string()),
                        topic.gap_score(),
                    )
                })
                .collect(),
        }
    }

    /// Console lines for the summary, without the surrounding banner.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Overall Gap Score: {}/100", score_or_na(self.overall_gap_score.as_deref())),
            format!("Topics Analyzed: {}", self.topic_count),
        ];
        if !self.high_gap_topics.is_empty() {
            lines.push("\nHigh Gap Topics (score >= 60):".to_string());
            for (name, score) in &self.high_gap_topics {
                lines.push(format!("  - {name}: {}/100", score_or_na(score.as_deref())));
            }
        }
        lines
    }
}

fn score_or_na(score: Option<&str>) -> &str {
    score.unwrap_or("N/A")
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// No source returned any article; nothing was analyzed or written.
    NoArticles,
    /// The analysis step produced no usable result; nothing was written.
    AnalysisFailed,
    Completed {
        summary: RunSummary,
        artifacts: SavedArtifacts,
    },
}

/// Run the whole pipeline once.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn run_pipeline<F, A>(
    fetcher: &F,
    analyst: &A,
    sources: &[SourceDescriptor],
    max_articles: usize,
    output_dir: &Path,
) -> Result<RunOutcome, Box<dyn Error>>
where
    F: FetchFeed,
    A: Analyst,
{
    println!("\n{BANNER_RULE}");
    println!("GLOBAL EMPATHY NEWS - Starting Analysis");
    println!("{BANNER_RULE}");
    println!("Timestamp: {}", Utc::now().to_rfc3339());
    println!();

    println!("Step 1: Collecting news from sources...");
    let snapshot = collect_news(fetcher, sources, max_articles).await;
    let total_articles = snapshot.total_articles();
    println!("\nTotal articles collected: {total_articles}");
    info!(total_articles, sources = snapshot.source_count(), "Collection finished");

    if total_articles == 0 {
        println!("Error: No articles collected. Exiting.");
        error!("No articles collected; skipping analysis");
        return Ok(RunOutcome::NoArticles);
    }

    println!("\nStep 2: Analyzing perspectives with Gemini AI...");
    let Some(analysis) = analyst.analyze(&snapshot).await else {
        println!("Error: Analysis failed. Exiting.");
        error!("Analysis produced no result; nothing saved");
        return Ok(RunOutcome::AnalysisFailed);
    };

    println!("\nStep 3: Saving results...");
    let artifacts = save_results(&analysis, &snapshot, output_dir).await?;

    let summary = RunSummary::from_analysis(&analysis);
    println!("\n{BANNER_RULE}");
    println!("ANALYSIS COMPLETE");
    println!("{BANNER_RULE}");
    for line in summary.lines() {
        println!("{line}");
    }
    println!("\n{BANNER_RULE}");
    info!(
        topics = summary.topic_count,
        high_gap = summary.high_gap_topics.len(),
        "Run complete"
    );

    Ok(RunOutcome::Completed { summary, artifacts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewsSnapshot;
    use crate::scrapers::FeedEntry;
    use std::cell::Cell;
    use std::collections::HashMap;

    const CANNED: &str = r#"{
        "analysis_date": "2025-05-06",
        "topics": [
            {"topic_name": "Sanctions", "gap_score": 75, "gap_level": "High"},
            {"topic_name": "Weather", "gap_score": 30, "gap_level": "Low"},
            {"topic_name": "Elections", "gap_score": 60, "gap_level": "Moderate"}
        ],
        "overall_gap_score": 55,
        "summary": "Mixed"
    }"#;

    struct CannedFeeds(HashMap<String, Vec<FeedEntry>>);

    impl FetchFeed for CannedFeeds {
        async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>, Box<dyn Error>> {
            self.0.get(url).cloned().ok_or_else(|| "timed out".into())
        }
    }

    /// Returns a fixed analysis (or none) and counts how often it is asked.
    struct StubAnalyst {
        reply: Option<AnalysisResult>,
        calls: Cell<usize>,
        seen_articles: Cell<usize>,
    }

    impl StubAnalyst {
        fn new(reply: Option<&str>) -> Self {
            Self {
                reply: reply.map(|r| serde_json::from_str(r).unwrap()),
                calls: Cell::new(0),
                seen_articles: Cell::new(0),
            }
        }
    }

    impl Analyst for StubAnalyst {
        async fn analyze(&self, snapshot: &NewsSnapshot) -> Option<AnalysisResult> {
            self.calls.set(self.calls.get() + 1);
            self.seen_articles.set(snapshot.total_articles());
            self.reply.clone()
        }
    }

    fn sources() -> Vec<SourceDescriptor> {
        ["One", "Two", "Three"]
            .into_iter()
            .map(|name| SourceDescriptor {
                name: name.to_string(),
                url: format!("https://{}.example/rss", name.to_lowercase()),
                region: "R".to_string(),
                bias_tendency: "B".to_string(),
            })
            .collect()
    }

    fn entries(n: usize) -> Vec<FeedEntry> {
        (0..n)
            .map(|i| FeedEntry {
                title: Some(format!("Story {i}")),
                ..Default::default()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_partial_collection_proceeds_to_analysis() {
        let tmp = tempfile::tempdir().unwrap();
        let feeds = CannedFeeds(HashMap::from([
            ("https://one.example/rss".to_string(), entries(2)),
            ("https://two.example/rss".to_string(), vec![]),
        ]));
        let analyst = StubAnalyst::new(Some(CANNED));

        let outcome = run_pipeline(&feeds, &analyst, &sources(), 15, tmp.path()).await.unwrap();

        assert_eq!(analyst.calls.get(), 1);
        assert_eq!(analyst.seen_articles.get(), 2);
        match outcome {
            RunOutcome::Completed { artifacts, .. } => {
                assert!(artifacts.latest_analysis.is_file());
                assert!(artifacts.news_data.is_file());
            }
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_articles_aborts_before_analysis_and_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("output");
        let feeds = CannedFeeds(HashMap::new());
        let analyst = StubAnalyst::new(Some(CANNED));

        let outcome = run_pipeline(&feeds, &analyst, &sources(), 15, &out).await.unwrap();

        assert!(matches!(outcome, RunOutcome::NoArticles));
        assert_eq!(analyst.calls.get(), 0);
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_failed_analysis_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("output");
        let feeds = CannedFeeds(HashMap::from([("https://one.example/rss".to_string(), entries(1))]));
        let analyst = StubAnalyst::new(None);

        let outcome = run_pipeline(&feeds, &analyst, &sources(), 15, &out).await.unwrap();

        assert!(matches!(outcome, RunOutcome::AnalysisFailed));
        assert_eq!(analyst.calls.get(), 1);
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_summary_lists_high_gap_topics_inclusive() {
        let tmp = tempfile::tempdir().unwrap();
        let feeds = CannedFeeds(HashMap::from([("https://three.example/rss".to_string(), entries(3))]));
        let analyst = StubAnalyst::new(Some(CANNED));

        let outcome = run_pipeline(&feeds, &analyst, &sources(), 15, tmp.path()).await.unwrap();

        let RunOutcome::Completed { summary, .. } = outcome else {
            panic!("expected Completed");
        };
        assert_eq!(summary.topic_count, 3);
        let names: Vec<&str> = summary.high_gap_topics.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Sanctions", "Elections"]);
    }

    #[test]
    fn test_summary_lines() {
        let analysis: AnalysisResult = serde_json::from_str(CANNED).unwrap();
        let lines = RunSummary::from_analysis(&analysis).lines();
        assert_eq!(
            lines,
            vec![
                "Overall Gap Score: 55/100",
                "Topics Analyzed: 3",
                "\nHigh Gap Topics (score >= 60):",
                "  - Sanctions: 75/100",
                "  - Elections: 60/100",
            ]
        );
    }

    #[test]
    fn test_summary_with_string_scores() {
        let analysis: AnalysisResult = serde_json::from_str(
            r#"{"overall_gap_score": "70", "topics": [{"topic_name": "Border", "gap_score": "85"}, {"gap_score": null}]}"#,
        )
        .unwrap();
        let lines = RunSummary::from_analysis(&analysis).lines();
        assert_eq!(
            lines,
            vec![
                "Overall Gap Score: 70/100",
                "Topics Analyzed: 2",
                "\nHigh Gap Topics (score >= 60):",
                "  - Border: 85/100",
            ]
        );
    }

    #[test]
    fn test_summary_without_high_gap_topics() {
        let analysis: AnalysisResult =
            serde_json::from_str(r#"{"topics": [{"topic_name": "Calm", "gap_score": 59}]}"#).unwrap();
        let lines = RunSummary::from_analysis(&analysis).lines();
        assert_eq!(lines, vec!["Overall Gap Score: N/A/100", "Topics Analyzed: 1"]);
    }
}
