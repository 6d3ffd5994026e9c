//! # news_gap
//!
//! Collects world-news headlines from outlets in different regions, asks an
//! LLM which stories they share, and scores how far apart their framing is.
//!
//! ## Features
//!
//! - Reads RSS/Atom feeds from CNN, Al Jazeera and Global Times by default,
//!   or any sources listed in a YAML config file
//! - Sends a digest of the headlines to Google Gemini for topic matching and
//!   gap scoring (0-100, in five bands from Minimal to Extreme)
//! - Writes the analysis, the raw articles and a text report, plus
//!   `latest_*` copies for consumers that only want the newest run
//!
//! ## Usage
//!
//! ```sh
//! GEMINI_API_KEY=... news_gap -o ./output
//! ```
//!
//! ## Architecture
//!
//! The application runs a strictly sequential pipeline:
//! 1. **Collecting**: Fetch each feed in turn, keeping the first 15 entries
//! 2. **Analyzing**: Build one prompt and make one model call
//! 3. **Saving**: Write JSON and text outputs under the output directory
//! 4. **Summarizing**: Print the overall score and the high-gap topics

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod analysis;
mod api;
mod cli;
mod collector;
mod config;
mod models;
mod outputs;
mod pipeline;
mod prompt;
mod scrapers;
mod utils;

use analysis::GeminiAnalyst;
use cli::Cli;
use config::Settings;
use pipeline::{RunOutcome, run_pipeline};
use scrapers::rss::HttpFeedClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_gap starting up");

    let args = Cli::parse();
    debug!(?args.output_dir, ?args.config, model = ?args.model, "Parsed CLI arguments");

    let settings = match Settings::from_cli(&args) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    info!(
        sources = settings.sources.len(),
        output_dir = %settings.output_dir.display(),
        model = %settings.analyzer.model,
        "Loaded configuration"
    );

    let fetcher = HttpFeedClient::new(settings.feed_timeout)?;
    let analyst = GeminiAnalyst {
        settings: settings.analyzer.clone(),
    };

    let outcome = run_pipeline(
        &fetcher,
        &analyst,
        &settings.sources,
        settings.max_articles,
        &settings.output_dir,
    )
    .await
    .inspect_err(|e| error!(error = %e, "Failed to write results"))?;

    let elapsed = start_time.elapsed();
    match outcome {
        RunOutcome::Completed { summary, .. } => info!(
            ?elapsed,
            topics = summary.topic_count,
            high_gap = summary.high_gap_topics.len(),
            "Execution complete"
        ),
        RunOutcome::NoArticles => info!(?elapsed, "Execution ended early: no articles"),
        RunOutcome::AnalysisFailed => info!(?elapsed, "Execution ended early: analysis failed"),
    }

    Ok(())
}
