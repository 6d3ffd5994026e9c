//! Command-line interface definitions for news_gap.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! All arguments can be provided via command-line flags or environment variables.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the news_gap application.
///
/// Every option has a sensible default, so a bare invocation collects the
/// built-in sources and writes to `./output`.
///
/// # Examples
///
/// ```sh
/// # Basic usage, key taken from the environment
/// GEMINI_API_KEY=... news_gap
///
/// # Custom sources and output location
/// news_gap -c sources.yaml -o ./reports
///
/// # Bounded network calls with two retries for the model
/// news_gap --feed-timeout-secs 20 --model-timeout-secs 120 --max-retries 2
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for JSON and report files [default: output]
    #[arg(short, long, env = "NEWS_GAP_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Optional path to a YAML file overriding sources, model and limits
    #[arg(short, long, env = "NEWS_GAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model name [default: gemini-1.5-flash]
    #[arg(long, env = "GEMINI_MODEL")]
    pub model: Option<String>,

    /// Maximum articles kept per source [default: 15]
    #[arg(long)]
    pub max_articles: Option<usize>,

    /// Timeout for each feed request, in seconds (no timeout if unset)
    #[arg(long)]
    pub feed_timeout_secs: Option<u64>,

    /// Timeout for the model call, in seconds (no timeout if unset)
    #[arg(long)]
    pub model_timeout_secs: Option<u64>,

    /// Extra attempts for a failed model call, with exponential backoff
    #[arg(long, default_value_t = 0)]
    pub max_retries: usize,
}
