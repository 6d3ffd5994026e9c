//! Runtime configuration: the source registry and run settings.
//!
//! Settings are layered. Built-in defaults come first, an optional YAML file
//! overrides them, and command-line flags or environment variables override
//! both.
//!
//! # YAML Format
//!
//! ```yaml
//! model: gemini-1.5-flash
//! max_articles: 10
//! output_dir: ./reports
//! sources:
//!   - name: BBC
//!     url: https://feeds.bbci.co.uk/news/world/rss.xml
//!     region: Western (UK)
//!     bias_tendency: Center
//! ```

use crate::analysis::AnalyzerSettings;
use crate::api::DEFAULT_MODEL;
use crate::cli::Cli;
use crate::collector::MAX_ARTICLES_PER_SOURCE;
use crate::models::SourceDescriptor;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

/// Default directory for output files.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Built-in news sources, in collection order.
pub static NEWS_SOURCES: Lazy<Vec<SourceDescriptor>> = Lazy::new(|| {
    [
        ("CNN", "http://rss.cnn.com/rss/edition_world.rss", "Western (US)", "Center-Left"),
        ("Al Jazeera", "https://www.aljazeera.com/xml/rss/all.xml", "Middle East (Qatar)", "Center"),
        ("Global Times", "https://www.globaltimes.cn/rss/outbrain.xml", "East Asia (China)", "State-aligned"),
    ]
    .into_iter()
    .map(|(name, url, region, bias_tendency)| SourceDescriptor {
        name: name.to_string(),
        url: url.to_string(),
        region: region.to_string(),
        bias_tendency: bias_tendency.to_string(),
    })
    .collect()
});

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("source {name:?} has an invalid feed URL {url:?}: {source}")]
    InvalidUrl {
        name: String,
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("source {name:?} uses unsupported scheme {scheme:?}; expected http or https")]
    UnsupportedScheme { name: String, scheme: String },
    #[error("source {0:?} is listed more than once")]
    DuplicateSource(String),
    #[error("at least one source must be configured")]
    NoSources,
    #[error("max_articles must be at least 1")]
    ZeroMaxArticles,
}

/// Optional overrides read from a YAML file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub sources: Option<Vec<SourceDescriptor>>,
    pub model: Option<String>,
    pub max_articles: Option<usize>,
    pub output_dir: Option<PathBuf>,
}

impl FileConfig {
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub sources: Vec<SourceDescriptor>,
    pub output_dir: PathBuf,
    pub max_articles: usize,
    pub feed_timeout: Option<Duration>,
    pub analyzer: AnalyzerSettings,
}

impl Settings {
    /// Resolve settings from the CLI, loading the YAML file it names, if any.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli, file)
    }

    /// Merge CLI values over file values over defaults, then validate.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let sources = file.sources.unwrap_or_else(|| NEWS_SOURCES.clone());
        validate_sources(&sources)?;

        let max_articles = cli
            .max_articles
            .or(file.max_articles)
            .unwrap_or(MAX_ARTICLES_PER_SOURCE);
        if max_articles == 0 {
            return Err(ConfigError::ZeroMaxArticles);
        }

        let settings = Settings {
            sources,
            output_dir: cli
                .output_dir
                .clone()
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            max_articles,
            feed_timeout: cli.feed_timeout_secs.map(Duration::from_secs),
            analyzer: AnalyzerSettings {
                api_key: cli.gemini_api_key.clone(),
                model: cli
                    .model
                    .clone()
                    .or(file.model)
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                timeout: cli.model_timeout_secs.map(Duration::from_secs),
                max_retries: cli.max_retries,
            },
        };
        debug!(
            sources = settings.sources.len(),
            output_dir = %settings.output_dir.display(),
            model = %settings.analyzer.model,
            max_articles = settings.max_articles,
            "Resolved settings"
        );
        Ok(settings)
    }
}

/// Reject empty registries, duplicate names, and URLs that are not http(s).
pub fn validate_sources(sources: &[SourceDescriptor]) -> Result<(), ConfigError> {
    if sources.is_empty() {
        return Err(ConfigError::NoSources);
    }
    let mut seen = HashSet::new();
    for source in sources {
        if !seen.insert(source.name.as_str()) {
            return Err(ConfigError::DuplicateSource(source.name.clone()));
        }
        let parsed = Url::parse(&source.url).map_err(|e| ConfigError::InvalidUrl {
            name: source.name.clone(),
            url: source.url.clone(),
            source: e,
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme {
                name: source.name.clone(),
                scheme: parsed.scheme().to_string(),
            });
        }
    }
    Ok(())
}
