//! Collect recent articles from every configured source.
//!
//! Sources are fetched one at a time, in registry order. A source that cannot
//! be fetched or parsed contributes an empty list; the run carries on with
//! whatever the other sources returned.

use crate::models::{Article, NewsSnapshot, SourceDescriptor};
use crate::scrapers::{FeedEntry, FetchFeed};
use futures::stream::{self, StreamExt};
use tracing::{error, info, instrument};

/// Default cap on articles kept per source.
pub const MAX_ARTICLES_PER_SOURCE: usize = 15;

/// Fetch every source and assemble a [`NewsSnapshot`].
///
/// Each source keeps at most `max_articles` entries, in feed order. The
/// snapshot always has one key per source, even when its list is empty.
#[instrument(level = "info", skip_all, fields(sources = sources.len(), max_articles))]
pub async fn collect_news<F: FetchFeed>(
    fetcher: &F,
    sources: &[SourceDescriptor],
    max_articles: usize,
) -> NewsSnapshot {
    let collected: Vec<(&SourceDescriptor, Vec<Article>)> = stream::iter(sources)
        .then(|source| async move {
            println!("Fetching news from {}...", source.name);
            let articles = match fetcher.fetch(&source.url).await {
                Ok(entries) => {
                    let articles: Vec<Article> = entries
                        .into_iter()
                        .take(max_articles)
                        .map(|entry| normalize_entry(entry, source))
                        .collect();
                    println!("  -> Collected {} articles from {}", articles.len(), source.name);
                    info!(source = %source.name, count = articles.len(), "Collected articles");
                    articles
                }
                Err(e) => {
                    println!("  -> Error fetching from {}: {}", source.name, e);
                    error!(source = %source.name, url = %source.url, error = %e, "Feed fetch failed; continuing without this source");
                    Vec::new()
                }
            };
            (source, articles)
        })
        .collect()
        .await;

    let mut snapshot = NewsSnapshot::new();
    for (source, articles) in collected {
        snapshot.insert_source(source, articles);
    }
    snapshot
}

/// Turn a raw feed entry into an [`Article`] tagged with its source.
///
/// The summary falls back to the entry's longer description when the feed
/// has no summary; every other missing field becomes an empty string.
pub fn normalize_entry(entry: FeedEntry, source: &SourceDescriptor) -> Article {
    Article {
        title: entry.title.unwrap_or_default(),
        summary: entry.summary.or(entry.description).unwrap_or_default(),
        link: entry.link.unwrap_or_default(),
        published: entry.published.unwrap_or_default(),
        source: source.name.clone(),
        region: source.region.clone(),
        bias_tendency: source.bias_tendency.clone(),
    }
}
