//! HTTP feed client backed by `feed-rs`.
//!
//! Downloads a feed over HTTP(S) and hands the body to `feed-rs`, which
//! understands RSS, Atom and JSON Feed. Publication dates come back from the
//! parser as timestamps and are re-rendered in RFC 2822, the format RSS
//! `<pubDate>` uses.

use super::{FeedEntry, FeedError, FetchFeed};
use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::Client;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, instrument};

const USER_AGENT: &str = concat!("news_gap/", env!("CARGO_PKG_VERSION"));

/// Feed client that fetches over HTTP and parses with `feed-rs`.
#[derive(Debug, Clone)]
pub struct HttpFeedClient {
    client: Client,
    timeout: Option<Duration>,
}

impl HttpFeedClient {
    /// Build a client. With `timeout` set to `None` requests may block
    /// indefinitely.
    pub fn new(timeout: Option<Duration>) -> Result<Self, FeedError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            timeout,
        })
    }

    #[instrument(level = "info", skip(self))]
    async fn fetch_entries(&self, url: &str) -> Result<Vec<FeedEntry>, FeedError> {
        let response = self.client.get(url).send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status));
        }
        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        debug!(bytes = body.len(), "Downloaded feed");

        parse_feed(&body)
    }

    fn classify(&self, e: reqwest::Error) -> FeedError {
        match self.timeout {
            Some(timeout) if e.is_timeout() => FeedError::Timeout(timeout),
            _ => FeedError::Http(e),
        }
    }
}

impl FetchFeed for HttpFeedClient {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>, Box<dyn Error>> {
        Ok(self.fetch_entries(url).await?)
    }
}

/// Parse an already-downloaded feed document.
pub fn parse_feed(body: &[u8]) -> Result<Vec<FeedEntry>, FeedError> {
    let feed = parser::parse(body)?;
    Ok(feed.entries.into_iter().map(entry_from_feed).collect())
}

fn entry_from_feed(entry: Entry) -> FeedEntry {
    FeedEntry {
        title: entry.title.map(|t| t.content),
        summary: entry.summary.map(|t| t.content),
        description: entry.content.and_then(|c| c.body),
        link: entry.links.into_iter().next().map(|l| l.href),
        published: entry.published.or(entry.updated).map(|d| d.to_rfc2822()),
    }
}
