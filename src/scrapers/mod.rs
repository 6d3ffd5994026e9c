//! Feed clients for fetching entries from news syndication feeds.
//!
//! The collector never talks to the network directly; it goes through the
//! [`FetchFeed`] trait so a run can be driven by canned entries in tests.
//!
//! # Backends
//!
//! | Backend | Module | Method | Notes |
//! |---------|--------|--------|-------|
//! | HTTP + `feed-rs` | [`rss`] | GET, then parse RSS 0.9x/1.0/2.0, Atom or JSON Feed | Optional per-request timeout |
//!
//! # Entry Fields
//!
//! Feeds differ in which fields they carry. A [`FeedEntry`] keeps every field
//! optional; normalization into an [`Article`](crate::models::Article) happens
//! in the collector.

pub mod rss;

use std::error::Error;
use std::time::Duration;
use thiserror::Error as ThisError;

/// One entry from a syndication feed, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: Option<String>,
    /// Short summary (RSS `<description>`, Atom `<summary>`).
    pub summary: Option<String>,
    /// Longer body (RSS `<content:encoded>`, Atom `<content>`).
    pub description: Option<String>,
    pub link: Option<String>,
    pub published: Option<String>,
}

/// Trait for fetching and parsing a feed.
///
/// Implementors return the feed's entries in document order. Any failure,
/// from DNS to malformed XML, is reported through the error.
pub trait FetchFeed {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>, Box<dyn Error>>;
}

/// Failures while fetching a single feed.
#[derive(Debug, ThisError)]
pub enum FeedError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("could not parse feed: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),
}
