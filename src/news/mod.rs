//! News widget: fetches the feed and tracks whether the newest article was seen.

pub mod feed;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::time::Duration;

use crate::errors::NewsError;
use crate::settings::Settings;

pub use feed::{NewsArticle, absolutize_sources, parse_feed};

/// Articles shown at most.
pub const MAX_ARTICLES: usize = 2;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2500);

/// What the launcher remembers about the newest article it has shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsCache {
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    /// SHA-1 hex digest of the article content.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub dismissed: bool,
}

/// Result of a news refresh.
#[derive(Debug, Clone, Default)]
pub struct NewsUpdate {
    pub articles: Vec<NewsArticle>,
    /// The newest article changed since the cache was last written.
    pub changed: bool,
    /// The user has not dismissed the newest article yet.
    pub unread: bool,
}

/// SHA-1 hex digest of article content.
pub fn digest(content: &str) -> String {
    hex::encode(Sha1::digest(content.as_bytes()))
}

pub struct NewsWidget {
    client: Client,
    feed_url: String,
    host: Option<String>,
    default_author: String,
    timeout: Duration,
}

impl NewsWidget {
    pub fn new(feed_url: impl Into<String>, host: Option<String>) -> Self {
        Self {
            client: Client::new(),
            feed_url: feed_url.into(),
            host,
            default_author: "Staff".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_default_author(mut self, author: impl Into<String>) -> Self {
        self.default_author = author.into();
        self
    }

    /// Fetch and parse the newest articles.
    pub async fn fetch(&self) -> Result<Vec<NewsArticle>, NewsError> {
        let body = self
            .client
            .get(&self.feed_url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_feed(
            &body,
            self.host.as_deref(),
            &self.default_author,
            MAX_ARTICLES,
        )
    }

    /// Fetch the feed and update the cache entry for the newest article.
    ///
    /// A failed fetch yields no articles; the error is logged.
    pub async fn refresh(&self, settings: &mut Settings) -> NewsUpdate {
        let articles = match self.fetch().await {
            Ok(articles) => articles,
            Err(e) => {
                tracing::warn!(target: "news", url = %self.feed_url, error = %e, "Failed to load news");
                return NewsUpdate::default();
            }
        };
        let Some(first) = articles.first() else {
            tracing::info!(target: "news", "News feed is empty");
            return NewsUpdate::default();
        };

        let changed = record_newest(settings, first);
        let unread = settings.news_cache().is_some_and(|c| !c.dismissed);
        NewsUpdate {
            articles,
            changed,
            unread,
        }
    }
}

/// Store `newest` in the cache when its content or date moved on.
/// Returns whether the cache was rewritten.
pub fn record_newest(settings: &mut Settings, newest: &NewsArticle) -> bool {
    let hash = digest(&newest.content);
    let changed = match settings.news_cache() {
        None => true,
        Some(cached) => cached.content != hash || cached.date < newest.published,
    };
    if !changed {
        return false;
    }

    settings.set_news_cache(NewsCache {
        date: newest.published,
        content: hash,
        dismissed: false,
    });
    if let Err(e) = settings.save() {
        tracing::warn!(target: "news", error = %e, "Failed to save news cache");
    }
    tracing::debug!(target: "news", title = %newest.title, "New article recorded");
    true
}

/// Mark the newest article as seen.
pub fn dismiss(settings: &mut Settings) -> bool {
    let Some(mut cache) = settings.news_cache().cloned() else {
        return false;
    };
    if cache.dismissed {
        return false;
    }
    cache.dismissed = true;
    settings.set_news_cache(cache);
    if let Err(e) = settings.save() {
        tracing::warn!(target: "news", error = %e, "Failed to save news cache");
    }
    true
}
