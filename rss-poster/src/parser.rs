use crate::rss_utils::feed::extract_text_from_html;
use crate::types::{Article, PosterError, Result};
use chrono::{DateTime, Utc};
use feed_rs::parser;
use std::collections::HashSet;
use tracing::{debug, info};

/// Turns RSS/Atom documents into cleaned [`Article`]s.
#[derive(Default)]
pub struct FeedParser;

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a feed document. Entries keep their feed order; repeated
    /// entries (same link and title) are dropped. `fetched_at` stands in for
    /// entries that carry no date at all.
    pub fn parse_articles(&self, content: &str, feed_id: &str, fetched_at: DateTime<Utc>) -> Result<Vec<Article>> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| PosterError::Parse(format!("Failed to parse feed: {}", e)))?;

        let mut seen = HashSet::new();
        let mut articles = Vec::new();

        for entry in feed.entries {
            let article = self.parse_entry(entry, feed_id, fetched_at);
            if !seen.insert(article.hash()) {
                debug!("Skipping duplicate entry: {} ({})", article.title, article.url);
                continue;
            }
            articles.push(article);
        }

        info!("Parsed feed {} with {} entries", feed_id, articles.len());
        Ok(articles)
    }

    fn parse_entry(&self, entry: feed_rs::model::Entry, feed_id: &str, fetched_at: DateTime<Utc>) -> Article {
        let title = entry
            .title
            .as_ref()
            .map(|t| extract_text_from_html(&t.content))
            .unwrap_or_default();

        let url = entry
            .links
            .first()
            .map(|link| link.href.trim().to_string())
            .unwrap_or_default();

        let raw_content = Self::entry_body(&entry).unwrap_or_default();

        let published_at = match entry.published.or(entry.updated) {
            Some(dt) => dt.with_timezone(&Utc),
            None => {
                debug!("Entry '{}' has no date, using fetch time", title);
                fetched_at
            }
        };

        Article {
            title,
            content: extract_text_from_html(&raw_content),
            url,
            published_at,
            feed_id: feed_id.to_string(),
        }
    }

    /// Structured content, then summary, then media description.
    fn entry_body(entry: &feed_rs::model::Entry) -> Option<String> {
        let content = entry
            .content
            .as_ref()
            .and_then(|c| c.body.clone())
            .filter(|body| !body.trim().is_empty());

        let summary = || {
            entry
                .summary
                .as_ref()
                .map(|s| s.content.clone())
                .filter(|s| !s.trim().is_empty())
        };

        let description = || {
            entry
                .media
                .iter()
                .filter_map(|media| media.description.as_ref())
                .map(|d| d.content.clone())
                .find(|d| !d.trim().is_empty())
        };

        content.or_else(summary).or_else(description)
    }
}
