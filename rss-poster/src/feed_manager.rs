use crate::rss_utils::url::is_valid_feed_url;
use crate::types::{PosterError, Result};
use rand::Rng;
use std::path::Path;
use tracing::{debug, info};

/// The configured set of feed endpoints, fixed for the whole run.
pub struct FeedPool {
    feeds: Vec<String>,
}

impl FeedPool {
    /// Load the feed list file. Any invalid entry, or an empty list, is fatal.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PosterError::InvalidFeedList(format!("cannot read {}: {}", path.display(), e))
        })?;

        let pool = Self::from_lines(&raw)?;
        info!("Loaded {} feeds from {}", pool.len(), path.display());
        Ok(pool)
    }

    /// Parse a line-oriented feed list: one URL per line, `#` comments and
    /// blank lines ignored, anything after the first token ignored.
    pub fn from_lines(raw: &str) -> Result<Self> {
        let mut feeds = Vec::new();

        for (index, line) in raw.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some(endpoint) = trimmed.split_whitespace().next() else {
                continue;
            };

            if !is_valid_feed_url(endpoint) {
                return Err(PosterError::InvalidFeedList(format!(
                    "line {}: not an http(s) URL: {}",
                    index + 1,
                    endpoint
                )));
            }

            feeds.push(endpoint.to_string());
        }

        Self::new(feeds)
    }

    pub fn new(feeds: Vec<String>) -> Result<Self> {
        if feeds.is_empty() {
            return Err(PosterError::InvalidFeedList("no valid feeds found".to_string()));
        }
        Ok(Self { feeds })
    }

    pub fn feeds(&self) -> &[String] {
        &self.feeds
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }

    /// Draw `min(count, len)` distinct feeds in uniformly random order.
    pub fn get_random_feeds(&self, count: usize) -> Vec<String> {
        self.get_random_feeds_with(count, &mut rand::rng())
    }

    pub fn get_random_feeds_with<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<String> {
        let amount = count.min(self.feeds.len());
        let selected: Vec<String> = rand::seq::index::sample(rng, self.feeds.len(), amount)
            .into_iter()
            .map(|index| self.feeds[index].clone())
            .collect();

        debug!("Selected {} of {} feeds for this run", selected.len(), self.feeds.len());
        selected
    }
}
