use crate::config::Config;
use crate::retry::RetryPolicy;
use crate::traits::ArticleSource;
use crate::types::{Article, PosterError, Result};
use crate::{FeedParser, Fetcher};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

/// Generic RSS/Atom feed source: fetch, parse, cap, with retries around the
/// whole fetch + parse step.
pub struct RssFeedSource {
    fetcher: Fetcher,
    parser: FeedParser,
    retry_policy: RetryPolicy,
    max_articles: usize,
}

impl RssFeedSource {
    pub fn new(fetcher: Fetcher, retry_policy: RetryPolicy, max_articles: usize) -> Self {
        Self {
            fetcher,
            parser: FeedParser::new(),
            retry_policy,
            max_articles,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = Fetcher::new(config.fetch.clone())?;
        Ok(Self::new(fetcher, config.retry_policy(), config.max_articles_per_feed))
    }

    async fn fetch_once(&self, endpoint: &str) -> Result<Vec<Article>> {
        let content = self.fetcher.fetch_feed(endpoint).await?;
        self.parser.parse_articles(&content, endpoint, Utc::now())
    }
}

#[async_trait]
impl ArticleSource for RssFeedSource {
    async fn fetch(&self, endpoint: &str) -> Result<Vec<Article>> {
        info!("Pulling feed: {}", endpoint);

        let label = format!("fetch {}", endpoint);
        let mut attempts = 0;
        let result = self
            .retry_policy
            .retry(&label, |attempt| {
                attempts = attempt;
                async move { self.fetch_once(endpoint).await.map_err(backoff::Error::transient) }
            })
            .await;

        let mut articles = result.map_err(|e| PosterError::FeedFailed {
            url: endpoint.to_string(),
            attempts,
            reason: e.to_string(),
        })?;

        if articles.is_empty() {
            warn!("No entries found in feed: {}", endpoint);
            return Ok(articles);
        }

        articles.truncate(self.max_articles);
        info!("Pulled {} articles from feed {}", articles.len(), endpoint);
        Ok(articles)
    }
}
