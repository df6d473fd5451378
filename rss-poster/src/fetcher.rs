use crate::config::FetchConfig;
use crate::types::{PosterError, Result};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Single-attempt HTTP fetcher for feed documents. Retries are the caller's
/// business.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    pub async fn fetch_feed(&self, url: &str) -> Result<String> {
        let start_time = Instant::now();
        debug!("Fetching feed: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(PosterError::General(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let max_bytes = self.config.max_feed_size_mb * 1024 * 1024;
        if let Some(content_length) = response.content_length() {
            if content_length as usize > max_bytes {
                return Err(PosterError::General(format!(
                    "Feed too large: {}MB",
                    content_length as usize / (1024 * 1024)
                )));
            }
        }

        let content = response.text().await?;
        if content.len() > max_bytes {
            return Err(PosterError::General(format!(
                "Feed too large: {}MB",
                content.len() / (1024 * 1024)
            )));
        }

        info!(
            "Fetched feed: {} ({} bytes in {}ms)",
            url,
            content.len(),
            start_time.elapsed().as_millis()
        );
        Ok(content)
    }
}
