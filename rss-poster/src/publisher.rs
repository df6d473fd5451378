use crate::config::Config;
use crate::retry::RetryPolicy;
use crate::rss_utils::text::{char_len, truncate_with_marker};
use crate::traits::PostingApi;
use crate::types::{ComposedPost, PostRequest, PostResponse, PosterError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Sends posts and reply chains to the platform, one at a time.
pub struct Publisher {
    api: Arc<dyn PostingApi>,
    rate_limit_policy: RetryPolicy,
    max_post_length: usize,
    thread_delay: Duration,
    // Guards the send path so a thread is never interleaved with another post
    send_lock: Mutex<()>,
}

impl Publisher {
    pub fn new(api: Arc<dyn PostingApi>, rate_limit_policy: RetryPolicy, max_post_length: usize, thread_delay: Duration) -> Self {
        Self {
            api,
            rate_limit_policy,
            max_post_length,
            thread_delay,
            send_lock: Mutex::new(()),
        }
    }

    pub fn from_config(api: Arc<dyn PostingApi>, config: &Config) -> Self {
        Self::new(
            api,
            config.rate_limit_policy(),
            config.platform.max_post_length,
            config.thread_delay(),
        )
    }

    pub async fn publish(&self, post: &ComposedPost) -> Result<Vec<String>> {
        match post {
            ComposedPost::Single(text) => self.post_single(text).await.map(|id| vec![id]),
            ComposedPost::Thread(units) => self.post_thread(units).await,
        }
    }

    /// Post one unit. Returns the platform id of the new post.
    pub async fn post_single(&self, text: &str) -> Result<String> {
        let _guard = self.send_lock.lock().await;
        self.send(text, None).await
    }

    /// Post `units` as a reply chain. Stops at the first failure; units
    /// already posted stay up.
    pub async fn post_thread(&self, units: &[String]) -> Result<Vec<String>> {
        if units.is_empty() {
            return Err(PosterError::General("Cannot post an empty thread".to_string()));
        }

        let _guard = self.send_lock.lock().await;
        let mut posted: Vec<String> = Vec::with_capacity(units.len());

        for (index, unit) in units.iter().enumerate() {
            if index > 0 && !self.thread_delay.is_zero() {
                tokio::time::sleep(self.thread_delay).await;
            }

            let reply_to = posted.last().cloned();
            match self.send(unit, reply_to).await {
                Ok(id) => {
                    info!("Posted thread unit {}/{} (id {})", index + 1, units.len(), id);
                    posted.push(id);
                }
                Err(e) => {
                    error!(
                        "Thread aborted at unit {}/{}; {} units remain live: {}",
                        index + 1,
                        units.len(),
                        posted.len(),
                        e
                    );
                    return Err(PosterError::PartialThread {
                        posted,
                        cause: Box::new(e),
                    });
                }
            }
        }

        Ok(posted)
    }

    /// Caller holds the send lock.
    async fn send(&self, text: &str, reply_to: Option<String>) -> Result<String> {
        let text = if char_len(text) > self.max_post_length {
            warn!("Post is {} chars, truncating to {}", char_len(text), self.max_post_length);
            truncate_with_marker(text, self.max_post_length)
        } else {
            text.to_string()
        };

        let request = PostRequest { text, reply_to };
        let mut attempts = 0;

        let result = self
            .rate_limit_policy
            .retry("create post", |attempt| {
                attempts = attempt;
                let request = &request;
                async move {
                    match self.api.create_post(request).await {
                        Ok(PostResponse::Created { id }) => Ok(id),
                        Ok(PostResponse::RateLimited) => {
                            Err(backoff::Error::transient(PosterError::RateLimited { attempts: attempt }))
                        }
                        Ok(PostResponse::Rejected { status, body }) => {
                            Err(backoff::Error::permanent(PosterError::PostRejected { status, body }))
                        }
                        Err(e) => Err(backoff::Error::permanent(e)),
                    }
                }
            })
            .await;

        match result {
            Ok(id) => {
                info!("Successfully posted: {}", request.text);
                Ok(id)
            }
            Err(e) => {
                error!("Failed to post after {} attempts: {}", attempts, e);
                Err(e)
            }
        }
    }
}
