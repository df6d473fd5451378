use crate::composer::ContentComposer;
use crate::feed_manager::FeedPool;
use crate::history::PostHistory;
use crate::publisher::Publisher;
use crate::traits::ArticleSource;
use crate::types::{Article, ComposedPost, Result, RunOutcome};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Knobs of a single run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub history_retention_days: i64,
    pub article_freshness_hours: i64,
    pub max_feeds_per_run: usize,
    /// Compose but neither publish nor record.
    pub dry_run: bool,
}

impl From<&crate::config::Config> for RunSettings {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            history_retention_days: config.history_retention_days,
            article_freshness_hours: config.article_freshness_hours,
            max_feeds_per_run: config.max_feeds_per_run,
            dry_run: false,
        }
    }
}

/// Single-shot coordinator: feeds in random order, first eligible article
/// that composes and publishes wins, then the run ends.
pub struct PostingPipeline {
    feeds: FeedPool,
    source: Arc<dyn ArticleSource>,
    composer: ContentComposer,
    publisher: Publisher,
    history: Arc<PostHistory>,
    settings: RunSettings,
}

impl PostingPipeline {
    pub fn new(
        feeds: FeedPool,
        source: Arc<dyn ArticleSource>,
        composer: ContentComposer,
        publisher: Publisher,
        history: Arc<PostHistory>,
        settings: RunSettings,
    ) -> Self {
        Self {
            feeds,
            source,
            composer,
            publisher,
            history,
            settings,
        }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        info!("Cleaning up old history entries...");
        self.history
            .cleanup_old_entries(self.settings.history_retention_days)
            .await?;

        let feeds = self.feeds.get_random_feeds(self.settings.max_feeds_per_run);
        info!("Processing up to {} of {} feeds", feeds.len(), self.feeds.len());

        for feed_url in &feeds {
            if let Some(outcome) = self.process_feed(feed_url).await? {
                return Ok(outcome);
            }
        }

        warn!("No suitable articles found across all feeds.");
        Ok(RunOutcome::Exhausted)
    }

    /// `Ok(None)` moves on to the next feed. Only a failure to record a
    /// live post is returned as an error.
    async fn process_feed(&self, feed_url: &str) -> Result<Option<RunOutcome>> {
        info!("Processing feed: {}", feed_url);

        let articles = match self.source.fetch(feed_url).await {
            Ok(articles) => articles,
            Err(e) => {
                error!("Error processing feed {}: {}", feed_url, e);
                return Ok(None);
            }
        };

        for article in &articles {
            if !self.is_eligible(article).await {
                continue;
            }

            let Some(post) = self.composer.compose(article).await else {
                warn!("No content composed for '{}', trying next article", article.title);
                continue;
            };

            if self.settings.dry_run {
                info!("Dry run: composed {} unit(s) for '{}'", post.unit_count(), article.title);
                print_post(&post);
                return Ok(Some(RunOutcome::Previewed {
                    title: article.title.clone(),
                    post,
                }));
            }

            let post_ids = match self.publisher.publish(&post).await {
                Ok(ids) => ids,
                Err(e) => {
                    error!("Failed to publish '{}' from {}: {}", article.title, feed_url, e);
                    continue;
                }
            };

            if let Err(e) = self.history.add_posted(article).await {
                error!("Posted '{}' but could not record it in history: {}", article.title, e);
                return Err(e);
            }

            info!("Successfully posted article: {}", article.title);
            return Ok(Some(RunOutcome::Posted {
                article_hash: article.hash(),
                title: article.title.clone(),
                post_ids,
            }));
        }

        Ok(None)
    }

    async fn is_eligible(&self, article: &Article) -> bool {
        if !article.is_recent(self.settings.article_freshness_hours) {
            debug!("Skipping stale article: {}", article.title);
            return false;
        }
        if self.history.is_posted(article).await {
            debug!("Skipping already posted article: {}", article.title);
            return false;
        }
        true
    }
}

fn print_post(post: &ComposedPost) {
    match post {
        ComposedPost::Single(text) => println!("{}", text),
        ComposedPost::Thread(units) => {
            for (index, unit) in units.iter().enumerate() {
                println!("[{}/{}] {}\n", index + 1, units.len(), unit);
            }
        }
    }
}
