use crate::retry::RetryPolicy;
use crate::types::{PosterError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Upper bound for any wait read from the configuration: one day.
pub const MAX_WAIT_SECONDS: f64 = 86_400.0;

/// Run configuration, built once at startup and handed to each component.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub max_retries: u32,
    pub retry_multiplier: f64,
    pub min_retry_wait: f64,
    pub max_retry_wait: f64,
    pub history_retention_days: i64,
    pub article_freshness_hours: i64,
    pub max_feeds_per_run: usize,
    pub max_articles_per_feed: usize,
    pub thread_delay_seconds: f64,
    pub log_level: String,
    pub fetch: FetchConfig,
    pub llm: LlmConfig,
    pub platform: PlatformConfig,
    pub compose: ComposeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_multiplier: 1.0,
            min_retry_wait: 4.0,
            max_retry_wait: 10.0,
            history_retention_days: 30,
            article_freshness_hours: 24,
            max_feeds_per_run: 25,
            max_articles_per_feed: 5,
            thread_delay_seconds: 2.0,
            log_level: "info".to_string(),
            fetch: FetchConfig::default(),
            llm: LlmConfig::default(),
            platform: PlatformConfig::default(),
            compose: ComposeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "RSS-Poster/1.0".to_string(),
            timeout_seconds: 30,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.x.ai/v1".to_string(),
            model: "grok-beta".to_string(),
            temperature: 0.7,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlatformConfig {
    pub base_url: String,
    pub max_post_length: usize,
    pub timeout_seconds: u64,
    pub rate_limit_initial_wait: f64,
    pub rate_limit_max_wait: f64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.twitter.com".to_string(),
            max_post_length: 280,
            timeout_seconds: 30,
            rate_limit_initial_wait: 10.0,
            rate_limit_max_wait: 900.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComposeConfig {
    pub thread_word_threshold: usize,
    pub local_thread_fallback: bool,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            thread_word_threshold: 100,
            local_thread_fallback: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No configuration file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&raw)
            .map_err(|e| PosterError::Config(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw).map_err(|e| PosterError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(PosterError::Config("max_retries must be at least 1".to_string()));
        }
        check_seconds("retry_multiplier", self.retry_multiplier)?;
        check_seconds("min_retry_wait", self.min_retry_wait)?;
        check_seconds("max_retry_wait", self.max_retry_wait)?;
        check_seconds("thread_delay_seconds", self.thread_delay_seconds)?;
        check_seconds("platform.rate_limit_initial_wait", self.platform.rate_limit_initial_wait)?;
        check_seconds("platform.rate_limit_max_wait", self.platform.rate_limit_max_wait)?;
        if self.min_retry_wait < 0.0 || self.max_retry_wait < self.min_retry_wait {
            return Err(PosterError::Config(format!(
                "retry wait bounds are inconsistent: min {} max {}",
                self.min_retry_wait, self.max_retry_wait
            )));
        }
        if self.platform.rate_limit_initial_wait < 0.0
            || self.platform.rate_limit_max_wait < self.platform.rate_limit_initial_wait
        {
            return Err(PosterError::Config(format!(
                "rate limit wait bounds are inconsistent: initial {} max {}",
                self.platform.rate_limit_initial_wait, self.platform.rate_limit_max_wait
            )));
        }
        if self.platform.max_post_length < 4 {
            return Err(PosterError::Config("platform.max_post_length is too small".to_string()));
        }
        Ok(())
    }

    /// Backoff shared by feed fetches and model calls.
    pub fn retry_policy(&self) -> RetryPolicy {
        let initial = (self.retry_multiplier.max(0.0)).max(self.min_retry_wait);
        RetryPolicy::new(
            self.max_retries,
            Duration::from_secs_f64(initial),
            Duration::from_secs_f64(self.max_retry_wait),
        )
    }

    /// Backoff applied when the platform answers with a rate-limit status.
    pub fn rate_limit_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_secs_f64(self.platform.rate_limit_initial_wait),
            Duration::from_secs_f64(self.platform.rate_limit_max_wait),
        )
    }

    pub fn thread_delay(&self) -> Duration {
        Duration::from_secs_f64(self.thread_delay_seconds)
    }
}

fn check_seconds(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=MAX_WAIT_SECONDS).contains(&value) {
        return Err(PosterError::Config(format!(
            "{} must be between 0 and {} seconds, got {}",
            name, MAX_WAIT_SECONDS, value
        )));
    }
    Ok(())
}
