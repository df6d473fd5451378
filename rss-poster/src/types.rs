use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
// Use the interfaces crate for the remote boundary types
pub use interfaces::defs::{ChatMessage, ChatRequest, ChatRole, PostRequest, PostResponse};

/// One feed item, cleaned and ready for the posting decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub content: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub feed_id: String,
}

impl Article {
    /// Stable identity used by the posting history.
    ///
    /// Two fetches of the same item produce the same hash as long as the
    /// link and the title are unchanged.
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.url.as_bytes());
        hasher.update(self.title.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn is_recent(&self, hours: i64) -> bool {
        self.is_recent_at(hours, Utc::now())
    }

    /// Strict: an article published exactly `hours` ago is no longer recent.
    pub fn is_recent_at(&self, hours: i64, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.published_at) < Duration::hours(hours)
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

/// Text produced for one article, ready to be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposedPost {
    Single(String),
    Thread(Vec<String>),
}

impl ComposedPost {
    pub fn unit_count(&self) -> usize {
        match self {
            ComposedPost::Single(_) => 1,
            ComposedPost::Thread(parts) => parts.len(),
        }
    }
}

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Posted {
        article_hash: String,
        title: String,
        post_ids: Vec<String>,
    },
    /// Dry run: content was composed but nothing was sent or recorded.
    Previewed {
        title: String,
        post: ComposedPost,
    },
    Exhausted,
}

#[derive(Debug, thiserror::Error)]
pub enum PosterError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required credentials: {}", .names.join(", "))]
    MissingCredentials { names: Vec<String> },

    #[error("Invalid feed list: {0}")]
    InvalidFeedList(String),

    #[error("History file {path} is corrupt: {reason}")]
    HistoryCorrupt { path: String, reason: String },

    #[error("Feed {url} failed after {attempts} attempts: {reason}")]
    FeedFailed { url: String, attempts: u32, reason: String },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Language model error: {0}")]
    Llm(String),

    #[error("Rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Post rejected with status {status}: {body}")]
    PostRejected { status: u16, body: String },

    #[error("Thread aborted after {} posted units: {cause}", .posted.len())]
    PartialThread { posted: Vec<String>, cause: Box<PosterError> },

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, PosterError>;
