use crate::types::{Article, ChatRequest, PostRequest, PostResponse, Result};
use async_trait::async_trait;

/// Trait for pulling articles from one feed endpoint
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Fetch and parse the endpoint, in feed order.
    /// An error means this feed is unusable for the current run.
    async fn fetch(&self, endpoint: &str) -> Result<Vec<Article>>;
}

/// Trait for language-model clients
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    /// Get the name of this LLM adapter
    fn adapter_name(&self) -> String;

    /// One request/response exchange. `Ok(None)` means the model answered
    /// without usable text.
    async fn chat(&self, request: &ChatRequest) -> Result<Option<String>>;
}

/// Trait for the social platform's post endpoint
#[async_trait]
pub trait PostingApi: Send + Sync {
    /// Submit one post. Rate limits and rejections are reported in the
    /// response; `Err` is reserved for transport failures.
    async fn create_post(&self, request: &PostRequest) -> Result<PostResponse>;
}
