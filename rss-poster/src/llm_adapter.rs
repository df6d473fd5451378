use crate::config::LlmConfig;
use crate::retry::RetryPolicy;
use crate::traits::LlmAdapter;
use crate::types::{ChatMessage, ChatRequest, PosterError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Client for an OpenAI-compatible `/chat/completions` endpoint (xAI by default).
pub struct XaiChat {
    client: Client,
    api_key: String,
    chat_url: String,
    model: String,
    retry_policy: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl XaiChat {
    pub fn new(api_key: &str, config: &LlmConfig, retry_policy: RetryPolicy) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(PosterError::Llm("API key cannot be empty".to_string()));
        }

        let base_url = config.base_url.trim_end_matches('/');
        let chat_url = if base_url.ends_with("chat/completions") {
            base_url.to_string()
        } else {
            format!("{}/chat/completions", base_url)
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            chat_url,
            model: config.model.clone(),
            retry_policy,
        })
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    async fn call_once(&self, request: &ChatRequest) -> std::result::Result<Option<String>, backoff::Error<PosterError>> {
        let body = CompletionRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&self.chat_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| backoff::Error::transient(PosterError::Http(e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = PosterError::Llm(format!("HTTP {}: {}", status.as_u16(), text.trim()));
            return if is_transient(status) {
                Err(backoff::Error::transient(err))
            } else {
                Err(backoff::Error::permanent(err))
            };
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| backoff::Error::permanent(PosterError::Llm(format!("JSON decode failed: {}", e))))?;

        Ok(extract_text(completion))
    }
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn extract_text(completion: CompletionResponse) -> Option<String> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

#[async_trait]
impl LlmAdapter for XaiChat {
    fn adapter_name(&self) -> String {
        format!("xAI chat ({})", self.model)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<Option<String>> {
        debug!("Sending chat request with {} messages to {}", request.messages.len(), self.chat_url);

        let text = self
            .retry_policy
            .retry("chat completion", |_| self.call_once(request))
            .await?;

        if text.is_none() {
            warn!("Model returned no content");
        }
        Ok(text)
    }
}

/// One scripted answer of the mock adapter.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Empty,
    Fail(String),
}

/// Mock LLM adapter for development and testing.
///
/// Replies are handed out in order; once the script runs out every call
/// yields no content. Every request is recorded.
pub struct MockLlmAdapter {
    name: String,
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockLlmAdapter {
    pub fn new(name: String) -> Self {
        Self {
            name,
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_replies(self, replies: impl IntoIterator<Item = MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..self
        }
    }

    pub async fn push_reply(&self, reply: MockReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Messages of every request received so far.
    pub async fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl LlmAdapter for MockLlmAdapter {
    fn adapter_name(&self) -> String {
        format!("Mock LLM Adapter ({})", self.name)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<Option<String>> {
        self.requests.lock().await.push(request.messages.clone());

        match self.replies.lock().await.pop_front() {
            Some(MockReply::Text(text)) => {
                info!("{} answering with {} chars", self.adapter_name(), text.len());
                Ok(Some(text))
            }
            Some(MockReply::Fail(reason)) => Err(PosterError::Llm(reason)),
            Some(MockReply::Empty) | None => Ok(None),
        }
    }
}
