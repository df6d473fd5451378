use crate::config::Config;
use crate::prompts::{PromptManager, THREAD_DELIMITER};
use crate::rss_utils::text::{char_len, split_into_chunks, truncate_with_marker};
use crate::traits::LlmAdapter;
use crate::types::{Article, ChatRequest, ComposedPost};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Phrases that mark an article as analytical enough for a thread.
pub const THREAD_INDICATORS: &[&str] = &[
    "research",
    "study",
    "analysis",
    "findings",
    "methodology",
    "results show",
    "according to",
];

/// Decides between a single post and a thread, and drives the model call.
pub struct ContentComposer {
    llm: Arc<dyn LlmAdapter>,
    temperature: f64,
    max_post_length: usize,
    thread_word_threshold: usize,
    local_thread_fallback: bool,
}

impl ContentComposer {
    pub fn new(llm: Arc<dyn LlmAdapter>, config: &Config) -> Self {
        Self {
            llm,
            temperature: config.llm.temperature,
            max_post_length: config.platform.max_post_length,
            thread_word_threshold: config.compose.thread_word_threshold,
            local_thread_fallback: config.compose.local_thread_fallback,
        }
    }

    pub fn should_create_thread(&self, article: &Article) -> bool {
        if article.word_count() > self.thread_word_threshold {
            return true;
        }
        let content = article.content.to_lowercase();
        THREAD_INDICATORS.iter().any(|indicator| content.contains(indicator))
    }

    /// Produce post content for `article`, or `None` when nothing usable
    /// came back. Model failures never escape this call.
    pub async fn compose(&self, article: &Article) -> Option<ComposedPost> {
        if self.should_create_thread(article) {
            info!("Composing thread for article: {}", article.title);
            self.compose_thread(article).await
        } else {
            info!("Composing single post for article: {}", article.title);
            self.compose_single(article).await
        }
    }

    async fn compose_single(&self, article: &Article) -> Option<ComposedPost> {
        let request = ChatRequest {
            messages: PromptManager::single_post(article),
            temperature: self.temperature,
        };

        self.ask(article, &request).await.map(ComposedPost::Single)
    }

    async fn compose_thread(&self, article: &Article) -> Option<ComposedPost> {
        let request = ChatRequest {
            messages: PromptManager::thread(article),
            temperature: self.temperature,
        };

        let parts = self
            .ask(article, &request)
            .await
            .map(|raw| parse_thread_response(&raw, self.max_post_length))
            .unwrap_or_default();

        if !parts.is_empty() {
            debug!("Thread for '{}' has {} parts", article.title, parts.len());
            return Some(ComposedPost::Thread(parts));
        }

        if self.local_thread_fallback {
            warn!("Model gave no usable thread for '{}', using local template", article.title);
            let parts = ThreadGenerator::new(self.max_post_length).create_thread(article);
            return Some(ComposedPost::Thread(parts));
        }

        None
    }

    async fn ask(&self, article: &Article, request: &ChatRequest) -> Option<String> {
        match self.llm.chat(request).await {
            Ok(Some(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                warn!("{} produced no content for article: {}", self.llm.adapter_name(), article.title);
                None
            }
            Err(e) => {
                error!("{} failed for article '{}': {}", self.llm.adapter_name(), article.title, e);
                None
            }
        }
    }
}

/// Split a model response into ordered thread units no longer than `max_chars`.
pub fn parse_thread_response(raw: &str, max_chars: usize) -> Vec<String> {
    raw.split(THREAD_DELIMITER)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .flat_map(|segment| {
            if char_len(segment) > max_chars {
                split_into_chunks(segment, max_chars)
            } else {
                vec![segment.to_string()]
            }
        })
        .collect()
}

/// Builds a thread from the article itself, without the model.
pub struct ThreadGenerator {
    max_post_length: usize,
}

impl ThreadGenerator {
    pub fn new(max_post_length: usize) -> Self {
        Self { max_post_length }
    }

    /// Hook with title and link, the content in post-sized pieces, then a
    /// call to action.
    pub fn create_thread(&self, article: &Article) -> Vec<String> {
        let mut thread = Vec::new();

        let link_suffix = format!("\n\n{}", article.url);
        let hook_budget = self.max_post_length.saturating_sub(char_len(&link_suffix));
        let hook = truncate_with_marker(&format!("🧵 {}", strip_pictographs(&article.title).trim()), hook_budget);
        thread.push(truncate_with_marker(&format!("{}{}", hook, link_suffix), self.max_post_length));

        for paragraph in article.content.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
            thread.extend(split_into_chunks(paragraph, self.max_post_length));
        }

        let cta = format!(
            "💡 Want to learn more?\n\nRead the full article here: {}\n\n🔄 Share if you found this thread helpful!",
            article.url
        );
        thread.push(truncate_with_marker(&cta, self.max_post_length));

        thread
    }
}

fn strip_pictographs(text: &str) -> String {
    text.chars()
        .filter(|c| !('\u{1F300}'..='\u{1F9FF}').contains(c))
        .collect()
}
