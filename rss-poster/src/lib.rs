pub mod types;
pub mod config;
pub mod credentials;
pub mod history;
pub mod feed_manager;
pub mod fetcher;
pub mod parser;
pub mod rss_utils;
pub mod retry;
pub mod traits;
pub mod sources;
pub mod llm_adapter;
pub mod prompts;
pub mod composer;
pub mod oauth;
pub mod twitter;
pub mod publisher;
pub mod pipeline;

pub use types::*;
pub use config::Config;
pub use credentials::{CredentialChain, Credentials};
pub use history::PostHistory;
pub use feed_manager::FeedPool;
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use retry::RetryPolicy;
pub use traits::{ArticleSource, LlmAdapter, PostingApi};
pub use sources::RssFeedSource;
pub use llm_adapter::{MockLlmAdapter, MockReply, XaiChat};
pub use composer::{ContentComposer, ThreadGenerator};
pub use oauth::OAuth1Signer;
pub use twitter::TwitterApi;
pub use publisher::Publisher;
pub use pipeline::{PostingPipeline, RunSettings};
