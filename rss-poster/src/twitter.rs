use crate::config::PlatformConfig;
use crate::oauth::OAuth1Signer;
use crate::traits::PostingApi;
use crate::types::{PostRequest, PostResponse, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// X/Twitter API v2 `POST /2/tweets` with OAuth 1.0a user context.
pub struct TwitterApi {
    client: Client,
    signer: OAuth1Signer,
    tweets_url: String,
}

#[derive(Debug, Serialize)]
struct TweetBody<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<ReplySettings<'a>>,
}

#[derive(Debug, Serialize)]
struct ReplySettings<'a> {
    in_reply_to_tweet_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatedTweet {
    data: CreatedTweetData,
}

#[derive(Debug, Deserialize)]
struct CreatedTweetData {
    id: String,
}

impl TwitterApi {
    pub fn new(signer: OAuth1Signer, config: &PlatformConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            signer,
            tweets_url: format!("{}/2/tweets", config.base_url.trim_end_matches('/')),
        })
    }

    pub fn tweets_url(&self) -> &str {
        &self.tweets_url
    }
}

#[async_trait]
impl PostingApi for TwitterApi {
    async fn create_post(&self, request: &PostRequest) -> Result<PostResponse> {
        let body = TweetBody {
            text: &request.text,
            reply: request
                .reply_to
                .as_deref()
                .map(|id| ReplySettings { in_reply_to_tweet_id: id }),
        };

        let authorization = self.signer.authorization_header("POST", &self.tweets_url)?;
        let response = self
            .client
            .post(&self.tweets_url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        match status {
            StatusCode::CREATED => match serde_json::from_str::<CreatedTweet>(&text) {
                Ok(created) => {
                    debug!("Post created with id {}", created.data.id);
                    Ok(PostResponse::Created { id: created.data.id })
                }
                Err(e) => {
                    warn!("Post created but response was unreadable: {}", e);
                    Ok(PostResponse::Rejected {
                        status: status.as_u16(),
                        body: text,
                    })
                }
            },
            StatusCode::TOO_MANY_REQUESTS => Ok(PostResponse::RateLimited),
            _ => Ok(PostResponse::Rejected {
                status: status.as_u16(),
                body: text,
            }),
        }
    }
}
