mod common;

use anyhow::Result;
use common::*;
use rss_poster::config::PlatformConfig;
use rss_poster::rss_utils::text::char_len;
use async_trait::async_trait;
use rss_poster::{Config, OAuth1Signer, PostingApi, Publisher, RetryPolicy, TwitterApi};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::info;
use wiremock::matchers::{body_partial_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn twitter_api(server: &MockServer) -> Arc<TwitterApi> {
    let config = PlatformConfig {
        base_url: server.uri(),
        ..PlatformConfig::default()
    };
    let signer = OAuth1Signer::new("consumer-key", "consumer-secret", "access-token", "access-secret");
    Arc::new(TwitterApi::new(signer, &config).expect("build twitter client"))
}

fn fast_policy(attempts: u32) -> RetryPolicy {
    RetryPolicy::new(attempts, Duration::from_millis(10), Duration::from_millis(1000))
}

/// In-process platform that records every request with the time it arrived.
struct RecordingApi {
    latency: Duration,
    calls: Mutex<Vec<(PostRequest, Instant)>>,
}

impl RecordingApi {
    fn new(latency: Duration) -> Self {
        Self {
            latency,
            calls: Mutex::new(Vec::new()),
        }
    }

    async fn calls(&self) -> Vec<(PostRequest, Instant)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl PostingApi for RecordingApi {
    async fn create_post(&self, request: &PostRequest) -> rss_poster::Result<PostResponse> {
        tokio::time::sleep(self.latency).await;
        let mut calls = self.calls.lock().await;
        calls.push((request.clone(), Instant::now()));
        Ok(PostResponse::Created {
            id: format!("id-{}", request.text),
        })
    }
}

fn created(id: &str) -> ResponseTemplate {
    ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": id, "text": "ok" } }))
}

#[tokio::test]
async fn test_single_post_is_signed_and_created() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(header_exists("authorization"))
        .and(body_partial_json(json!({ "text": "Hello from the feed" })))
        .respond_with(created("1001"))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = Publisher::new(twitter_api(&server), fast_policy(3), 280, Duration::ZERO);
    let ids = publisher.publish(&ComposedPost::Single("Hello from the feed".to_string())).await?;
    assert_eq!(ids, vec!["1001".to_string()]);

    let requests = server.received_requests().await.unwrap_or_default();
    let auth = requests[0]
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    info!("Authorization header: {}", auth);
    assert!(auth.starts_with("OAuth "));
    assert!(auth.contains("oauth_signature_method=\"HMAC-SHA1\""));
    assert!(auth.contains("oauth_consumer_key=\"consumer-key\""));
    Ok(())
}

#[tokio::test]
async fn test_rate_limit_gives_up_after_max_retries() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let policy = fast_policy(3);
    assert_eq!(policy.delays(), vec![Duration::from_millis(10), Duration::from_millis(20)]);

    let publisher = Publisher::new(twitter_api(&server), policy, 280, Duration::ZERO);
    let result = publisher.post_single("Rate limited post").await;

    match result {
        Err(PosterError::RateLimited { attempts }) => assert_eq!(attempts, 3),
        other => panic!("expected rate limit error, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_rate_limit_then_success() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(created("77"))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = Publisher::new(twitter_api(&server), fast_policy(3), 280, Duration::ZERO);
    assert_eq!(publisher.post_single("Third time lucky").await?, "77");
    Ok(())
}

#[tokio::test]
async fn test_rejection_is_not_retried() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(403).set_body_string("duplicate content"))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = Publisher::new(twitter_api(&server), fast_policy(3), 280, Duration::ZERO);
    match publisher.post_single("Already said this").await {
        Err(PosterError::PostRejected { status, body }) => {
            assert_eq!(status, 403);
            assert_eq!(body, "duplicate content");
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_overlong_post_is_truncated() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(created("5"))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = Publisher::new(twitter_api(&server), fast_policy(1), 280, Duration::ZERO);
    publisher.post_single(&"word ".repeat(100)).await?;

    let requests = server.received_requests().await.unwrap_or_default();
    let body: Value = serde_json::from_slice(&requests[0].body)?;
    let text = body["text"].as_str().unwrap_or_default();
    assert_eq!(char_len(text), 280);
    assert!(text.ends_with("..."));
    assert!(body.get("reply").is_none());
    Ok(())
}

#[tokio::test]
async fn test_thread_units_reply_to_previous() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(body_partial_json(json!({ "text": "one" })))
        .respond_with(created("100"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(body_partial_json(json!({ "text": "two", "reply": { "in_reply_to_tweet_id": "100" } })))
        .respond_with(created("101"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(body_partial_json(json!({ "text": "three", "reply": { "in_reply_to_tweet_id": "101" } })))
        .respond_with(created("102"))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = Publisher::new(twitter_api(&server), fast_policy(2), 280, Duration::from_millis(5));
    let thread = ComposedPost::Thread(vec!["one".into(), "two".into(), "three".into()]);
    let ids = publisher.publish(&thread).await?;
    assert_eq!(ids, vec!["100", "101", "102"]);
    Ok(())
}

#[tokio::test]
async fn test_partial_thread_is_reported() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(body_partial_json(json!({ "text": "first" })))
        .respond_with(created("200"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(body_partial_json(json!({ "text": "second" })))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(body_partial_json(json!({ "text": "third" })))
        .respond_with(created("202"))
        .expect(0)
        .mount(&server)
        .await;

    let publisher = Publisher::new(twitter_api(&server), fast_policy(3), 280, Duration::ZERO);
    let result = publisher
        .post_thread(&["first".to_string(), "second".to_string(), "third".to_string()])
        .await;

    match result {
        Err(PosterError::PartialThread { posted, cause }) => {
            assert_eq!(posted, vec!["200".to_string()]);
            assert!(matches!(*cause, PosterError::PostRejected { status: 400, .. }));
        }
        other => panic!("expected partial thread, got {:?}", other),
    }

    assert!(publisher.post_thread(&[]).await.is_err());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_thread_units_are_spaced_by_delay() -> Result<()> {
    init_tracing();
    let api = Arc::new(RecordingApi::new(Duration::ZERO));
    let delay = Duration::from_secs(2);
    let publisher = Publisher::new(api.clone(), RetryPolicy::no_retry(), 280, delay);

    let units = vec!["one".to_string(), "two".to_string(), "three".to_string()];
    publisher.post_thread(&units).await?;

    let calls = api.calls().await;
    assert_eq!(calls.len(), 3);
    for pair in calls.windows(2) {
        let gap = pair[1].1 - pair[0].1;
        info!("Gap between units: {:?}", gap);
        assert!(gap >= delay && gap < delay + Duration::from_millis(5), "gap was {:?}", gap);
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_single_post_waits_for_running_thread() -> Result<()> {
    init_tracing();
    let api = Arc::new(RecordingApi::new(Duration::from_millis(100)));
    let publisher = Publisher::new(api.clone(), RetryPolicy::no_retry(), 280, Duration::from_secs(2));
    let units = vec!["one".to_string(), "two".to_string(), "three".to_string()];

    // The single post is issued while the thread sleeps between units
    let (thread, single) = tokio::join!(publisher.post_thread(&units), async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        publisher.post_single("solo").await
    });
    assert_eq!(thread?, vec!["id-one", "id-two", "id-three"]);
    assert_eq!(single?, "id-solo");

    let calls = api.calls().await;
    let order: Vec<(&str, Option<&str>)> = calls
        .iter()
        .map(|(request, _)| (request.text.as_str(), request.reply_to.as_deref()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("one", None),
            ("two", Some("id-one")),
            ("three", Some("id-two")),
            ("solo", None),
        ]
    );
    Ok(())
}

#[test]
fn test_config_backoff_shapes() {
    let config = Config::default();
    assert_eq!(
        config.retry_policy().delays(),
        vec![Duration::from_secs(4), Duration::from_secs(8)]
    );
    assert_eq!(
        config.rate_limit_policy().delays(),
        vec![Duration::from_secs(10), Duration::from_secs(20)]
    );

    let wide = Config {
        max_retries: 6,
        ..Config::default()
    };
    assert_eq!(
        wide.retry_policy().delays(),
        [4, 8, 10, 10, 10].map(Duration::from_secs).to_vec()
    );
    assert_eq!(
        wide.rate_limit_policy().delays(),
        [10, 20, 40, 80, 160].map(Duration::from_secs).to_vec()
    );
}
