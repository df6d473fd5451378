#![allow(dead_code)]

// Shared fixtures for the rss-poster integration tests
pub use rss_poster::types::*;

use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use std::sync::Once;
use tempfile::TempDir;

static TRACING: Once = Once::new();

/// Install a test subscriber once per test binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

pub fn sample_article(title: &str, hours_old: i64) -> Article {
    Article {
        title: title.to_string(),
        content: format!("A short report about {}.", title.to_lowercase()),
        url: format!("https://news.example.com/{}", title.to_lowercase().replace(' ', "-")),
        published_at: Utc::now() - Duration::hours(hours_old),
        feed_id: "https://news.example.com/rss.xml".to_string(),
    }
}

/// One `<item>` of an RSS 2.0 document.
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub published: Option<DateTime<Utc>>,
}

impl FeedItem {
    pub fn new(title: &str, link: &str, description: &str, published: Option<DateTime<Utc>>) -> Self {
        Self {
            title: title.to_string(),
            link: link.to_string(),
            description: description.to_string(),
            published,
        }
    }
}

pub fn rss_document(items: &[FeedItem]) -> String {
    let body: String = items
        .iter()
        .map(|item| {
            let pub_date = item
                .published
                .map(|dt| format!("<pubDate>{}</pubDate>", dt.to_rfc2822()))
                .unwrap_or_default();
            format!(
                "<item><title>{}</title><link>{}</link><description>{}</description>{}</item>",
                item.title, item.link, item.description, pub_date
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
<channel>
<title>Test Feed</title>
<link>https://news.example.com</link>
<description>Fixture feed</description>
{}
</channel>
</rss>"#,
        body
    )
}

/// A scratch directory that lives as long as the returned guard.
pub fn scratch_dir() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

pub fn history_path(dir: &TempDir) -> PathBuf {
    dir.path().join("posted_articles.json")
}

/// `count` words of filler, each `word_len` letters long.
pub fn words(count: usize, word_len: usize) -> String {
    (0..count)
        .map(|i| {
            let letter = (b'a' + (i % 26) as u8) as char;
            letter.to_string().repeat(word_len)
        })
        .collect::<Vec<_>>()
        .join(" ")
}
