use crate::types::{Article, PosterError, Result};
use chrono::{DateTime, Duration, Local, NaiveDateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Durable record of which articles have already been posted.
///
/// The file on disk is the source of truth: every mutation rewrites it
/// completely before the call returns.
pub struct PostHistory {
    path: PathBuf,
    posted: RwLock<BTreeMap<String, DateTime<Utc>>>,
    // Held across mutate + write so flushes never interleave
    write_lock: Mutex<()>,
}

impl PostHistory {
    /// Load the history file. A missing file starts an empty history; a
    /// file that cannot be read back is fatal.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let posted = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|e| corrupt(&path, e.to_string()))?;
            parse_history(&raw).map_err(|reason| corrupt(&path, reason))?
        } else {
            info!("No history file at {}, starting empty", path.display());
            BTreeMap::new()
        };

        debug!("Loaded {} history entries from {}", posted.len(), path.display());

        Ok(Self {
            path,
            posted: RwLock::new(posted),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn is_posted(&self, article: &Article) -> bool {
        self.posted.read().await.contains_key(&article.hash())
    }

    pub async fn len(&self) -> usize {
        self.posted.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.posted.read().await.is_empty()
    }

    pub async fn posted_at(&self, article: &Article) -> Option<DateTime<Utc>> {
        self.posted.read().await.get(&article.hash()).copied()
    }

    pub async fn add_posted(&self, article: &Article) -> Result<()> {
        self.add_posted_at(article, Utc::now()).await
    }

    pub async fn add_posted_at(&self, article: &Article, now: DateTime<Utc>) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let snapshot = {
            let mut posted = self.posted.write().await;
            posted.insert(article.hash(), now);
            posted.clone()
        };

        self.flush(&snapshot).await?;
        info!("Recorded article in history: {}", article.title);
        Ok(())
    }

    /// Drop entries older than `days`. Returns how many were removed.
    pub async fn cleanup_old_entries(&self, days: i64) -> Result<usize> {
        self.cleanup_old_entries_at(days, Utc::now()).await
    }

    pub async fn cleanup_old_entries_at(&self, days: i64, now: DateTime<Utc>) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let retention = Duration::days(days);

        let (removed, snapshot) = {
            let mut posted = self.posted.write().await;
            let before = posted.len();
            posted.retain(|_, posted_at| now.signed_duration_since(*posted_at) < retention);
            (before - posted.len(), posted.clone())
        };

        self.flush(&snapshot).await?;
        info!("History cleanup removed {} entries older than {} days", removed, days);
        Ok(removed)
    }

    /// Write the whole map next to the history file, sync it, then rename
    /// it into place.
    async fn flush(&self, snapshot: &BTreeMap<String, DateTime<Utc>>) -> Result<()> {
        let serialized: BTreeMap<&str, String> = snapshot
            .iter()
            .map(|(hash, posted_at)| (hash.as_str(), posted_at.to_rfc3339()))
            .collect();
        let body = serde_json::to_vec_pretty(&serialized)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp_path = self.tmp_path();
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(&body).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp_path, &self.path).await?;
        debug!("Flushed {} history entries to {}", snapshot.len(), self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "history".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn corrupt(path: &Path, reason: String) -> PosterError {
    PosterError::HistoryCorrupt {
        path: path.display().to_string(),
        reason,
    }
}

fn parse_history(raw: &str) -> std::result::Result<BTreeMap<String, DateTime<Utc>>, String> {
    let entries: HashMap<String, String> = serde_json::from_str(raw).map_err(|e| e.to_string())?;

    entries
        .into_iter()
        .map(|(hash, stamp)| {
            parse_timestamp(&stamp)
                .map(|posted_at| (hash.clone(), posted_at))
                .ok_or_else(|| format!("entry {} has an invalid timestamp: {}", hash, stamp))
        })
        .collect()
}

/// RFC 3339, or a naive ISO-8601 timestamp.
///
/// Naive stamps were written in the host's local time and are converted
/// from it. A local time that falls in a DST gap is read as UTC.
pub fn parse_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(stamp) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Some(
        naive
            .and_local_timezone(Local)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc()),
    )
}
