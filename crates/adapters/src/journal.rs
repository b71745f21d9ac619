//! Invalidation journal: records every tombstone written to the cache.

use async_trait::async_trait;
use asset_watch_domain::{CacheError, CacheKey, CacheStore, CacheValue, Clock, SystemClock};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Append-only JSONL file
#[derive(Debug, Clone)]
pub struct JournalWriter {
    path: PathBuf,
    file: Arc<Mutex<fs::File>>,
}

impl JournalWriter {
    pub async fn open(path: PathBuf) -> Result<Self, JournalError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, entry: &JournalEntry<'_>) -> Result<(), JournalError> {
        let line = serde_json::to_string(entry)?;
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }
}

#[derive(Serialize)]
struct JournalEntry<'a> {
    key: &'a CacheKey,
    #[serde(with = "time::serde::rfc3339")]
    invalidated_at: OffsetDateTime,
}

/// Cache store decorator that journals tombstone writes.
///
/// The tombstone is stored first; a journal failure is logged and does not
/// fail the write.
pub struct JournalingCacheStore<C: CacheStore + ?Sized> {
    inner: Arc<C>,
    writer: JournalWriter,
    clock: Arc<dyn Clock>,
}

impl<C: CacheStore + ?Sized> JournalingCacheStore<C> {
    pub fn new(inner: Arc<C>, writer: JournalWriter) -> Self {
        Self::with_clock(inner, writer, Arc::new(SystemClock))
    }

    pub fn with_clock(inner: Arc<C>, writer: JournalWriter, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            writer,
            clock,
        }
    }
}

#[async_trait]
impl<C: CacheStore + ?Sized> CacheStore for JournalingCacheStore<C> {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheValue>, CacheError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &CacheKey, value: CacheValue) -> Result<(), CacheError> {
        let tombstone = value.is_tombstone();
        self.inner.put(key, value).await?;

        if tombstone {
            let entry = JournalEntry {
                key,
                invalidated_at: self.clock.now(),
            };
            if let Err(e) = self.writer.append(&entry).await {
                tracing::warn!(
                    key = %key,
                    path = %self.writer.path().display(),
                    error = %e,
                    "Failed to journal invalidation"
                );
            }
        }

        Ok(())
    }
}
