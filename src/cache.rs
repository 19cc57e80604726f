//! Process-local and file-backed caches.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, warn};

/// Freshness window for persisted entries.
pub const PERSISTED_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// In-memory key/value cache scoped to one application session.
///
/// No TTL: entries live until `clear` or until the cache is dropped. The lock
/// is only held for the duration of a single get/insert.
#[derive(Debug)]
pub struct SessionCache<K, V> {
    entries: Mutex<HashMap<K, V>>,
}

impl<K, V> Default for SessionCache<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V: Clone> SessionCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().get(key).cloned()
    }

    pub fn insert(&self, key: K, value: V) {
        self.lock().insert(key, value);
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.lock().remove(key)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drops every entry for which `keep` returns false.
    pub fn retain(&self, mut keep: impl FnMut(&K, &V) -> bool) {
        self.lock().retain(|k, v| keep(k, v));
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedEntry {
    /// Epoch milliseconds at write time.
    timestamp: i64,
    data: serde_json::Value,
}

/// One JSON file per key, each `{ "timestamp": epoch-ms, "data": ... }`.
///
/// Reads treat missing, stale and unreadable files alike, as misses.
#[derive(Debug, Clone)]
pub struct PersistedCache {
    dir: PathBuf,
    ttl_ms: i64,
}

/// SHA-256 of the key, hex encoded: distinct keys never share a file and
/// any key is a valid file name.
fn file_stem(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

impl PersistedCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ttl_ms: PERSISTED_TTL_MS,
        }
    }

    pub fn with_ttl_ms(mut self, ttl_ms: i64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_at(key, Utc::now().timestamp_millis()).await
    }

    pub async fn get_at<T: DeserializeOwned>(&self, key: &str, now_ms: i64) -> Option<T> {
        let path = self.path_for(key);
        let bytes = tokio::fs::read(&path).await.ok()?;
        let entry: PersistedEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding unreadable cache entry");
                return None;
            }
        };
        if now_ms - entry.timestamp >= self.ttl_ms {
            debug!(key, "persisted cache entry is stale");
            return None;
        }
        serde_json::from_value(entry.data).ok()
    }

    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        self.put_at(key, value, Utc::now().timestamp_millis()).await
    }

    pub async fn put_at<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        timestamp_ms: i64,
    ) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let entry = PersistedEntry {
            timestamp: timestamp_ms,
            data: serde_json::to_value(value)?,
        };
        tokio::fs::write(self.path_for(key), serde_json::to_vec(&entry)?).await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<(), CacheError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
