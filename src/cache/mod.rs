//! Time-bounded JSON document cache over an injected key/value store.
//!
//! Entries are stored as `{"questions": <payload>, "expiry": <epoch ms>}`.
//! Reads fail soft: a missing, expired, unreadable, or malformed entry is
//! reported as absent, and anything other than "missing" is evicted on the
//! spot so it never resurfaces. There is no background sweeper.

mod clock;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{KvStore, MemoryStore, StoreError};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to encode cache entry: {0}")]
    Encode(serde_json::Error),

    /// Stored value is not a well-formed entry. Never surfaced by `get`.
    #[error("Corrupt cache entry: {0}")]
    Corrupt(serde_json::Error),
}

/// A cached payload and the instant it stops being trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    #[serde(rename = "questions")]
    pub payload: T,
    #[serde(rename = "expiry")]
    pub expires_at_ms: i64,
}

impl<T> CacheEntry<T> {
    /// Valid iff `now < expires_at_ms`.
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at_ms
    }
}

pub struct CacheStore<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: KvStore> CacheStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read a live entry.
    ///
    /// Returns `None` when the key is missing, the entry has expired, or the
    /// stored value cannot be read or parsed. Expired and corrupt entries
    /// are deleted before returning.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache read failed, treating as absent");
                self.evict(key).await;
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                let err = CacheError::Corrupt(e);
                tracing::warn!(key, error = %err, "Evicting unreadable cache entry");
                self.evict(key).await;
                return None;
            }
        };

        let now = self.clock.now_ms();
        if !entry.is_valid_at(now) {
            tracing::debug!(
                key,
                expired_ms_ago = now.saturating_sub(entry.expires_at_ms),
                "Cache entry expired, evicting"
            );
            self.evict(key).await;
            return None;
        }

        Some(entry)
    }

    /// Write `payload` under `key`, expiring `ttl` from now.
    ///
    /// A zero TTL is raised to one millisecond so the stored expiry is always
    /// in the future at write time.
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        payload: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX).max(1);
        let entry = CacheEntry {
            payload,
            expires_at_ms: self.clock.now_ms().saturating_add(ttl_ms),
        };
        let raw = serde_json::to_string(&entry).map_err(CacheError::Encode)?;
        self.store.set(key, &raw).await?;
        tracing::debug!(key, expires_at_ms = entry.expires_at_ms, "Cache entry written");
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.delete(key).await?;
        Ok(())
    }

    async fn evict(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            tracing::warn!(key, error = %e, "Failed to evict cache entry");
        }
    }
}
