//! Cache store capability and the in-process implementation.
//!
//! The orchestrator only ever sees the [`CacheStore`] trait; expiration is
//! the store's job, not the caller's. Entries cross the store boundary as a
//! typed [`CacheEntry`] — serialization happens inside the store, and stored
//! bytes that no longer deserialize are reported as a miss, never a panic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::key::CacheKey;
use crate::error::{ParrotError, Result};

/// The persisted unit: one answered query.
///
/// `query` holds the trimmed (but not case-folded) text as the caller sent
/// it; `timestamp` is epoch seconds at generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub query: String,
    pub response: String,
    pub timestamp: f64,
}

/// Store-level counters surfaced by the stats endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    /// Live (non-expired) entries.
    pub entries: usize,
    /// Lookups that returned an entry.
    pub hits: u64,
    /// Lookups that found nothing, an expired entry, or a malformed one.
    pub misses: u64,
    /// Approximate bytes held by keys and serialized entries.
    pub memory_bytes: u64,
}

/// External key-value capability with per-entry expiration.
///
/// All failures are surfaced as `Err`, and the orchestrator decides how soft
/// they are; absence is `Ok(None)`, a normal outcome.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a live entry. Absent, expired, and malformed all yield `Ok(None)`.
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>>;

    /// Store an entry, overwriting any previous value. TTL is applied at
    /// write time and is not renewed by reads.
    async fn set(&self, key: &CacheKey, entry: &CacheEntry, ttl: Duration) -> Result<()>;

    /// Remove one entry; reports whether a removal occurred. Idempotent.
    async fn delete(&self, key: &CacheKey) -> Result<bool>;

    /// Remove every entry in the namespace. Idempotent.
    async fn clear(&self) -> Result<()>;

    /// Trivial reachability probe for health checks.
    async fn ping(&self) -> Result<()>;

    /// Current counters.
    async fn stats(&self) -> Result<StoreStats>;

    fn name(&self) -> &'static str;
}

// ── In-memory store ──────────────────────────────────────────────────────────

struct Stored {
    data: Vec<u8>,
    created_at: Instant,
    ttl: Duration,
    last_accessed: Instant,
}

impl Stored {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

/// In-process store backed by a `RwLock<HashMap>`.
///
/// Expiry is lazy on read plus a sweep on write; when the map is at capacity
/// the least-recently-read entry is evicted. Writes are whole-entry, so a
/// cancelled request can at most lose an entry, never corrupt one.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Stored>>,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryStore {
    /// `max_entries` is clamped to a minimum of 1 so the eviction loop
    /// always terminates.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn lock_write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Stored>>> {
        self.entries
            .write()
            .map_err(|_| ParrotError::Store("cache lock poisoned".into()))
    }

    fn lock_read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Stored>>> {
        self.entries
            .read()
            .map_err(|_| ParrotError::Store("cache lock poisoned".into()))
    }

    fn evict_if_needed(&self, entries: &mut HashMap<String, Stored>) {
        entries.retain(|_, e| !e.is_expired());
        while entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.last_accessed)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    debug!(key = %&k[..8.min(k.len())], "Evicting LRU cache entry");
                    entries.remove(&k);
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let mut entries = self.lock_write()?;

        let Some(stored) = entries.get_mut(key.as_str()) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        };
        if stored.is_expired() {
            entries.remove(key.as_str());
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        }
        stored.last_accessed = Instant::now();
        match serde_json::from_slice::<CacheEntry>(&stored.data) {
            Ok(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry))
            }
            Err(e) => {
                // Stored bytes no longer match the entry contract; drop them
                // and report a miss so the caller regenerates.
                warn!(key = %key, error = %e, "Malformed cache entry, treating as miss");
                entries.remove(key.as_str());
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &CacheKey, entry: &CacheEntry, ttl: Duration) -> Result<()> {
        let data = serde_json::to_vec(entry)
            .map_err(|e| ParrotError::Store(format!("failed to serialize entry: {e}")))?;
        let mut entries = self.lock_write()?;
        self.evict_if_needed(&mut entries);
        let now = Instant::now();
        entries.insert(
            key.as_str().to_string(),
            Stored {
                data,
                created_at: now,
                ttl,
                last_accessed: now,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.lock_write()?.remove(key.as_str()).is_some())
    }

    async fn clear(&self) -> Result<()> {
        self.lock_write()?.clear();
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        // Reachability reduces to lock health for an in-process store.
        self.lock_read().map(|_| ())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let entries = self.lock_read()?;
        let live = entries.values().filter(|e| !e.is_expired());
        let (count, bytes) = live.fold((0usize, 0u64), |(n, b), e| {
            (n + 1, b + e.data.len() as u64)
        });
        let key_bytes: u64 = entries.keys().map(|k| k.len() as u64).sum();
        Ok(StoreStats {
            entries: count,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            memory_bytes: bytes + key_bytes,
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
