//! Query orchestration — the cache-aside flow.
//!
//! Per request: validate, derive the key, look the key up, and on a miss
//! generate, persist, and respond. All state lives in the injected
//! [`CacheStore`]; the service itself is stateless across requests, so
//! concurrent callers only interact through the store. Two simultaneous
//! misses for the same key will both generate and both write; last write
//! wins. That race is accepted — entries are whole-value writes, so the
//! store can end up stale but never corrupted.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{derive_key, CacheEntry, CacheStore};
use crate::engine::Generator;
use crate::error::{ParrotError, Result};

/// The envelope returned to callers.
///
/// On a cache hit, `query` and `timestamp` come from the stored entry:
/// `timestamp` reflects when the content was produced, not when it was
/// served. `degraded` carries the provider failure description when the
/// response is fallback text rather than a real answer; it is omitted from
/// the wire for real answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub query: String,
    pub response: String,
    pub cached: bool,
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

/// Store counters plus the derived hit rate, as reported by `/cache/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub memory_bytes: u64,
    pub hit_rate: f64,
}

/// Cache-aside orchestrator over injected store and generator capabilities.
pub struct QueryService {
    store: Arc<dyn CacheStore>,
    engine: Arc<dyn Generator>,
    ttl: Duration,
}

impl QueryService {
    pub fn new(store: Arc<dyn CacheStore>, engine: Arc<dyn Generator>, ttl: Duration) -> Self {
        Self { store, engine, ttl }
    }

    /// Answer a query, consulting the cache first.
    ///
    /// The only error a well-formed query can surface is an unexpected
    /// internal fault: store failures are downgraded to misses or dropped
    /// writes, and provider failures become degraded answers.
    pub async fn handle(&self, query: &str) -> Result<Answer> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ParrotError::InvalidInput("query cannot be empty".into()));
        }

        let key = derive_key(query);

        match self.store.get(&key).await {
            Ok(Some(entry)) => {
                info!(%query, "Cache hit");
                return Ok(Answer {
                    query: entry.query,
                    response: entry.response,
                    cached: true,
                    timestamp: entry.timestamp,
                    degraded: None,
                });
            }
            Ok(None) => debug!(%query, "Cache miss"),
            // Unreachable store reads downgrade to a miss.
            Err(e) => warn!(%query, error = %e, "Cache read failed, treating as miss"),
        }

        let (response, degraded) = match self.engine.generate(query).await {
            Ok(text) => (text, None),
            Err(e) => {
                warn!(%query, error = %e, "Generation failed, answering degraded");
                (
                    format!("The answer service could not respond to \"{query}\" ({e})"),
                    Some(e.to_string()),
                )
            }
        };

        let timestamp = now_epoch_secs();
        let entry = CacheEntry {
            query: query.to_string(),
            response: response.clone(),
            timestamp,
        };
        if let Err(e) = self.store.set(&key, &entry, self.ttl).await {
            warn!(%query, error = %e, "Cache write failed, answer not cached");
        }

        Ok(Answer {
            query: query.to_string(),
            response,
            cached: false,
            timestamp,
            degraded,
        })
    }

    /// Health probe: can the store answer a trivial operation?
    /// Never touches the generation provider.
    pub async fn store_reachable(&self) -> bool {
        self.store.ping().await.is_ok()
    }

    /// Store counters with the derived hit rate.
    pub async fn cache_report(&self) -> Result<CacheReport> {
        let stats = self.store.stats().await?;
        let hit_rate = stats.hits as f64 / (stats.hits + stats.misses).max(1) as f64;
        Ok(CacheReport {
            entries: stats.entries,
            hits: stats.hits,
            misses: stats.misses,
            memory_bytes: stats.memory_bytes,
            hit_rate,
        })
    }

    /// Administrative reset of the whole cache namespace.
    pub async fn clear_cache(&self) -> Result<()> {
        info!("Clearing response cache");
        self.store.clear().await
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }
}

fn now_epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheKey, MemoryStore, StoreStats};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Counting generator: answers `"echo: <query>"`, or fails every call.
    struct StubEngine {
        calls: AtomicU64,
        fail: bool,
    }

    impl StubEngine {
        fn ok() -> Self {
            Self { calls: AtomicU64::new(0), fail: false }
        }
        fn failing() -> Self {
            Self { calls: AtomicU64::new(0), fail: true }
        }
        fn calls(&self) -> u64 {
            self.calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl Generator for StubEngine {
        async fn generate(&self, query: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if self.fail {
                Err(ParrotError::Engine("provider unavailable".into()))
            } else {
                Ok(format!("echo: {query}"))
            }
        }
        fn name(&self) -> &str {
            "stub"
        }
    }

    /// A store where every operation fails.
    struct DownStore;

    #[async_trait]
    impl CacheStore for DownStore {
        async fn get(&self, _: &CacheKey) -> Result<Option<CacheEntry>> {
            Err(ParrotError::Store("connection refused".into()))
        }
        async fn set(&self, _: &CacheKey, _: &CacheEntry, _: Duration) -> Result<()> {
            Err(ParrotError::Store("connection refused".into()))
        }
        async fn delete(&self, _: &CacheKey) -> Result<bool> {
            Err(ParrotError::Store("connection refused".into()))
        }
        async fn clear(&self) -> Result<()> {
            Err(ParrotError::Store("connection refused".into()))
        }
        async fn ping(&self) -> Result<()> {
            Err(ParrotError::Store("connection refused".into()))
        }
        async fn stats(&self) -> Result<StoreStats> {
            Err(ParrotError::Store("connection refused".into()))
        }
        fn name(&self) -> &'static str {
            "down"
        }
    }

    fn service_with(
        engine: Arc<StubEngine>,
        ttl: Duration,
    ) -> (QueryService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new(64));
        (
            QueryService::new(store.clone(), engine, ttl),
            store,
        )
    }

    #[tokio::test]
    async fn test_miss_generates_once_and_writes() {
        let engine = Arc::new(StubEngine::ok());
        let (service, store) = service_with(engine.clone(), Duration::from_secs(600));

        let answer = service.handle("what is go?").await.unwrap();
        assert!(!answer.cached);
        assert_eq!(answer.response, "echo: what is go?");
        assert!(answer.degraded.is_none());
        assert_eq!(engine.calls(), 1);
        assert_eq!(store.stats().await.unwrap().entries, 1);
    }

    #[tokio::test]
    async fn test_hit_skips_generation_and_keeps_timestamp() {
        let engine = Arc::new(StubEngine::ok());
        let (service, _store) = service_with(engine.clone(), Duration::from_secs(600));

        let first = service.handle("what is go?").await.unwrap();
        let second = service.handle("what is go?").await.unwrap();
        assert!(second.cached);
        assert_eq!(second.response, first.response);
        assert_eq!(second.timestamp, first.timestamp);
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn test_normalization_equal_queries_share_an_entry() {
        let engine = Arc::new(StubEngine::ok());
        let (service, _store) = service_with(engine.clone(), Duration::from_secs(600));

        let first = service.handle("What is Go?").await.unwrap();
        let second = service.handle("  WHAT IS GO?  ").await.unwrap();
        assert!(second.cached);
        assert_eq!(second.response, first.response);
        assert_eq!(second.timestamp, first.timestamp);
        // The hit serves the stored (original) query text.
        assert_eq!(second.query, "What is Go?");
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn test_ttl_expiry_behaves_as_fresh_miss() {
        let engine = Arc::new(StubEngine::ok());
        let (service, _store) = service_with(engine.clone(), Duration::from_millis(20));

        let first = service.handle("q").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = service.handle("q").await.unwrap();
        assert!(!second.cached);
        assert!(second.timestamp > first.timestamp);
        assert_eq!(engine.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_and_whitespace_queries_rejected() {
        let engine = Arc::new(StubEngine::ok());
        let (service, store) = service_with(engine.clone(), Duration::from_secs(600));

        for q in ["", "   ", "\t\n"] {
            let err = service.handle(q).await.unwrap_err();
            assert!(matches!(err, ParrotError::InvalidInput(_)), "query {q:?}");
        }
        assert_eq!(engine.calls(), 0);
        assert_eq!(store.stats().await.unwrap().entries, 0);
    }

    #[tokio::test]
    async fn test_generation_failure_yields_tagged_degraded_answer() {
        let engine = Arc::new(StubEngine::failing());
        let (service, store) = service_with(engine.clone(), Duration::from_secs(600));

        let answer = service.handle("q").await.unwrap();
        assert!(!answer.cached);
        assert!(!answer.response.is_empty());
        assert!(answer.response.contains("provider unavailable"));
        let cause = answer.degraded.expect("degraded answers carry a cause");
        assert!(cause.contains("provider unavailable"));
        // The write is still attempted (and here succeeds).
        assert_eq!(store.stats().await.unwrap().entries, 1);
    }

    #[tokio::test]
    async fn test_unreachable_store_still_answers() {
        let engine = Arc::new(StubEngine::ok());
        let service = QueryService::new(
            Arc::new(DownStore),
            engine.clone(),
            Duration::from_secs(600),
        );

        let answer = service.handle("q").await.unwrap();
        assert!(!answer.cached);
        assert_eq!(answer.response, "echo: q");
        assert_eq!(engine.calls(), 1);
        assert!(!service.store_reachable().await);
    }

    #[tokio::test]
    async fn test_hit_rate_derivation() {
        let engine = Arc::new(StubEngine::ok());
        let (service, _store) = service_with(engine, Duration::from_secs(600));

        // Empty store: rate is 0, not a division by zero.
        assert_eq!(service.cache_report().await.unwrap().hit_rate, 0.0);

        let _ = service.handle("q").await.unwrap(); // miss
        let _ = service.handle("q").await.unwrap(); // hit
        let report = service.cache_report().await.unwrap();
        assert_eq!(report.hits, 1);
        assert_eq!(report.misses, 1);
        assert_eq!(report.hit_rate, 0.5);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_regeneration() {
        let engine = Arc::new(StubEngine::ok());
        let (service, _store) = service_with(engine.clone(), Duration::from_secs(600));

        let _ = service.handle("q").await.unwrap();
        service.clear_cache().await.unwrap();
        let answer = service.handle("q").await.unwrap();
        assert!(!answer.cached);
        assert_eq!(engine.calls(), 2);
    }

    #[tokio::test]
    async fn test_store_reachable_for_memory_store() {
        let engine = Arc::new(StubEngine::ok());
        let (service, _store) = service_with(engine, Duration::from_secs(600));
        assert!(service.store_reachable().await);
    }

    #[test]
    fn test_answer_wire_shape_untagged_when_not_degraded() {
        let answer = Answer {
            query: "q".into(),
            response: "r".into(),
            cached: false,
            timestamp: 1.5,
            degraded: None,
        };
        let json = serde_json::to_value(&answer).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert!(!obj.contains_key("degraded"));
    }

    #[test]
    fn test_answer_wire_shape_tagged_when_degraded() {
        let answer = Answer {
            query: "q".into(),
            response: "r".into(),
            cached: false,
            timestamp: 1.5,
            degraded: Some("timeout".into()),
        };
        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["degraded"], "timeout");
    }
}
