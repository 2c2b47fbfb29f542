//! Cache key derivation.
//!
//! Keys are a SHA-256 digest of the normalized query (lowercased, trimmed),
//! hex-encoded to a fixed 64 characters. Two queries that are equal after
//! normalization always map to the same key; the digest carries no random
//! seed, so keys are stable across process restarts.

use sha2::{Digest, Sha256};

/// Opaque fixed-length cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the cache key for a query.
///
/// Total over all strings — emptiness is validated upstream, not here.
pub fn derive_key(query: &str) -> CacheKey {
    let normalized = query.trim().to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    CacheKey(format!("{:x}", hasher.finalize()))
}
