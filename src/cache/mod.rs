//! Response cache: key derivation, the store capability, and the in-memory
//! implementation. Expiry and counters belong to the store; the orchestrator
//! in [`crate::service`] only decides what to write and when.

pub mod key;
pub mod store;

pub use key::{derive_key, CacheKey};
pub use store::{CacheEntry, CacheStore, MemoryStore, StoreStats};
