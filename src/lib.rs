//! Parrot — a query-answering HTTP gateway with cache-aside response caching.
//!
//! Queries are answered by an external OpenAI-compatible generation provider;
//! answers are cached under a key derived from the normalized query so
//! repeats within the TTL window skip the provider entirely.
//!
//! Crate layout:
//! - [`cache`] — key derivation and the [`cache::CacheStore`] capability
//! - [`engine`] — the [`engine::Generator`] capability and its HTTP impl
//! - [`service`] — the cache-aside orchestrator
//! - [`api`] — axum transport
//! - [`config`] / [`error`] — ambient plumbing

pub mod api;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod service;

pub use error::{ParrotError, Result};
