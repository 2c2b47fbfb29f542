//! Error taxonomy for the gateway.
//!
//! Only two classes ever reach a caller as an error status: [`ParrotError::InvalidInput`]
//! (client error) and [`ParrotError::Internal`] (unexpected fault). Store and
//! provider failures are absorbed by the orchestrator — a store failure is a
//! miss, a provider failure becomes a tagged degraded answer.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ParrotError>;

#[derive(Debug, Error)]
pub enum ParrotError {
    /// The caller supplied an empty or whitespace-only query.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The cache store is unreachable or an operation on it failed.
    /// Soft: the read path treats this as a miss, the write path drops the write.
    #[error("cache store error: {0}")]
    Store(String),

    /// The generation provider call failed (timeout, quota, malformed body).
    /// Soft: the orchestrator substitutes a degraded answer.
    #[error("generation error: {0}")]
    Engine(String),

    /// Configuration could not be loaded or is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Anything not anticipated above.
    #[error("internal error: {0}")]
    Internal(String),
}
