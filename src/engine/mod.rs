//! Generation capability.
//!
//! The orchestrator treats text generation as an opaque
//! `generate(query) -> text` call behind [`Generator`]; the only shipped
//! implementation speaks the OpenAI-compatible chat-completions API.

mod openai;

pub use openai::OpenAiEngine;

use async_trait::async_trait;

use crate::error::Result;

/// External text-generation capability.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce a response for the query. Fails with
    /// [`crate::error::ParrotError::Engine`] on provider errors; the caller
    /// decides whether to degrade or propagate.
    async fn generate(&self, query: &str) -> Result<String>;

    fn name(&self) -> &str;
}
