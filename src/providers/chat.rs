//! Chat provider trait for answer generation

use async_trait::async_trait;

use crate::error::Result;

/// Trait for LLM-based answer generation
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Generate a completion for a fully assembled prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model used for generation
    fn model(&self) -> &str;
}
