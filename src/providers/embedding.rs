//! Embedding provider trait for turning text into vectors

use async_trait::async_trait;

use crate::error::Result;

/// Trait for generating text embeddings
///
/// Implementations:
/// - `OpenAiClient`: any OpenAI-compatible `/embeddings` endpoint
/// - test doubles with deterministic vectors
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for a batch of texts
    ///
    /// The output has the same length and order as the input. An empty
    /// input slice is rejected with `Error::EmptyInput` rather than
    /// silently returning nothing.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generate an embedding for a single query text
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(std::slice::from_ref(&text.to_string())).await?;
        vectors
            .pop()
            .ok_or_else(|| crate::error::Error::provider("embedding endpoint returned no vector"))
    }

    /// Provider name for logging
    fn name(&self) -> &str;
}
