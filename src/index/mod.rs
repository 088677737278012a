//! Vector index abstraction and the in-memory implementation

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{Chunk, RetrievedChunk};

pub use memory::InMemoryVectorIndex;

/// Storage and similarity search over embedded chunks
///
/// Implementations must serialize mutations per document: two concurrent
/// writes touching the same document may not interleave. Searches are
/// read-only and may run concurrently with anything.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace chunks by chunk ID
    ///
    /// Re-upserting an existing chunk ID replaces the stored entry, so
    /// retrying a failed ingestion never duplicates data.
    async fn upsert(&self, chunks: Vec<Chunk>) -> Result<()>;

    /// Return up to `k` chunks with similarity at or above `min_similarity`,
    /// highest first. Similarity is cosine, normalized into [0, 1].
    async fn search(
        &self,
        query: &[f32],
        k: usize,
        min_similarity: f32,
    ) -> Result<Vec<RetrievedChunk>>;

    /// Remove every chunk belonging to a document; returns the number
    /// removed. Deleting an unknown document is not an error.
    async fn delete_by_document(&self, document_id: Uuid) -> Result<usize>;

    /// Number of chunks currently indexed
    async fn count(&self) -> Result<usize>;

    /// Remove all chunks
    async fn clear(&self) -> Result<()>;
}
