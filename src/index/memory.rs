//! In-memory vector index with cosine similarity search

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{Chunk, RetrievedChunk};

use super::VectorIndex;

/// In-memory vector index
///
/// Chunks live in a concurrent map keyed by chunk ID. Mutations take a
/// per-document async lock so writes to one document are serialized while
/// searches and writes to other documents proceed untouched.
pub struct InMemoryVectorIndex {
    chunks: DashMap<Uuid, Chunk>,
    doc_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self {
            chunks: DashMap::new(),
            doc_locks: DashMap::new(),
        }
    }

    fn lock_for(&self, document_id: Uuid) -> Arc<Mutex<()>> {
        self.doc_locks
            .entry(document_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for InMemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Cosine similarity normalized into [0, 1]
///
/// Raw cosine lives in [-1, 1]; `(1 + cos) / 2` maps it onto [0, 1] so
/// thresholds compose with the rest of the scoring pipeline. Degenerate
/// vectors (zero norm, mismatched dimensions) score 0.
fn normalized_cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let cosine = dot / (norm_a.sqrt() * norm_b.sqrt());
    ((1.0 + cosine) / 2.0).clamp(0.0, 1.0)
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, chunks: Vec<Chunk>) -> Result<()> {
        // One batch normally carries a single document, but group anyway
        // and take locks in a stable order so two batches can't deadlock.
        let mut doc_ids: Vec<Uuid> = chunks.iter().map(|c| c.document_id).collect();
        doc_ids.sort();
        doc_ids.dedup();

        let locks: Vec<Arc<Mutex<()>>> = doc_ids.iter().map(|id| self.lock_for(*id)).collect();
        let mut guards = Vec::with_capacity(locks.len());
        for lock in &locks {
            guards.push(lock.lock().await);
        }

        for chunk in chunks {
            self.chunks.insert(chunk.id, chunk);
        }
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        k: usize,
        min_similarity: f32,
    ) -> Result<Vec<RetrievedChunk>> {
        let mut hits: Vec<RetrievedChunk> = self
            .chunks
            .iter()
            .filter_map(|entry| {
                let similarity = normalized_cosine(query, &entry.embedding);
                if similarity >= min_similarity {
                    let mut chunk = entry.value().clone();
                    chunk.embedding = Vec::new();
                    Some(RetrievedChunk { chunk, similarity })
                } else {
                    None
                }
            })
            .collect();

        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(k);
        Ok(hits)
    }

    async fn delete_by_document(&self, document_id: Uuid) -> Result<usize> {
        let lock = self.lock_for(document_id);
        let _guard = lock.lock().await;

        let victims: Vec<Uuid> = self
            .chunks
            .iter()
            .filter(|entry| entry.document_id == document_id)
            .map(|entry| entry.id)
            .collect();
        let removed = victims.len();
        for id in victims {
            self.chunks.remove(&id);
        }
        Ok(removed)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.chunks.len())
    }

    async fn clear(&self) -> Result<()> {
        // Clearing is a mutation on every document: wait for in-flight
        // writes by taking each known document lock, in the same sorted
        // order upsert uses. The lock registry itself is kept, so any
        // mutation still in flight keeps racing against the same mutex.
        let mut doc_ids: Vec<Uuid> = self.doc_locks.iter().map(|entry| *entry.key()).collect();
        doc_ids.sort();

        let locks: Vec<Arc<Mutex<()>>> = doc_ids.iter().map(|id| self.lock_for(*id)).collect();
        let mut guards = Vec::with_capacity(locks.len());
        for lock in &locks {
            guards.push(lock.lock().await);
        }

        self.chunks.clear();
        Ok(())
    }
}
