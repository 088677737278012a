//! Document ingestion pipeline
//!
//! Drives one document from extracted text to indexed chunks:
//! split, embed in batches, then a single upsert. The registry status
//! moves to `Processing` before any work starts and always lands on a
//! terminal state. Ingestion never returns `Err`; failures become a
//! `Failed` outcome with the index rolled back for that document.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::{ChunkingConfig, ProcessingConfig};
use crate::index::VectorIndex;
use crate::providers::EmbeddingProvider;
use crate::storage::DocumentRegistry;
use crate::types::{Chunk, ChunkSource};

use super::splitter::split_text;

/// Terminal outcome of one ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Document fully indexed
    Completed { chunk_count: u32 },
    /// Document marked failed; no chunks of this run remain in the index
    Failed { error: String },
}

impl IngestOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Splits, embeds, and indexes extracted document text
pub struct IngestionPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    registry: Arc<DocumentRegistry>,
    chunking: ChunkingConfig,
    embed_batch_size: usize,
    // Serializes whole ingest runs per document: delete-then-upsert must
    // not interleave between two runs for the same id, or both
    // generations end up indexed.
    runs: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl IngestionPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        registry: Arc<DocumentRegistry>,
        chunking: ChunkingConfig,
        processing: &ProcessingConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            registry,
            chunking,
            embed_batch_size: processing.embed_batch_size.max(1),
            runs: DashMap::new(),
        }
    }

    /// Ingest extracted text for a registered document
    ///
    /// Re-ingesting a document first drops its previous generation of
    /// chunks, so the index never holds two generations at once.
    pub async fn ingest(
        &self,
        document_id: Uuid,
        raw_text: &str,
        source: ChunkSource,
    ) -> IngestOutcome {
        let run_lock = self
            .runs
            .entry(document_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = run_lock.lock().await;

        self.registry.set_processing(document_id);

        match self.run(document_id, raw_text, source).await {
            Ok(chunk_count) => {
                self.registry.set_completed(document_id, chunk_count);
                tracing::info!(%document_id, chunk_count, "document ingested");
                IngestOutcome::Completed { chunk_count }
            }
            Err(e) => {
                let error = e.to_string();
                tracing::warn!(%document_id, error = %error, "ingestion failed");
                // Drop anything this run may have written.
                if let Err(cleanup) = self.index.delete_by_document(document_id).await {
                    tracing::error!(%document_id, error = %cleanup, "rollback failed");
                }
                self.registry.set_failed(document_id, error.clone());
                IngestOutcome::Failed { error }
            }
        }
    }

    async fn run(
        &self,
        document_id: Uuid,
        raw_text: &str,
        source: ChunkSource,
    ) -> crate::error::Result<u32> {
        // Previous generation goes first; a failed re-ingest must not
        // leave stale chunks answering queries as if nothing happened.
        self.index.delete_by_document(document_id).await?;

        let pieces = split_text(
            raw_text,
            self.chunking.chunk_size,
            self.chunking.chunk_overlap,
        )?;
        if pieces.is_empty() {
            tracing::info!(%document_id, "document has no extractable text");
            return Ok(0);
        }

        let mut chunks: Vec<Chunk> = pieces
            .into_iter()
            .enumerate()
            .map(|(i, content)| Chunk::new(document_id, i as u32, content, source.clone()))
            .collect();

        // All batches are embedded before anything is written, so an
        // embedding failure leaves the index untouched.
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.embed_batch_size) {
            embeddings.extend(self.embedder.embed(batch).await?);
        }

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        let chunk_count = chunks.len() as u32;
        self.index.upsert(chunks).await?;
        Ok(chunk_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::{Error, Result};
    use crate::index::InMemoryVectorIndex;
    use crate::types::{Document, DocumentStatus};

    struct FixedEmbedder {
        calls: AtomicUsize,
    }

    impl FixedEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct SlowEmbedder;

    #[async_trait]
    impl EmbeddingProvider for SlowEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(Error::provider("embedding backend down"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn pipeline_with(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<InMemoryVectorIndex>,
        registry: Arc<DocumentRegistry>,
    ) -> IngestionPipeline {
        IngestionPipeline::new(
            embedder,
            index,
            registry,
            ChunkingConfig {
                chunk_size: 40,
                chunk_overlap: 10,
            },
            &ProcessingConfig::default(),
        )
    }

    fn register(registry: &DocumentRegistry, filename: &str) -> Uuid {
        let doc = Document::new(filename.to_string());
        let id = doc.id;
        registry.insert(doc);
        id
    }

    #[tokio::test]
    async fn successful_ingestion_completes_and_indexes() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let registry = Arc::new(DocumentRegistry::new());
        let pipeline = pipeline_with(Arc::new(FixedEmbedder::new()), index.clone(), registry.clone());

        let id = register(&registry, "a.txt");
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(5);
        let outcome = pipeline
            .ingest(id, &text, ChunkSource::text("a.txt".to_string()))
            .await;

        let IngestOutcome::Completed { chunk_count } = outcome else {
            panic!("expected completion");
        };
        assert!(chunk_count > 1);
        assert_eq!(index.count().await.unwrap(), chunk_count as usize);

        let doc = registry.get(id).unwrap();
        assert_eq!(doc.status, DocumentStatus::Completed);
        assert_eq!(doc.chunk_count, chunk_count);
    }

    #[tokio::test]
    async fn empty_text_completes_with_zero_chunks() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let registry = Arc::new(DocumentRegistry::new());
        let pipeline = pipeline_with(Arc::new(FixedEmbedder::new()), index.clone(), registry.clone());

        let id = register(&registry, "empty.txt");
        let outcome = pipeline
            .ingest(id, "   \n  ", ChunkSource::text("empty.txt".to_string()))
            .await;

        assert_eq!(outcome, IngestOutcome::Completed { chunk_count: 0 });
        assert_eq!(registry.get(id).unwrap().status, DocumentStatus::Completed);
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn embedding_failure_marks_failed_and_leaves_index_clean() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let registry = Arc::new(DocumentRegistry::new());
        let pipeline = pipeline_with(Arc::new(FailingEmbedder), index.clone(), registry.clone());

        let id = register(&registry, "b.txt");
        let outcome = pipeline
            .ingest(id, "some text to index", ChunkSource::text("b.txt".to_string()))
            .await;

        assert!(matches!(outcome, IngestOutcome::Failed { .. }));
        let doc = registry.get(id).unwrap();
        assert_eq!(doc.status, DocumentStatus::Failed);
        assert!(doc.error.is_some());
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reingest_replaces_the_previous_generation() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let registry = Arc::new(DocumentRegistry::new());
        let pipeline = pipeline_with(Arc::new(FixedEmbedder::new()), index.clone(), registry.clone());

        let id = register(&registry, "c.txt");
        let source = ChunkSource::text("c.txt".to_string());
        let text = "Sentence one is here. Sentence two is here. ".repeat(4);

        pipeline.ingest(id, &text, source.clone()).await;
        let first_count = index.count().await.unwrap();

        pipeline.ingest(id, &text, source).await;
        assert_eq!(index.count().await.unwrap(), first_count);
    }

    #[tokio::test]
    async fn concurrent_reingest_keeps_a_single_generation() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let registry = Arc::new(DocumentRegistry::new());
        let pipeline = Arc::new(pipeline_with(
            Arc::new(SlowEmbedder),
            index.clone(),
            registry.clone(),
        ));

        let id = register(&registry, "e.txt");
        let source = ChunkSource::text("e.txt".to_string());
        let text = "One sentence of content here. Another sentence follows it. ".repeat(3);

        pipeline.ingest(id, &text, source.clone()).await;
        let one_generation = index.count().await.unwrap();
        assert!(one_generation > 1);

        let a = tokio::spawn({
            let (pipeline, text, source) = (pipeline.clone(), text.clone(), source.clone());
            async move { pipeline.ingest(id, &text, source).await }
        });
        let b = tokio::spawn({
            let (pipeline, text, source) = (pipeline.clone(), text.clone(), source.clone());
            async move { pipeline.ingest(id, &text, source).await }
        });
        assert!(a.await.unwrap().is_completed());
        assert!(b.await.unwrap().is_completed());

        assert_eq!(index.count().await.unwrap(), one_generation);
    }

    #[tokio::test]
    async fn failed_reingest_drops_the_previous_generation() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let registry = Arc::new(DocumentRegistry::new());
        let good = pipeline_with(Arc::new(FixedEmbedder::new()), index.clone(), registry.clone());
        let bad = pipeline_with(Arc::new(FailingEmbedder), index.clone(), registry.clone());

        let id = register(&registry, "d.txt");
        let source = ChunkSource::text("d.txt".to_string());

        good.ingest(id, "initial content for the document", source.clone())
            .await;
        assert!(index.count().await.unwrap() > 0);

        let outcome = bad.ingest(id, "replacement content", source).await;
        assert!(matches!(outcome, IngestOutcome::Failed { .. }));
        assert_eq!(index.count().await.unwrap(), 0);
    }
}
