//! The question-answering engine facade
//!
//! Ties resolution, ingestion, retrieval, and generation together behind
//! one handle. Embedding and chat are trait objects, so the engine runs
//! the same against the HTTP client or test doubles.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::index::{InMemoryVectorIndex, VectorIndex};
use crate::ingestion::{extract_text, IngestOutcome, IngestionPipeline};
use crate::processing::IngestionQueue;
use crate::providers::{ChatProvider, EmbeddingProvider, OpenAiClient, ProviderResolver};
use crate::storage::{DocumentRegistry, UploadStore};
use crate::types::{Answer, ChunkSource, Document, IndexStats, RetrievedChunk, SourceDocument};

/// Document question-answering engine
pub struct RagEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    chat: Arc<dyn ChatProvider>,
    index: Arc<dyn VectorIndex>,
    registry: Arc<DocumentRegistry>,
    pipeline: Arc<IngestionPipeline>,
    queue: IngestionQueue,
    config: RagConfig,
}

impl RagEngine {
    /// Build an engine from configuration, resolving the provider and
    /// constructing the HTTP client for both embeddings and chat.
    pub fn from_config(config: RagConfig) -> Result<Self> {
        let resolver = ProviderResolver::new(config.provider.clone());
        let provider = resolver.resolve()?;
        tracing::info!(
            provider = %provider.provider,
            chat_model = %provider.chat_model,
            embedding_model = %provider.embedding_model,
            "provider resolved"
        );

        let client = Arc::new(OpenAiClient::new(provider, &config.http)?);
        Ok(Self::with_providers(config, client.clone(), client))
    }

    /// Build an engine around explicit provider implementations
    pub fn with_providers(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatProvider>,
    ) -> Self {
        let index: Arc<dyn VectorIndex> = Arc::new(InMemoryVectorIndex::new());
        let registry = Arc::new(DocumentRegistry::new());
        let pipeline = Arc::new(IngestionPipeline::new(
            embedder.clone(),
            index.clone(),
            registry.clone(),
            config.chunking.clone(),
            &config.processing,
        ));
        let uploads = Arc::new(UploadStore::new(config.storage.upload_dir.clone()));
        let queue = IngestionQueue::new(
            pipeline.clone(),
            registry.clone(),
            uploads,
            config.processing.queue_capacity,
        );

        Self {
            embedder,
            chat,
            index,
            registry,
            pipeline,
            queue,
            config,
        }
    }

    /// Spawn the configured number of background ingestion workers
    pub fn start_workers(&self) -> Vec<JoinHandle<()>> {
        self.queue.spawn_workers(self.config.processing.workers)
    }

    /// Queue an upload for background ingestion; returns the document ID
    pub async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<Uuid> {
        self.queue.submit(filename, bytes).await
    }

    /// Ingest an upload inline, without going through the queue
    ///
    /// Extraction errors surface as `Err`; pipeline failures surface as a
    /// `Failed` outcome with the document marked accordingly.
    pub async fn ingest_document(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(Uuid, IngestOutcome)> {
        let document = Document::new(filename.to_string());
        let document_id = document.id;
        let file_type = document.file_type.clone();
        let source = ChunkSource::from_document(&document);
        self.registry.insert(document);

        let text = match extract_text(filename, &file_type, bytes) {
            Ok(text) => text,
            Err(e) => {
                self.registry.set_failed(document_id, e.to_string());
                return Err(e);
            }
        };

        let outcome = self.pipeline.ingest(document_id, &text, source).await;
        Ok((document_id, outcome))
    }

    /// Answer a question from the indexed documents
    ///
    /// An empty index or no qualifying chunks is not an error: the answer
    /// states that nothing relevant was found and cites no sources. The
    /// generation call happens only when context exists.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        self.ask_with(question, None, None).await
    }

    /// `ask` with explicit retrieval parameters; `None` falls back to the
    /// configured defaults
    pub async fn ask_with(
        &self,
        question: &str,
        k: Option<usize>,
        min_similarity: Option<f32>,
    ) -> Result<Answer> {
        let started = Instant::now();
        let question = validated_query(question)?;

        let hits = self
            .retrieve(
                question,
                k.unwrap_or(self.config.retrieval.max_sources),
                min_similarity.unwrap_or(self.config.retrieval.similarity_threshold),
            )
            .await?;
        if hits.is_empty() {
            tracing::info!("no relevant context for question");
            return Ok(Answer::no_relevant_information(elapsed_ms(started)));
        }

        let prompt = PromptBuilder::build(question, &hits);
        let answer = self.chat.generate(&prompt).await?;

        let sources: Vec<SourceDocument> = hits
            .iter()
            .map(|hit| SourceDocument::from_chunk(&hit.chunk, hit.similarity))
            .collect();

        tracing::info!(
            sources = sources.len(),
            elapsed_ms = elapsed_ms(started),
            "question answered"
        );
        Ok(Answer::new(answer, sources, elapsed_ms(started)))
    }

    /// Retrieve qualifying chunks for a question without generating
    pub async fn retrieve_only(
        &self,
        question: &str,
        k: Option<usize>,
    ) -> Result<Vec<RetrievedChunk>> {
        let question = validated_query(question)?;
        self.retrieve(
            question,
            k.unwrap_or(self.config.retrieval.max_sources),
            self.config.retrieval.similarity_threshold,
        )
        .await
    }

    async fn retrieve(
        &self,
        question: &str,
        k: usize,
        min_similarity: f32,
    ) -> Result<Vec<RetrievedChunk>> {
        let query = self.embedder.embed_query(question).await?;
        self.index.search(&query, k, min_similarity).await
    }

    /// Delete a document and every chunk it contributed
    ///
    /// Returns the number of chunks removed. Unknown IDs delete nothing
    /// and return 0.
    pub async fn delete_document(&self, document_id: Uuid) -> Result<usize> {
        let removed = self.index.delete_by_document(document_id).await?;
        self.registry.remove(document_id);
        tracing::info!(%document_id, removed, "document deleted");
        Ok(removed)
    }

    /// Look up a document record
    pub fn document(&self, document_id: Uuid) -> Option<Document> {
        self.registry.get(document_id)
    }

    /// All registered documents, newest first
    pub fn documents(&self) -> Vec<Document> {
        self.registry.list()
    }

    /// Current index and registry counts
    pub async fn stats(&self) -> Result<IndexStats> {
        Ok(IndexStats {
            document_count: self.registry.len(),
            chunk_count: self.index.count().await?,
        })
    }

    /// Drop every document and chunk
    pub async fn clear(&self) -> Result<()> {
        self.index.clear().await?;
        for doc in self.registry.list() {
            self.registry.remove(doc.id);
        }
        Ok(())
    }
}

/// Reject blank questions before any network round trip
fn validated_query(question: &str) -> Result<&str> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidQuery("question is empty".to_string()));
    }
    Ok(trimmed)
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
