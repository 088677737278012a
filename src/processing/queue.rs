//! Bounded ingestion queue with worker tasks
//!
//! Uploads are accepted immediately as `Pending` documents and processed
//! by background workers. The channel is bounded, so a flood of uploads
//! backpressures `submit` instead of exhausting memory.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ingestion::{extract_text, IngestionPipeline};
use crate::storage::{DocumentRegistry, UploadStore};
use crate::types::{ChunkSource, Document};

/// One queued upload awaiting ingestion
pub struct IngestJob {
    pub document_id: Uuid,
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Accepts uploads and feeds them to ingestion workers
pub struct IngestionQueue {
    tx: mpsc::Sender<IngestJob>,
    rx: Arc<Mutex<mpsc::Receiver<IngestJob>>>,
    registry: Arc<DocumentRegistry>,
    uploads: Arc<UploadStore>,
    pipeline: Arc<IngestionPipeline>,
}

impl IngestionQueue {
    pub fn new(
        pipeline: Arc<IngestionPipeline>,
        registry: Arc<DocumentRegistry>,
        uploads: Arc<UploadStore>,
        capacity: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            registry,
            uploads,
            pipeline,
        }
    }

    /// Register an upload and queue it for ingestion
    ///
    /// Returns the document ID immediately; progress is observable through
    /// the registry. Waits when the queue is full.
    pub async fn submit(&self, filename: &str, bytes: Vec<u8>) -> Result<Uuid> {
        let document = Document::new(filename.to_string());
        let document_id = document.id;
        self.registry.insert(document);

        // Raw upload persistence is best effort; losing the copy on disk
        // does not block ingestion of the bytes already in hand.
        match self.uploads.save(document_id, filename, &bytes).await {
            Ok(path) => self.registry.set_storage_path(document_id, path),
            Err(e) => {
                tracing::warn!(%document_id, error = %e, "failed to persist raw upload")
            }
        }

        let job = IngestJob {
            document_id,
            filename: filename.to_string(),
            bytes,
        };
        if self.tx.send(job).await.is_err() {
            let message = "ingestion queue is shut down".to_string();
            self.registry.set_failed(document_id, message.clone());
            return Err(Error::Queue(message));
        }

        tracing::info!(%document_id, filename, "upload queued");
        Ok(document_id)
    }

    /// Spawn `n` worker tasks draining the queue
    ///
    /// Workers exit when every queue handle is dropped and the channel
    /// drains.
    pub fn spawn_workers(&self, n: usize) -> Vec<JoinHandle<()>> {
        (0..n.max(1))
            .map(|worker_id| {
                let rx = self.rx.clone();
                let registry = self.registry.clone();
                let pipeline = self.pipeline.clone();
                tokio::spawn(async move {
                    loop {
                        let job = { rx.lock().await.recv().await };
                        let Some(job) = job else {
                            tracing::debug!(worker_id, "queue closed, worker exiting");
                            break;
                        };
                        process_job(&registry, &pipeline, job).await;
                    }
                })
            })
            .collect()
    }
}

async fn process_job(
    registry: &DocumentRegistry,
    pipeline: &IngestionPipeline,
    job: IngestJob,
) {
    let Some(document) = registry.get(job.document_id) else {
        tracing::warn!(document_id = %job.document_id, "job for unknown document dropped");
        return;
    };

    let text = match extract_text(&job.filename, &document.file_type, &job.bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(document_id = %job.document_id, error = %e, "extraction failed");
            registry.set_failed(job.document_id, e.to_string());
            return;
        }
    };

    let source = ChunkSource::from_document(&document);
    pipeline.ingest(job.document_id, &text, source).await;
}
