//! Document registry and upload persistence
//!
//! The registry is the authority on document status. Status moves
//! `Pending → Processing → Completed | Failed`; terminal states are never
//! advanced again.

use std::path::PathBuf;

use dashmap::DashMap;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{Document, DocumentStatus};

/// Concurrent map of registered documents
pub struct DocumentRegistry {
    documents: DashMap<Uuid, Document>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Register a document record
    pub fn insert(&self, document: Document) {
        self.documents.insert(document.id, document);
    }

    /// Look up a document by ID
    pub fn get(&self, id: Uuid) -> Option<Document> {
        self.documents.get(&id).map(|entry| entry.clone())
    }

    /// All registered documents, newest first
    pub fn list(&self) -> Vec<Document> {
        let mut docs: Vec<Document> = self
            .documents
            .iter()
            .map(|entry| entry.clone())
            .collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        docs
    }

    /// Remove a document record; returns it if it existed
    pub fn remove(&self, id: Uuid) -> Option<Document> {
        self.documents.remove(&id).map(|(_, doc)| doc)
    }

    /// Number of registered documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Mark a document as processing
    pub fn set_processing(&self, id: Uuid) {
        if let Some(mut entry) = self.documents.get_mut(&id) {
            if !entry.status.is_terminal() {
                entry.status = DocumentStatus::Processing;
            }
        }
    }

    /// Mark a document as completed with its final chunk count
    pub fn set_completed(&self, id: Uuid, chunk_count: u32) {
        if let Some(mut entry) = self.documents.get_mut(&id) {
            entry.status = DocumentStatus::Completed;
            entry.chunk_count = chunk_count;
            entry.error = None;
        }
    }

    /// Mark a document as failed with a reason
    pub fn set_failed(&self, id: Uuid, error: String) {
        if let Some(mut entry) = self.documents.get_mut(&id) {
            entry.status = DocumentStatus::Failed;
            entry.chunk_count = 0;
            entry.error = Some(error);
        }
    }

    /// Record where the raw upload landed on disk
    pub fn set_storage_path(&self, id: Uuid, path: PathBuf) {
        if let Some(mut entry) = self.documents.get_mut(&id) {
            entry.storage_path = Some(path);
        }
    }
}

impl Default for DocumentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Date-partitioned storage for raw uploads
///
/// Files land at `<root>/<YYYY-MM-DD>/<document_id>_<filename>` so a day's
/// uploads can be inspected or swept together.
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Persist raw upload bytes, returning the final path
    pub async fn save(&self, document_id: Uuid, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        let partition = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let dir = self.root.join(partition);
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(format!("{document_id}_{}", sanitize_filename(filename)));
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), "upload stored");
        Ok(path)
    }
}

/// Keep the original name recognizable while refusing path traversal
fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    base.chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions_stop_at_terminal() {
        let registry = DocumentRegistry::new();
        let doc = Document::new("a.txt".to_string());
        let id = doc.id;
        registry.insert(doc);

        registry.set_processing(id);
        assert_eq!(registry.get(id).unwrap().status, DocumentStatus::Processing);

        registry.set_completed(id, 5);
        let doc = registry.get(id).unwrap();
        assert_eq!(doc.status, DocumentStatus::Completed);
        assert_eq!(doc.chunk_count, 5);

        // Terminal: a late set_processing must not reopen the document
        registry.set_processing(id);
        assert_eq!(registry.get(id).unwrap().status, DocumentStatus::Completed);
    }

    #[test]
    fn failure_records_the_reason_and_zeroes_chunks() {
        let registry = DocumentRegistry::new();
        let doc = Document::new("a.txt".to_string());
        let id = doc.id;
        registry.insert(doc);

        registry.set_failed(id, "extraction failed".to_string());
        let doc = registry.get(id).unwrap();
        assert_eq!(doc.status, DocumentStatus::Failed);
        assert_eq!(doc.chunk_count, 0);
        assert_eq!(doc.error.as_deref(), Some("extraction failed"));
    }

    #[test]
    fn sanitize_strips_directory_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\temp\\report.txt"), "report.txt");
        assert_eq!(sanitize_filename("plain.txt"), "plain.txt");
    }

    #[tokio::test]
    async fn save_partitions_by_date() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        let id = Uuid::new_v4();

        let path = store.save(id, "notes.txt", b"hello").await.unwrap();
        assert!(path.exists());
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"hello");

        let partition = path.parent().unwrap().file_name().unwrap().to_string_lossy();
        assert_eq!(partition.len(), "2025-01-01".len());
    }
}
