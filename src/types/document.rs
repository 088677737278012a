//! Document and chunk types with source tracking for citations

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Supported file types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// PDF document
    Pdf,
    /// Word-processor document (.docx/.doc); extraction delegated externally
    Docx,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            "pdf" => Self::Pdf,
            "docx" | "doc" => Self::Docx,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a filename
    pub fn from_filename(filename: &str) -> Self {
        filename
            .rsplit_once('.')
            .map(|(_, ext)| Self::from_extension(ext))
            .unwrap_or(Self::Unknown)
    }

    /// Get display name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Txt => "Text File",
            Self::Markdown => "Markdown",
            Self::Pdf => "PDF",
            Self::Docx => "Word Document",
            Self::Unknown => "Unknown",
        }
    }
}

/// Ingestion status of a document
///
/// `Pending → Processing → Completed | Failed`. The pipeline sets
/// `Processing` before any chunking or embedding work begins, so a crash
/// mid-ingestion is observable as stuck-in-processing rather than lost.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    /// Terminal states are never advanced by the pipeline again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A document registered for ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Original filename as uploaded
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// Where the raw upload was stored (date-partitioned), if persisted
    pub storage_path: Option<PathBuf>,
    /// Ingestion status
    pub status: DocumentStatus,
    /// Number of chunks created by the last completed ingestion
    pub chunk_count: u32,
    /// Failure reason when status is `Failed`
    pub error: Option<String>,
    /// Creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a new pending document
    pub fn new(filename: String) -> Self {
        let file_type = FileType::from_filename(&filename);
        Self {
            id: Uuid::new_v4(),
            filename,
            file_type,
            storage_path: None,
            status: DocumentStatus::Pending,
            chunk_count: 0,
            error: None,
            created_at: chrono::Utc::now(),
        }
    }
}

/// Source information carried with each chunk, used for citations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSource {
    /// Original filename as uploaded
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// Page number (1-indexed), when the extractor reports one
    pub page_number: Option<u32>,
}

impl ChunkSource {
    /// Source info for a plain text document
    pub fn text(filename: String) -> Self {
        Self {
            filename,
            file_type: FileType::Txt,
            page_number: None,
        }
    }

    /// Source info derived from a document record
    pub fn from_document(doc: &Document) -> Self {
        Self {
            filename: doc.filename.clone(),
            file_type: doc.file_type.clone(),
            page_number: None,
        }
    }
}

/// A contiguous span of a document's extracted text
///
/// Chunks are immutable once created; they are destroyed only when the
/// owning document is deleted or re-ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Owning document ID
    pub document_id: Uuid,
    /// Position within the document's chunk sequence
    pub chunk_index: u32,
    /// Text content
    pub content: String,
    /// Content length in characters
    pub char_len: usize,
    /// Embedding vector; empty until the gateway fills it in
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
    /// Source information for citations
    pub source: ChunkSource,
}

impl Chunk {
    /// Create a new chunk without an embedding
    pub fn new(document_id: Uuid, chunk_index: u32, content: String, source: ChunkSource) -> Self {
        let char_len = content.chars().count();
        Self {
            id: Uuid::new_v4(),
            document_id,
            chunk_index,
            content,
            char_len,
            embedding: Vec::new(),
            source,
        }
    }
}
