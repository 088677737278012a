//! Answer and retrieval result types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::{Chunk, FileType};

/// Maximum excerpt length carried in a source citation
const SOURCE_EXCERPT_CHARS: usize = 300;

/// One cited source backing an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Originating document ID
    pub document_id: Uuid,
    /// Document name shown to the user
    pub document_name: String,
    /// File type of the source
    pub file_type: FileType,
    /// Excerpt of the supporting chunk (truncated to a display-friendly length)
    pub content: String,
    /// Normalized similarity score in [0, 1]
    pub similarity_score: f32,
    /// Page number, when known
    pub page_number: Option<u32>,
}

impl SourceDocument {
    /// Build a citation from a retrieved chunk and its similarity
    pub fn from_chunk(chunk: &Chunk, similarity_score: f32) -> Self {
        let mut content: String = chunk.content.chars().take(SOURCE_EXCERPT_CHARS).collect();
        if chunk.char_len > SOURCE_EXCERPT_CHARS {
            content.push_str("...");
        }
        Self {
            document_id: chunk.document_id,
            document_name: chunk.source.filename.clone(),
            file_type: chunk.source.file_type.clone(),
            content,
            similarity_score,
            page_number: chunk.source.page_number,
        }
    }
}

/// Generated answer for a question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Answer text
    pub answer: String,
    /// Cited sources in descending-similarity order
    pub sources: Vec<SourceDocument>,
    /// Wall-clock time for the whole ask call, in milliseconds
    pub processing_time_ms: u64,
}

impl Answer {
    /// Create an answer with sources
    pub fn new(answer: String, sources: Vec<SourceDocument>, processing_time_ms: u64) -> Self {
        Self {
            answer,
            sources,
            processing_time_ms,
        }
    }

    /// The well-defined "nothing relevant" outcome: a successful answer
    /// with an empty source list, not an error.
    pub fn no_relevant_information(processing_time_ms: u64) -> Self {
        Self {
            answer: "I couldn't find relevant information in the documents to answer this question."
                .to_string(),
            sources: Vec::new(),
            processing_time_ms,
        }
    }
}

/// A chunk returned by retrieval without generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// The retrieved chunk (embedding omitted)
    pub chunk: Chunk,
    /// Normalized similarity score in [0, 1]
    pub similarity: f32,
}

/// Counts exposed to the caller via `stats()`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexStats {
    /// Registered documents
    pub document_count: usize,
    /// Indexed chunks
    pub chunk_count: usize,
}
