//! docrag: document question-answering over an embedded vector index
//!
//! Documents are split into overlapping chunks, embedded through an
//! OpenAI-compatible provider, and indexed for cosine similarity search.
//! Questions are answered by an LLM grounded in the retrieved chunks,
//! with every answer citing its sources.

pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod index;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod storage;
pub mod types;

pub use config::RagConfig;
pub use engine::RagEngine;
pub use error::{Error, Result};
pub use types::{
    Answer, Chunk, ChunkSource, Document, DocumentStatus, FileType, IndexStats, RetrievedChunk,
    SourceDocument,
};
