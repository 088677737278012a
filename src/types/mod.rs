//! Core types for documents, chunks, and answers

pub mod answer;
pub mod document;

pub use answer::{Answer, IndexStats, RetrievedChunk, SourceDocument};
pub use document::{Chunk, ChunkSource, Document, DocumentStatus, FileType};
