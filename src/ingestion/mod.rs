//! Document ingestion: extraction, splitting, and the pipeline

pub mod extract;
pub mod pipeline;
pub mod splitter;

pub use extract::extract_text;
pub use pipeline::{IngestOutcome, IngestionPipeline};
pub use splitter::split_text;
