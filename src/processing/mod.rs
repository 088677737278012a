//! Background ingestion queue and workers

pub mod queue;

pub use queue::{IngestJob, IngestionQueue};
