//! Document registry and raw upload storage

pub mod registry;

pub use registry::{DocumentRegistry, UploadStore};
