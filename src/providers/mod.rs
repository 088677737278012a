//! Model provider traits, resolution, and the HTTP client

pub mod chat;
pub mod embedding;
pub mod openai;
pub mod resolver;

pub use chat::ChatProvider;
pub use embedding::EmbeddingProvider;
pub use openai::OpenAiClient;
pub use resolver::{ProviderConfig, ProviderResolver};
