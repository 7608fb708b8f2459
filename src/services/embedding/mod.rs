//! Embedding provider abstraction.
//!
//! A provider is selected once per run from configuration; the pipeline only ever
//! sees the [`EmbeddingProvider`] trait.

mod openai;

pub use openai::OpenAiProvider;

use async_trait::async_trait;

use crate::error::EmbeddingError;
use crate::models::{EmbeddingConfig, ProviderKind};

/// Turns a single text into a fixed-length vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one input text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Model identifier sent to the provider.
    fn model(&self) -> &str;

    /// Length of every vector this provider returns.
    fn dimension(&self) -> usize;
}

/// Create the configured embedding backend.
pub fn create_provider(
    config: &EmbeddingConfig,
    api_key: String,
) -> Result<Box<dyn EmbeddingProvider>, EmbeddingError> {
    match config.provider {
        ProviderKind::OpenAi => Ok(Box::new(OpenAiProvider::new(config, api_key)?)),
    }
}
