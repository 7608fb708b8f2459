mod embedding;
mod index_manager;
mod pipeline;
mod rate_limit;
mod vector_store;

#[cfg(test)]
pub(crate) mod testing;

pub use embedding::{EmbeddingProvider, OpenAiProvider, create_provider};
pub use index_manager::{IndexAction, ensure_index};
pub use pipeline::{DEFAULT_MIN_INTERVAL, DEFAULT_UPSERT_BATCH, IngestionPipeline};
pub use rate_limit::RateLimiter;
pub use vector_store::{IndexService, PineconeClient};
