mod config;
mod embedding;
mod format;
mod index;
mod review;

pub use config::{
    Config, DEFAULT_INDEX_NAME, DEFAULT_NAMESPACE, DEFAULT_OPENAI_URL, DEFAULT_PINECONE_URL,
    EmbeddingConfig, IndexSettings, IngestConfig, MAX_UPSERT_BATCH, OPENAI_API_KEY_ENV,
    PINECONE_API_KEY_ENV, Secrets, mask,
};
pub use embedding::{EmbeddingModel, ProviderKind};
pub use format::OutputFormat;
pub use index::{
    IndexConfig, IndexStats, IndexedVector, IngestionReport, Metric, ServerlessSpec,
    VectorMetadata,
};
pub use review::ReviewRecord;
