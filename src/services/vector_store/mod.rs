//! Vector index service abstraction layer.
//!
//! This module provides a trait-based abstraction over the remote index service so the
//! pipeline can run against the hosted backend or an in-memory double in tests.

mod pinecone;

pub use pinecone::PineconeClient;

use async_trait::async_trait;

use crate::error::IndexServiceError;
use crate::models::{IndexConfig, IndexStats, IndexedVector};

/// Thin request/response wrapper over a remote vector index service.
///
/// Implementations perform no business logic; remote errors are surfaced unchanged.
#[async_trait]
pub trait IndexService: Send + Sync {
    /// Names of every index in the project.
    async fn list_index_names(&self) -> Result<Vec<String>, IndexServiceError>;

    /// Create an index with the given name, dimension, metric and serverless spec.
    async fn create_index(&self, config: &IndexConfig) -> Result<(), IndexServiceError>;

    /// Delete an index by name.
    async fn delete_index(&self, name: &str) -> Result<(), IndexServiceError>;

    /// Insert or overwrite vectors by id. Returns the number of vectors written.
    async fn upsert(
        &self,
        index: &str,
        namespace: &str,
        vectors: &[IndexedVector],
    ) -> Result<u64, IndexServiceError>;

    /// Dimension, vector counts and per-namespace breakdown of an index.
    async fn describe_stats(&self, index: &str) -> Result<IndexStats, IndexServiceError>;
}
