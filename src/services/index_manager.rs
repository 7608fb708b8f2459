//! Index lifecycle: make the target index exist with the requested schema.

use tracing::info;

use super::vector_store::IndexService;
use crate::error::IndexServiceError;
use crate::models::IndexConfig;

/// What `ensure_index` had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexAction {
    /// No index with the name existed.
    Created,
    /// A stale index was deleted and created again.
    Recreated,
}

/// Reset the target index so every run starts from an empty index with `config`'s schema.
///
/// An existing index of the same name is always deleted first, whatever its dimension
/// or metric, so stale schemas never survive across runs.
pub async fn ensure_index(
    service: &dyn IndexService,
    config: &IndexConfig,
) -> Result<IndexAction, IndexServiceError> {
    let existing = service.list_index_names().await?;

    let action = if existing.iter().any(|name| name == &config.name) {
        info!(index = %config.name, "deleting existing index");
        service.delete_index(&config.name).await?;
        IndexAction::Recreated
    } else {
        IndexAction::Created
    };

    info!(
        index = %config.name,
        dimension = config.dimension,
        metric = %config.metric,
        cloud = %config.spec.cloud,
        region = %config.spec.region,
        "creating index"
    );
    service.create_index(config).await?;

    Ok(action)
}
