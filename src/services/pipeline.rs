//! Ingestion pipeline: embed every review, then load the batch into the index.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use super::embedding::EmbeddingProvider;
use super::index_manager::{IndexAction, ensure_index};
use super::rate_limit::RateLimiter;
use super::vector_store::IndexService;
use crate::error::IngestError;
use crate::models::{IndexConfig, IndexedVector, IngestionReport, ReviewRecord};
use crate::utils::{RetryConfig, with_retry};

/// Default spacing between embedding requests.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(5);

/// Default number of vectors per upsert call.
pub const DEFAULT_UPSERT_BATCH: usize = 100;

/// Orchestrates one all-or-nothing ingestion run.
///
/// Records are embedded sequentially, one provider call at a time, paced by the rate
/// limiter. Nothing is uploaded until every record has been embedded and validated.
pub struct IngestionPipeline {
    provider: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn IndexService>,
    limiter: RateLimiter,
    retry: RetryConfig,
    upsert_batch_size: usize,
    progress: ProgressBar,
}

impl IngestionPipeline {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, index: Arc<dyn IndexService>) -> Self {
        Self {
            provider,
            index,
            limiter: RateLimiter::fixed_interval(DEFAULT_MIN_INTERVAL),
            retry: RetryConfig::default(),
            upsert_batch_size: DEFAULT_UPSERT_BATCH,
            progress: ProgressBar::hidden(),
        }
    }

    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_upsert_batch_size(mut self, size: usize) -> Self {
        self.upsert_batch_size = size.max(1);
        self
    }

    /// Report per-record progress on the given bar.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Reset the index, embed `records` in order and upsert them under `namespace`.
    pub async fn run(
        &self,
        records: Vec<ReviewRecord>,
        config: &IndexConfig,
        namespace: &str,
    ) -> Result<IngestionReport, IngestError> {
        let start = Instant::now();

        // The model is fixed per run, so a schema mismatch is known before any remote call
        if self.provider.dimension() != config.dimension {
            return Err(IngestError::DimensionMismatch {
                expected: config.dimension,
                actual: self.provider.dimension(),
                record_id: None,
            });
        }

        let action = ensure_index(self.index.as_ref(), config).await?;
        if action == IndexAction::Recreated {
            info!(index = %config.name, "previous index replaced");
        }

        warn_on_duplicate_ids(&records);

        let records_read = records.len() as u64;
        let vectors = self.embed_all(records, config).await?;
        let vectors_upserted = self.upsert_all(&vectors, config, namespace).await?;

        let stats = self.index.describe_stats(&config.name).await?;
        info!(
            index = %config.name,
            namespace,
            total_vectors = stats.total_vector_count,
            "ingestion complete"
        );

        Ok(IngestionReport {
            index: config.name.clone(),
            namespace: namespace.to_string(),
            records_read,
            vectors_upserted,
            duration_ms: start.elapsed().as_millis() as u64,
            finished_at: chrono::Utc::now().to_rfc3339(),
            stats,
        })
    }

    async fn embed_all(
        &self,
        records: Vec<ReviewRecord>,
        config: &IndexConfig,
    ) -> Result<Vec<IndexedVector>, IngestError> {
        self.progress.set_length(records.len() as u64);
        let mut buffer = Vec::with_capacity(records.len());

        for record in records {
            let values = with_retry(&self.retry, || async {
                self.limiter.acquire().await;
                self.provider.embed(&record.review_text).await
            })
            .await
            .into_result()?;

            if values.len() != config.dimension {
                return Err(IngestError::DimensionMismatch {
                    expected: config.dimension,
                    actual: values.len(),
                    record_id: Some(record.professor_id),
                });
            }

            debug!(id = %record.professor_id, model = self.provider.model(), "embedded review");
            buffer.push(IndexedVector::from_record(record, values));
            self.progress.inc(1);
        }

        self.progress.finish_and_clear();
        Ok(buffer)
    }

    async fn upsert_all(
        &self,
        vectors: &[IndexedVector],
        config: &IndexConfig,
        namespace: &str,
    ) -> Result<u64, IngestError> {
        let mut upserted = 0;

        // Upsert is a keyed overwrite, so retrying a chunk is safe
        for chunk in vectors.chunks(self.upsert_batch_size) {
            let written = with_retry(&self.retry, || {
                self.index.upsert(&config.name, namespace, chunk)
            })
            .await
            .into_result()?;
            info!(index = %config.name, namespace, count = written, "upserted vectors");
            upserted += written;
        }

        Ok(upserted)
    }
}

fn warn_on_duplicate_ids(records: &[ReviewRecord]) {
    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(record.professor_id.as_str()) {
            warn!(
                id = %record.professor_id,
                "duplicate professor id, later review overwrites earlier one"
            );
        }
    }
}
