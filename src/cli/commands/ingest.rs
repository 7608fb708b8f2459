//! Ingest command implementation.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::cli::output::{ValidationInfo, get_formatter};
use crate::models::{Config, OutputFormat, Secrets};
use crate::services::{IngestionPipeline, PineconeClient, RateLimiter, create_provider};
use crate::sources::{JsonReviewSource, RecordSource};

/// Arguments for the ingest command.
#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Path to the reviews JSON file (defaults to `ingest.source` from config)
    #[arg()]
    pub file: Option<PathBuf>,

    /// Namespace to write vectors under
    #[arg(long, short = 'n')]
    pub namespace: Option<String>,

    /// Target index name
    #[arg(long, short = 'i')]
    pub index: Option<String>,

    /// Minimum delay between embedding requests in milliseconds
    #[arg(long)]
    pub min_interval_ms: Option<u64>,

    /// Validate the source file without calling any remote service
    #[arg(long)]
    pub dry_run: bool,
}

/// Handle the ingest command.
pub async fn handle_ingest(
    args: IngestArgs,
    mut config: Config,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let formatter = get_formatter(format);

    if let Some(index) = args.index {
        config.index.name = index;
    }
    if let Some(namespace) = args.namespace {
        config.index.namespace = namespace;
    }
    if let Some(interval) = args.min_interval_ms {
        config.ingest.min_interval_ms = interval;
    }
    config.validate()?;

    let source = JsonReviewSource::new(args.file.unwrap_or_else(|| config.ingest.source.clone()));
    let records = source
        .read_records()
        .with_context(|| format!("failed to load reviews from {}", source.name()))?;
    info!(source = %source.name(), records = records.len(), "loaded reviews");

    let index_config = config.index_config();
    let namespace = config.index.namespace.clone();

    if args.dry_run {
        let unique_ids = records
            .iter()
            .map(|r| r.professor_id.as_str())
            .collect::<HashSet<_>>()
            .len();
        print!(
            "{}",
            formatter.format_validation(&ValidationInfo {
                source: source.name(),
                records: records.len(),
                unique_ids,
                index: index_config.name.clone(),
                dimension: index_config.dimension,
                namespace,
            })
        );
        return Ok(());
    }

    let secrets = Secrets::from_env()?;
    let provider = create_provider(&config.embedding, secrets.embedding_api_key)
        .context("failed to create embedding provider")?;
    let index = PineconeClient::new(
        &config.index.control_url,
        secrets.index_api_key,
        Duration::from_secs(config.index.ready_timeout_secs),
    )
    .context("failed to create index client")?;

    let progress = if verbose || format == OutputFormat::Json {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(records.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .unwrap()
                .progress_chars("#>-"),
        );
        pb
    };

    let pipeline = IngestionPipeline::new(Arc::from(provider), Arc::new(index))
        .with_rate_limiter(RateLimiter::new(
            config.ingest.burst,
            config.ingest.min_interval(),
        ))
        .with_retry_config(config.ingest.retry_config())
        .with_upsert_batch_size(config.index.upsert_batch_size)
        .with_progress(progress);

    let report = pipeline
        .run(records, &index_config, &namespace)
        .await
        .context("ingestion failed")?;

    print!("{}", formatter.format_report(&report));

    Ok(())
}
