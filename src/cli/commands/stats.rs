use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat, Secrets};
use crate::services::{IndexService, PineconeClient};

/// Arguments for the stats command.
#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Index to describe (defaults to `index.name` from config)
    #[arg(long, short = 'i')]
    pub index: Option<String>,
}

pub async fn handle_stats(args: StatsArgs, config: Config, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let index = args.index.unwrap_or_else(|| config.index.name.clone());

    let client = PineconeClient::new(
        &config.index.control_url,
        Secrets::index_key_from_env()?,
        Duration::from_secs(config.index.ready_timeout_secs),
    )?;

    let stats = client
        .describe_stats(&index)
        .await
        .with_context(|| format!("failed to describe index {}", index))?;

    print!("{}", formatter.format_stats(&index, &stats));

    Ok(())
}
