//! CLI module for the review ingestion tool.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Embed professor reviews and load them into a vector index.
#[derive(Debug, Parser)]
#[command(name = "review-ingest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(long, short = 'f', global = true, help = "Output format: text or json")]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Path to .env file holding API keys")]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reset the index and ingest all reviews
    Ingest(commands::IngestArgs),

    /// Show vector counts of the index
    Stats(commands::StatsArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_config_init_with_format_short_flag() {
        let cli = Cli::parse_from(["review-ingest", "config", "init", "--force", "-f", "json"]);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(matches!(
            cli.command,
            Commands::Config(commands::ConfigCommand::Init { force: true })
        ));
    }

    #[test]
    fn test_parse_ingest_args() {
        let cli = Cli::parse_from([
            "review-ingest",
            "--format",
            "json",
            "ingest",
            "data/reviews.json",
            "--namespace",
            "spring",
            "--dry-run",
        ]);

        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Commands::Ingest(args) => {
                assert_eq!(args.file, Some(PathBuf::from("data/reviews.json")));
                assert_eq!(args.namespace.as_deref(), Some("spring"));
                assert!(args.dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_stats_with_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["review-ingest", "stats", "--index", "reviews", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Stats(ref args) if args.index.as_deref() == Some("reviews")));
    }
}
