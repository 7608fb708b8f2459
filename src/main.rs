use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use review_ingest::cli::commands::{ConfigCommand, handle_config, handle_ingest, handle_stats};
use review_ingest::cli::output::get_formatter;
use review_ingest::cli::{Cli, Commands};
use review_ingest::models::{Config, OutputFormat};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let format = cli.format.unwrap_or_default();

    match run(cli, format).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let formatter = get_formatter(format);
            eprintln!("{}", formatter.format_error(&format!("{:#}", e)).trim_end());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, format: OutputFormat) -> Result<()> {
    // API keys may live in a .env file; real environment variables win
    match cli.env_file {
        Some(ref path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load env file {}", path.display()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    let config = match (&cli.config, &cli.command) {
        // `config init` creates the file an explicit --config points at
        (Some(path), Commands::Config(ConfigCommand::Init { .. })) if !path.exists() => {
            Config::default()
        }
        (Some(path), _) => Config::load_from(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        (None, _) => Config::load().context("failed to load configuration")?,
    };

    init_tracing(&config.log_level, cli.verbose);

    tokio::select! {
        result = run_command(cli.command, config, cli.config, format, cli.verbose) => {
            result?;
        }
        _ = shutdown_signal() => {
            anyhow::bail!("interrupted, index may be partially populated");
        }
    }

    Ok(())
}

/// Log to stderr so stdout only carries command output.
fn init_tracing(log_level: &str, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(if verbose { "debug" } else { log_level }))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_command(
    command: Commands,
    config: Config,
    config_path: Option<std::path::PathBuf>,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    match command {
        Commands::Ingest(args) => {
            handle_ingest(args, config, format, verbose).await?;
        }
        Commands::Stats(args) => {
            handle_stats(args, config, format).await?;
        }
        Commands::Config(cmd) => {
            handle_config(cmd, config, config_path, format).await?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
