use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::get_formatter;
use crate::models::{Config, OPENAI_API_KEY_ENV, OutputFormat, PINECONE_API_KEY_ENV, mask};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Initialize configuration file with defaults")]
    Init {
        #[arg(long, help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show current configuration")]
    Show,
    #[command(about = "Show configuration file path")]
    Path,
}

pub async fn handle_config(
    cmd: ConfigCommand,
    config: Config,
    config_path: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let path = config_path
        .or_else(Config::config_path)
        .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

    match cmd {
        ConfigCommand::Init { force } => handle_init(&path, force, format),
        ConfigCommand::Show => handle_show(&config, format),
        ConfigCommand::Path => handle_path(&path),
    }
}

fn handle_init(path: &Path, force: bool, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);

    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    Config::default()
        .save_to(path)
        .context("failed to write config")?;
    println!(
        "{}",
        formatter.format_message(&format!("Created config at: {}", path.display()))
    );
    Ok(())
}

fn handle_show(config: &Config, format: OutputFormat) -> Result<()> {
    let secrets = [OPENAI_API_KEY_ENV, PINECONE_API_KEY_ENV].map(|name| (name, secret_status(name)));

    if format == OutputFormat::Json {
        let env: serde_json::Map<String, serde_json::Value> = secrets
            .iter()
            .map(|(name, status)| (name.to_string(), status.clone().into()))
            .collect();
        let output = serde_json::json!({
            "config": config,
            "env": env,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print!("{}", toml::to_string_pretty(config)?);
    println!();
    println!("# Environment");
    for (name, status) in &secrets {
        println!("# {} = {}", name, status);
    }
    Ok(())
}

fn secret_status(name: &str) -> String {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => format!("set ({})", mask(&value)),
        _ => "missing".to_string(),
    }
}

fn handle_path(path: &Path) -> Result<()> {
    let state = if path.exists() { "active" } else { "would be" };
    println!("Config ({}): {}", state, path.display());

    if let Ok(cwd) = std::env::current_dir() {
        let env_path = cwd.join(".env");
        let state = if env_path.exists() { "active" } else { "would be" };
        println!(".env file ({}): {}", state, env_path.display());
    }
    Ok(())
}
