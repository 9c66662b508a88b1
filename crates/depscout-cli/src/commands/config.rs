use anyhow::{Context, Result};
use clap::Subcommand;
use depscout_config::ConfigManager;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Initialize config file at ~/.depscout/config.toml
    Init,

    /// Show config file path
    Path,

    /// Validate config file
    Validate,

    /// Print the effective configuration as TOML
    Show,
}

/// Run a config subcommand; `path` overrides the default location
pub async fn handle_config_command(cmd: ConfigCommand, path: Option<PathBuf>) -> Result<()> {
    let config_path = match path {
        Some(path) => path,
        None => ConfigManager::config_path()?,
    };

    match cmd {
        ConfigCommand::Init => init_config(config_path).await,
        ConfigCommand::Path => {
            println!("{}", config_path.display());
            Ok(())
        }
        ConfigCommand::Validate => validate_config(config_path).await,
        ConfigCommand::Show => show_config(config_path).await,
    }
}

async fn init_config(config_path: PathBuf) -> Result<()> {
    if config_path.exists() {
        println!("Config already exists at: {}", config_path.display());
        println!("To reinitialize, please delete the existing config first.");
        return Ok(());
    }

    ConfigManager::init_at(&config_path)
        .await
        .with_context(|| format!("Failed to initialize config at {}", config_path.display()))?;
    println!("✓ Initialized config at: {}", config_path.display());
    Ok(())
}

async fn validate_config(config_path: PathBuf) -> Result<()> {
    let manager = ConfigManager::load_from(&config_path)
        .await
        .with_context(|| format!("Invalid config at {}", config_path.display()))?;
    let config = manager.config();

    println!("✓ Config is valid: {}", config_path.display());
    println!("  Workers: {}", config.resolver.worker_count);
    println!(
        "  Collector: {}",
        if config.npm.yarn { "yarn list" } else { "npm ls" }
    );
    println!(
        "  Registry lookups: {}",
        if config.registry.enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

async fn show_config(config_path: PathBuf) -> Result<()> {
    let mut config = ConfigManager::resolve(Some(&config_path))
        .await
        .or_else(|e| match e {
            depscout_config::ConfigError::ConfigNotFound(_) => Ok(Default::default()),
            e => Err(e),
        })?;
    if !config.npm.access_token.is_empty() {
        config.npm.access_token = "<redacted>".to_string();
    }
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
