use anyhow::{Context, Result};
use career_scraper::core::ConfigManager;
use career_scraper::environment::EnvironmentConfig;
use career_scraper::scrape_cli::{handle_scrape_command, ScrapeCli};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "career_scraper=info,compliance=info,rocket::server=off";

fn init_logging(log_path: Option<&Path>) -> Result<()> {
    let file_layer = match log_path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            Some(
                fmt::layer()
                    .json()
                    .with_writer(Mutex::new(file))
                    .with_current_span(false)
                    .with_span_list(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ScrapeCli::parse();

    let environment = EnvironmentConfig::load()?;
    environment.ensure_directories().await?;
    init_logging(environment.log_path.as_deref())?;

    let config = ConfigManager::from_environment(environment).await?;

    info!("Environment: {}", EnvironmentConfig::get_environment());
    info!(
        "Scraping config: {}",
        config.environment.scraping_config_path.display()
    );

    handle_scrape_command(cli, config).await
}
