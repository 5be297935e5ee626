// src/environment.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub database_path: PathBuf,
    pub scraping_config_path: PathBuf,
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: EnvironmentConfig,
    production: EnvironmentConfig,
}

impl EnvironmentConfig {
    /// Load configuration based on environment
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let config_path = PathBuf::from(CONFIG_FILE);
        let env_config = if config_path.exists() {
            Self::load_from_file(&config_path, &environment)?
        } else {
            info!("{} not found, using built-in defaults", CONFIG_FILE);
            Self::defaults_for(&environment)
        };

        Ok(Self {
            database_path: Self::resolve_path(&env_config.database_path)?,
            scraping_config_path: Self::resolve_path(&env_config.scraping_config_path)?,
            log_path: env_config
                .log_path
                .as_ref()
                .map(|path| Self::resolve_path(path))
                .transpose()?,
        })
    }

    pub fn get_environment() -> String {
        std::env::var("SCRAPER_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .or_else(|_| std::env::var("ENV"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn load_from_file(path: &Path, environment: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content, environment)
    }

    fn parse(content: &str, environment: &str) -> Result<Self> {
        let config_file: ConfigFile =
            serde_yaml::from_str(content).context("Failed to parse config.yaml")?;

        Ok(match environment {
            "production" => config_file.production,
            _ => config_file.local,
        })
    }

    fn defaults_for(environment: &str) -> Self {
        let base = if environment == "production" {
            PathBuf::from("/app")
        } else {
            PathBuf::from(".")
        };

        Self {
            database_path: base.join("data").join("happycareer.db"),
            scraping_config_path: base.join("scraping.toml"),
            log_path: None,
        }
    }

    fn resolve_path(path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }

    /// SQLite connection URL; `DATABASE_URL` takes precedence over the configured path
    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| format!("sqlite:{}?mode=rwc", self.database_path.display()))
    }

    /// Ensure the directories holding the database and log file exist
    pub async fn ensure_directories(&self) -> Result<()> {
        let parents = [Some(self.database_path.as_path()), self.log_path.as_deref()];

        for parent in parents.into_iter().flatten().filter_map(Path::parent) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        info!("All configured directories ensured to exist");
        Ok(())
    }
}
