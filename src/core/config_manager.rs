// src/core/config_manager.rs
//! Unified configuration management: environment paths plus the injected
//! scraping configuration (sources, keywords, locations, schedule).

use crate::environment::EnvironmentConfig;
use crate::harvester::SourceDescriptor;
use crate::scheduler::SchedulePreset;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const DEFAULT_PORT: u16 = 4000;

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment: EnvironmentConfig,
    pub scraping: ScrapingConfig,
    pub port: u16,
}

/// HTTP client settings shared by every harvest request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestSettings {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub max_results_per_request: usize,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            user_agent: "HappyCareer-JobScraper/1.0 (Compliant API Usage)".to_string(),
            request_timeout_secs: 10,
            max_results_per_request: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    pub enabled: bool,
    pub sources: Vec<SourceDescriptor>,
    pub keywords: Vec<String>,
    pub locations: Vec<String>,
    /// Only the first N keywords are searched per run
    pub keywords_per_run: usize,
    /// Only the first N locations are searched per run
    pub locations_per_run: usize,
    pub schedule: SchedulePreset,
    /// Fixed UTC offset in hours for schedule evaluation. No daylight saving
    /// adjustment: -5 stays New York standard time all year.
    pub timezone_offset_hours: i32,
    /// Inter-request delay used when a compliant source reports no rate limit
    pub fallback_delay_ms: u64,
    pub harvest: HarvestSettings,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        Self {
            enabled: true,
            sources: vec![SourceDescriptor::github(), SourceDescriptor::stack_overflow()],
            keywords: strings(&[
                "software engineer",
                "developer",
                "programmer",
                "full stack",
                "frontend",
                "backend",
                "data scientist",
                "machine learning",
                "devops",
                "product manager",
                "designer",
                "analyst",
            ]),
            locations: strings(&[
                "San Francisco",
                "New York",
                "Los Angeles",
                "Chicago",
                "Austin",
                "Seattle",
                "Boston",
                "Denver",
                "Atlanta",
                "Remote",
                "United States",
                "Canada",
                "United Kingdom",
            ]),
            keywords_per_run: 3,
            locations_per_run: 2,
            schedule: SchedulePreset::Daily,
            timezone_offset_hours: -5,
            fallback_delay_ms: 5000,
            harvest: HarvestSettings::default(),
        }
    }
}

impl ScrapingConfig {
    /// Load from a TOML file; a missing file yields the defaults
    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            info!(
                "Scraping config {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn active_keywords(&self) -> &[String] {
        &self.keywords[..self.keywords_per_run.min(self.keywords.len())]
    }

    pub fn active_locations(&self) -> &[String] {
        &self.locations[..self.locations_per_run.min(self.locations.len())]
    }
}

impl ConfigManager {
    /// Load all configurations
    pub async fn load() -> Result<Self> {
        Self::from_environment(EnvironmentConfig::load()?).await
    }

    pub async fn from_environment(environment: EnvironmentConfig) -> Result<Self> {
        let scraping = ScrapingConfig::load(&environment.scraping_config_path).await?;
        let port = Self::load_port()?;

        Ok(Self {
            environment,
            scraping,
            port,
        })
    }

    fn load_port() -> Result<u16> {
        match std::env::var("ROCKET_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("ROCKET_PORT must be a valid port number")),
            Err(_) => Ok(DEFAULT_PORT),
        }
    }

    /// Ensure all required directories exist
    pub async fn ensure_directories(&self) -> Result<()> {
        self.environment.ensure_directories().await
    }
}
