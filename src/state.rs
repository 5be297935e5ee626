// src/state.rs
use crate::compliance::ComplianceRegistry;
use crate::core::{ConfigManager, Database, JobRepository};
use crate::harvester::HttpHarvester;
use crate::pipeline::{IngestionPipeline, SystemClock};
use crate::scheduler::ScrapingScheduler;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Everything the HTTP surface and the CLI share
#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub repository: JobRepository,
    pub scheduler: Arc<ScrapingScheduler>,
}

impl AppState {
    pub fn new(database: Database, scheduler: Arc<ScrapingScheduler>) -> Self {
        Self {
            repository: database.repository(),
            database,
            scheduler,
        }
    }

    /// Connect the database and wire the production pipeline
    pub async fn from_config(config: &ConfigManager, database_url: &str) -> Result<Self> {
        let database = Database::connect(database_url).await?;
        let harvester = HttpHarvester::new(&config.scraping.harvest)
            .context("Failed to build source harvester")?;

        let pipeline = IngestionPipeline::new(
            config.scraping.clone(),
            Arc::new(ComplianceRegistry::with_default_terms()),
            Arc::new(harvester),
            Arc::new(database.repository()),
            Arc::new(SystemClock::new()),
        );

        info!(
            sources = config.scraping.sources.len(),
            keywords = config.scraping.active_keywords().len(),
            locations = config.scraping.active_locations().len(),
            "Ingestion pipeline ready"
        );

        Ok(Self::new(
            database,
            Arc::new(ScrapingScheduler::new(Arc::new(pipeline))),
        ))
    }

    pub fn pipeline(&self) -> &Arc<IngestionPipeline> {
        self.scheduler.pipeline()
    }
}
