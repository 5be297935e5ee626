// src/pipeline/mod.rs
//! Compliance-gated ingestion: for every configured source, ask the registry,
//! harvest each (keyword, location) unit within the source's rate limit, and
//! write the results through the deduplicating store.

use crate::compliance::ComplianceRegistry;
use crate::core::config_manager::ScrapingConfig;
use crate::core::database::{InsertOutcome, JobStore, NewCompany, NewJob};
use crate::harvester::{Harvester, NormalizedJobRecord, SourceDescriptor};
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub mod rate_limiter;
pub mod summary;
pub mod work;

pub use rate_limiter::{Clock, ManualClock, RateLimiter, SystemClock};
pub use summary::{
    RunOutcome, RunSummary, RunTotals, SourceStatus, SourceSummary, UnitOutcome, UnitReport,
};
pub use work::{WorkQueue, WorkUnit};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("no compliant sources available for scraping")]
    NoCompliantSources,
    #[error("a scraping run is already in progress")]
    AlreadyRunning,
}

enum RecordOutcome {
    Created,
    Duplicate,
}

pub struct IngestionPipeline {
    config: RwLock<ScrapingConfig>,
    registry: Arc<ComplianceRegistry>,
    harvester: Arc<dyn Harvester>,
    store: Arc<dyn JobStore>,
    rate_limiter: RateLimiter,
}

impl IngestionPipeline {
    pub fn new(
        config: ScrapingConfig,
        registry: Arc<ComplianceRegistry>,
        harvester: Arc<dyn Harvester>,
        store: Arc<dyn JobStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let rate_limiter =
            RateLimiter::new(clock, Duration::from_millis(config.fallback_delay_ms));

        Self {
            config: RwLock::new(config),
            registry,
            harvester,
            store,
            rate_limiter,
        }
    }

    pub async fn config(&self) -> ScrapingConfig {
        self.config.read().await.clone()
    }

    /// Replace the configuration used by subsequent runs. A run in progress
    /// keeps the snapshot it started with.
    pub async fn replace_config(&self, config: ScrapingConfig) {
        *self.config.write().await = config;
        info!("Scraping configuration replaced");
    }

    pub fn registry(&self) -> &ComplianceRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// Runs every configured source once. Per-unit and per-record failures
    /// are reported in the summary; only the absence of any compliant source
    /// ends the run early.
    pub async fn start_scraping(&self) -> Result<RunSummary, PipelineError> {
        let config = self.config().await;
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        info!(run_id = %run_id, "Starting compliant job scraping run");

        let report = self.registry.compliance_report();
        info!(
            run_id = %run_id,
            compliant = ?report.compliant_sources,
            non_compliant = ?report.non_compliant_sources,
            "Compliance report"
        );

        if report.compliant_sources.is_empty() {
            error!(run_id = %run_id, "No compliant sources available for scraping");
            return Err(PipelineError::NoCompliantSources);
        }

        let keywords = config.active_keywords();
        let locations = config.active_locations();
        let mut sources = Vec::with_capacity(config.sources.len());

        for source in &config.sources {
            if !self.registry.is_scraping_allowed(&source.name) {
                self.registry
                    .log_violation(&source.name, "Attempted to scrape non-compliant source");
                sources.push(SourceSummary::skipped(&source.name));
                continue;
            }

            let rate_limit = self.registry.rate_limit(&source.name);
            info!(
                run_id = %run_id,
                source = %source.name,
                rate_limit,
                "Scraping compliant source"
            );

            let mut units = Vec::new();
            for unit in WorkQueue::new(source, keywords, locations) {
                self.rate_limiter
                    .wait_for_slot(&source.name, rate_limit)
                    .await;
                units.push(self.process_unit(unit).await);
            }

            let summary = SourceSummary::from_units(&source.name, units);
            if let SourceStatus::Failed { error } = &summary.status {
                error!(source = %source.name, "Every search against source failed: {}", error);
            }
            sources.push(summary);
        }

        let summary = RunSummary::completed(run_id, started_at, sources);
        info!(
            run_id = %run_id,
            created = summary.totals.jobs_created,
            duplicates = summary.totals.duplicates,
            units_failed = summary.totals.units_failed,
            sources_skipped = summary.totals.sources_skipped,
            "Scraping run completed"
        );

        Ok(summary)
    }

    async fn process_unit(&self, unit: WorkUnit<'_>) -> UnitReport {
        let outcome = match self
            .harvester
            .harvest(unit.source, unit.keyword, unit.location)
            .await
        {
            Ok(records) => self.persist_batch(unit.source, records).await,
            Err(e) => {
                warn!(
                    source = %unit.source.name,
                    keyword = unit.keyword,
                    location = unit.location,
                    "Harvest failed: {:#}",
                    e
                );
                UnitOutcome::Failed {
                    error: format!("{:#}", e),
                }
            }
        };

        UnitReport {
            keyword: unit.keyword.to_string(),
            location: unit.location.to_string(),
            outcome,
        }
    }

    async fn persist_batch(
        &self,
        source: &SourceDescriptor,
        records: Vec<NormalizedJobRecord>,
    ) -> UnitOutcome {
        let fetched = records.len();
        let (mut created, mut duplicates, mut failed) = (0, 0, 0);

        for record in records {
            match self.persist_record(record).await {
                Ok(RecordOutcome::Created) => created += 1,
                Ok(RecordOutcome::Duplicate) => duplicates += 1,
                Err(e) => {
                    failed += 1;
                    error!(source = %source.name, "Error saving job: {:#}", e);
                }
            }
        }

        UnitOutcome::Harvested {
            fetched,
            created,
            duplicates,
            failed,
        }
    }

    async fn persist_record(&self, record: NormalizedJobRecord) -> Result<RecordOutcome> {
        let company = match self.store.find_company_by_name(&record.company).await? {
            Some(company) => company,
            None => {
                let company = self
                    .store
                    .create_company(&NewCompany::placeholder(&record.company, &record.location))
                    .await?;
                debug!(company = %company.name, "Created company");
                company
            }
        };

        let title = record.title.clone();
        let job = NewJob {
            record,
            company_id: company.id,
            is_scraped: true,
            last_scraped: Some(Utc::now()),
        };

        match self.store.insert_job(&job).await? {
            InsertOutcome::Created(_) => {
                info!(title = %title, company = %company.name, "Saved job");
                Ok(RecordOutcome::Created)
            }
            InsertOutcome::Duplicate => {
                debug!(title = %title, company = %company.name, "Job already exists");
                Ok(RecordOutcome::Duplicate)
            }
        }
    }
}
