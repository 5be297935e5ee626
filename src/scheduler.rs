// src/scheduler.rs
//! Periodic trigger around the ingestion pipeline with a single-flight guard.

use crate::pipeline::{IngestionPipeline, PipelineError, RunSummary};
use anyhow::{Context, Result};
use chrono::{FixedOffset, Utc};
use cron::Schedule;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulePreset {
    /// Every day at 02:00
    #[default]
    Daily,
    EverySixHours,
    Hourly,
    EveryThirtyMinutes,
}

impl SchedulePreset {
    pub fn cron_expression(&self) -> &'static str {
        match self {
            SchedulePreset::Daily => "0 2 * * *",
            SchedulePreset::EverySixHours => "0 */6 * * *",
            SchedulePreset::Hourly => "0 * * * *",
            SchedulePreset::EveryThirtyMinutes => "*/30 * * * *",
        }
    }

    pub fn schedule(&self) -> Result<Schedule> {
        parse_cron(self.cron_expression())
            .with_context(|| format!("Invalid cron expression for {:?}", self))
    }
}

/// Parse a cron expression, prepending a seconds field to 5-field expressions
fn parse_cron(expr: &str) -> Result<Schedule, cron::error::Error> {
    if expr.split_whitespace().count() == 5 {
        Schedule::from_str(&format!("0 {}", expr))
    } else {
        Schedule::from_str(expr)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub total_jobs: usize,
    pub running: bool,
    pub is_scraping: bool,
    pub last_run: Option<RunSummary>,
}

/// Clears the running flag when dropped, whether the run finished, failed or was cancelled
struct RunGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

pub struct ScrapingScheduler {
    pipeline: Arc<IngestionPipeline>,
    is_running: Arc<AtomicBool>,
    last_run: RwLock<Option<RunSummary>>,
    jobs: Mutex<Vec<JoinHandle<()>>>,
}

impl ScrapingScheduler {
    pub fn new(pipeline: Arc<IngestionPipeline>) -> Self {
        Self {
            pipeline,
            is_running: Arc::new(AtomicBool::new(false)),
            last_run: RwLock::new(None),
            jobs: Mutex::new(Vec::new()),
        }
    }

    pub fn pipeline(&self) -> &Arc<IngestionPipeline> {
        &self.pipeline
    }

    pub fn is_scraping(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    fn claim(&self) -> Result<RunGuard, PipelineError> {
        if self
            .is_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Scraping already in progress, skipping trigger");
            return Err(PipelineError::AlreadyRunning);
        }

        Ok(RunGuard {
            flag: Arc::clone(&self.is_running),
        })
    }

    async fn run_claimed(&self, guard: RunGuard) -> Result<RunSummary, PipelineError> {
        let started_at = Utc::now();
        let result = self.pipeline.start_scraping().await;

        let summary = match &result {
            Ok(summary) => summary.clone(),
            Err(e) => {
                error!("Scraping run aborted: {}", e);
                RunSummary::aborted(Uuid::new_v4(), started_at, e.to_string())
            }
        };
        *self.last_run.write().await = Some(summary);

        drop(guard);
        result
    }

    /// Run the pipeline now. Returns `AlreadyRunning` without touching the
    /// pipeline if another run holds the flag.
    pub async fn trigger(&self) -> Result<RunSummary, PipelineError> {
        let guard = self.claim()?;
        self.run_claimed(guard).await
    }

    /// Claim the flag now and run the pipeline in the background
    pub fn spawn_run(
        self: &Arc<Self>,
    ) -> Result<JoinHandle<Result<RunSummary, PipelineError>>, PipelineError> {
        let guard = self.claim()?;
        let scheduler = Arc::clone(self);
        Ok(tokio::spawn(
            async move { scheduler.run_claimed(guard).await },
        ))
    }

    /// Install a periodic trigger. Fire times are computed in the fixed UTC
    /// offset given in hours, without daylight saving shifts.
    pub async fn start(self: &Arc<Self>, preset: SchedulePreset, offset_hours: i32) -> Result<()> {
        let schedule = preset.schedule()?;
        let offset = FixedOffset::east_opt(offset_hours * 3600)
            .with_context(|| format!("Invalid timezone offset: {} hours", offset_hours))?;

        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            loop {
                let Some(next) = schedule.upcoming(offset).next() else {
                    warn!(?preset, "Schedule has no upcoming fire time");
                    break;
                };

                let wait = (next.with_timezone(&Utc) - Utc::now())
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                info!(?preset, next_run = %next, "Next scheduled scraping run");
                tokio::time::sleep(wait).await;

                info!(?preset, "Running scheduled job scraping");
                // a busy trigger is dropped, not queued
                let _ = scheduler.spawn_run();
            }
        });

        self.jobs.lock().await.push(handle);
        info!(?preset, cron = preset.cron_expression(), offset_hours, "Scraping schedule started");
        Ok(())
    }

    /// Stop future triggers. A run already in flight completes on its own.
    pub async fn stop_all_jobs(&self) {
        let mut jobs = self.jobs.lock().await;
        for job in jobs.drain(..) {
            job.abort();
        }
        info!("All scheduled scraping jobs stopped");
    }

    pub async fn last_run(&self) -> Option<RunSummary> {
        self.last_run.read().await.clone()
    }

    pub async fn status(&self) -> SchedulerStatus {
        let total_jobs = self.jobs.lock().await.len();
        SchedulerStatus {
            total_jobs,
            running: total_jobs > 0,
            is_scraping: self.is_scraping(),
            last_run: self.last_run().await,
        }
    }
}
