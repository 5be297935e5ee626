// src/lib.rs
pub mod compliance;
pub mod core;
pub mod environment;
pub mod harvester;
pub mod pipeline;
pub mod scheduler;
pub mod scrape_cli;
pub mod state;
pub mod utils;
pub mod web;

pub use compliance::ComplianceRegistry;
pub use pipeline::{IngestionPipeline, PipelineError, RunSummary};
pub use scheduler::{SchedulePreset, ScrapingScheduler};
pub use state::AppState;
pub use web::start_web_server;
