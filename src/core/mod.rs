// src/core/mod.rs
//! Core services: configuration and persistence

pub mod config_manager;
pub mod database;

pub use config_manager::{ConfigManager, HarvestSettings, ScrapingConfig};
pub use database::{Database, JobRepository, JobStore};
