// src/harvester/mod.rs
use anyhow::Result;
use async_trait::async_trait;

pub mod client;
pub mod extract;
pub mod types;

pub use client::HttpHarvester;
pub use types::{
    EmploymentType, ExperienceLevel, NormalizedJobRecord, SalaryRange, SourceDescriptor,
    SourceKind,
};

/// Contacts one source for one (keyword, location) search and returns the
/// normalized postings. Implementations perform no writes.
#[async_trait]
pub trait Harvester: Send + Sync {
    async fn harvest(
        &self,
        source: &SourceDescriptor,
        keyword: &str,
        location: &str,
    ) -> Result<Vec<NormalizedJobRecord>>;
}
