// src/harvester/client.rs
use super::extract;
use super::types::{
    GitHubPosting, NormalizedJobRecord, SourceDescriptor, SourceKind, StackOverflowResponse,
};
use super::Harvester;
use crate::core::config_manager::HarvestSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Harvester that talks to each source's public JSON API
pub struct HttpHarvester {
    client: Client,
    max_results: usize,
}

impl HttpHarvester {
    pub fn new(settings: &HarvestSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            max_results: settings.max_results_per_request,
        })
    }

    fn search_url(source: &SourceDescriptor, keyword: &str, location: &str) -> Result<String> {
        let params: Vec<(&str, &str)> = match source.kind {
            SourceKind::GitHub => vec![("search", keyword), ("location", location)],
            SourceKind::StackOverflow => vec![
                ("tagged", keyword),
                ("location", location),
                ("site", "stackoverflow"),
            ],
        };

        let url = reqwest::Url::parse_with_params(&source.base_url, &params)
            .with_context(|| format!("Invalid base URL for {}: {}", source.name, source.base_url))?;
        Ok(url.to_string())
    }

    async fn fetch_json(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to GET {}", url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            anyhow::bail!("HTTP {} from {}", status, url);
        }

        Ok(body)
    }
}

#[async_trait]
impl Harvester for HttpHarvester {
    async fn harvest(
        &self,
        source: &SourceDescriptor,
        keyword: &str,
        location: &str,
    ) -> Result<Vec<NormalizedJobRecord>> {
        if !source.api_based {
            warn!(
                source = %source.name,
                "Source is not API-based; HTML scraping is not supported, returning no postings"
            );
            return Ok(Vec::new());
        }

        let url = Self::search_url(source, keyword, location)?;
        info!(source = %source.name, keyword, location, "Fetching postings: {}", url);

        let body = self.fetch_json(&url).await?;
        let records = parse_postings(source, &body, self.max_results)?;

        debug!(source = %source.name, count = records.len(), "Parsed postings");
        Ok(records)
    }
}

/// Decode a source response body into normalized records, keeping at most `max_results`.
pub fn parse_postings(
    source: &SourceDescriptor,
    body: &str,
    max_results: usize,
) -> Result<Vec<NormalizedJobRecord>> {
    let records = match source.kind {
        SourceKind::GitHub => {
            let postings: Vec<GitHubPosting> = serde_json::from_str(body)
                .with_context(|| format!("Failed to parse {} response", source.name))?;

            postings
                .into_iter()
                .take(max_results)
                .map(|posting| {
                    let posted_at = posting.posted_at();
                    normalize(
                        source,
                        posting.title,
                        posting.company,
                        posting.location,
                        posting.description,
                        posting.url,
                        posted_at,
                    )
                })
                .collect()
        }
        SourceKind::StackOverflow => {
            let response: StackOverflowResponse = serde_json::from_str(body)
                .with_context(|| format!("Failed to parse {} response", source.name))?;

            response
                .items
                .into_iter()
                .take(max_results)
                .map(|posting| {
                    let posted_at = posting.posted_at();
                    normalize(
                        source,
                        posting.title,
                        posting.company_name,
                        posting.location,
                        posting.description,
                        posting.link,
                        posted_at,
                    )
                })
                .collect()
        }
    };

    Ok(records)
}

fn normalize(
    source: &SourceDescriptor,
    title: String,
    company: String,
    location: String,
    description: String,
    url: String,
    posted_at: DateTime<Utc>,
) -> NormalizedJobRecord {
    let text = extract::description_to_text(&description);

    NormalizedJobRecord {
        requirements: extract::extract_requirements(&text),
        responsibilities: extract::extract_responsibilities(&text),
        benefits: extract::extract_benefits(&text),
        salary: extract::extract_salary(&text),
        employment_type: extract::determine_employment_type(&title, &text),
        experience: extract::determine_experience_level(&title, &text),
        is_remote: extract::is_remote_job(&title, &text, &location),
        title: title.trim().to_string(),
        company: company.trim().to_string(),
        location: location.trim().to_string(),
        description: text,
        url,
        source: source.name.clone(),
        posted_at,
    }
}
