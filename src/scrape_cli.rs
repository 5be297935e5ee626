// src/scrape_cli.rs
use crate::core::config_manager::ConfigManager;
use crate::core::database::{JobFilter, JobListing, JobStore};
use crate::state::AppState;
use crate::utils::{ensure_parent_directory, join_list, truncate_chars};
use crate::web::start_web_server;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

const EXPORT_DESCRIPTION_CHARS: usize = 500;

#[derive(Parser)]
#[command(name = "happycareer-scraper")]
#[command(about = "Compliance-gated job scraping pipeline")]
pub struct ScrapeCli {
    #[command(subcommand)]
    pub command: ScrapeCommand,

    /// Override the configured SQLite database file
    #[arg(long, global = true, env = "SCRAPER_DATABASE_PATH")]
    pub database_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ScrapeCommand {
    /// Start the HTTP control surface and the scraping schedule
    Serve,
    /// Run one scraping pass now and print its summary
    Run,
    /// Print the compliance report
    Compliance {
        /// Also fetch each source's robots.txt (advisory only)
        #[arg(long)]
        check_robots: bool,
    },
    /// Print job counts
    Stats,
    /// Delete scraped jobs
    Clear {
        #[arg(long)]
        source: Option<String>,
    },
    /// Export scraped jobs to CSV
    Export {
        #[arg(long, short)]
        output: PathBuf,
        #[arg(long)]
        source: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    title: &'a str,
    company: &'a str,
    location: &'a str,
    source: &'a str,
    job_type: &'a str,
    experience: &'a str,
    is_remote: bool,
    salary_min: Option<i64>,
    salary_max: Option<i64>,
    salary_currency: Option<&'a str>,
    requirements: String,
    responsibilities: String,
    benefits: String,
    description: String,
    external_url: &'a str,
    posted_at: String,
}

impl<'a> From<&'a JobListing> for ExportRow<'a> {
    fn from(listing: &'a JobListing) -> Self {
        let job = &listing.job;
        Self {
            title: &job.title,
            company: &listing.company_name,
            location: &job.location,
            source: job.source.as_deref().unwrap_or_default(),
            job_type: &job.job_type,
            experience: &job.experience,
            is_remote: job.is_remote,
            salary_min: job.salary_min,
            salary_max: job.salary_max,
            salary_currency: job.salary_currency.as_deref(),
            requirements: join_list(&job.requirements.0),
            responsibilities: join_list(&job.responsibilities.0),
            benefits: join_list(&job.benefits.0),
            description: truncate_chars(&job.description, EXPORT_DESCRIPTION_CHARS),
            external_url: job.external_url.as_deref().unwrap_or_default(),
            posted_at: job.posted_at.to_rfc3339(),
        }
    }
}

fn database_url(cli_path: Option<&Path>, config: &ConfigManager) -> String {
    match cli_path {
        Some(path) => format!("sqlite:{}?mode=rwc", path.display()),
        None => config.environment.database_url(),
    }
}

pub async fn handle_scrape_command(cli: ScrapeCli, config: ConfigManager) -> Result<()> {
    if let Some(path) = &cli.database_path {
        ensure_parent_directory(path).await?;
    }

    let state =
        AppState::from_config(&config, &database_url(cli.database_path.as_deref(), &config))
            .await?;

    match cli.command {
        ScrapeCommand::Serve => start_web_server(&config, state).await?,

        ScrapeCommand::Run => match state.scheduler.trigger().await {
            Ok(summary) => {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            Err(e) => {
                error!("Scraping run failed: {}", e);
                anyhow::bail!(e);
            }
        },

        ScrapeCommand::Compliance { check_robots } => {
            let registry = state.pipeline().registry();
            println!(
                "{}",
                serde_json::to_string_pretty(&registry.compliance_report())?
            );

            if check_robots {
                let client = reqwest::Client::builder()
                    .user_agent(config.scraping.harvest.user_agent.clone())
                    .timeout(Duration::from_secs(config.scraping.harvest.request_timeout_secs))
                    .build()
                    .context("Failed to create HTTP client")?;

                for record in registry.records() {
                    let permitted = registry.check_robots_txt(&client, &record.source).await;
                    println!(
                        "{:<15} policy: {:<10} robots.txt: {}",
                        record.source,
                        if record.allows_scraping { "allowed" } else { "disallowed" },
                        if permitted { "permits" } else { "blocks or unreachable" }
                    );
                }
            }
        }

        ScrapeCommand::Stats => {
            let total = state.repository.count_jobs(&JobFilter::default()).await?;
            let scraped = state.repository.count_jobs(&JobFilter::scraped()).await?;
            println!("Total jobs:   {}", total);
            println!("Scraped jobs: {}", scraped);
            for count in state.repository.jobs_by_source().await? {
                println!("  {:<15} {}", count.source, count.count);
            }
        }

        ScrapeCommand::Clear { source } => {
            let deleted = state
                .repository
                .delete_scraped_jobs(source.as_deref())
                .await?;
            println!("Deleted {} scraped jobs", deleted);
        }

        ScrapeCommand::Export { output, source } => {
            let exported = export_csv(&state, &output, source.as_deref()).await?;
            info!(output = %output.display(), exported, "Export complete");
            println!("Exported {} jobs to {}", exported, output.display());
        }
    }

    Ok(())
}

async fn export_csv(state: &AppState, output: &Path, source: Option<&str>) -> Result<usize> {
    let jobs = state.repository.list_scraped_jobs(source, -1, 0).await?;

    ensure_parent_directory(output).await?;
    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    for listing in &jobs {
        writer.serialize(ExportRow::from(listing))?;
    }
    writer.flush()?;

    Ok(jobs.len())
}
