// src/web/handlers/scraping_handlers.rs
use crate::core::config_manager::ScrapingConfig;
use crate::core::database::{JobFilter, JobListing, JobStore};
use crate::pipeline::PipelineError;
use crate::state::AppState;
use crate::web::types::*;

use rocket::http::Status;
use rocket::response::status::Accepted;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

const RECENT_JOBS: i64 = 10;

fn internal(context: &str, e: anyhow::Error) -> ApiError {
    error!("{}: {:#}", context, e);
    api_error(Status::InternalServerError, context, "INTERNAL_ERROR")
}

pub async fn start_scraping_handler(
    state: &State<AppState>,
) -> Result<Accepted<Json<ApiResponse<()>>>, ApiError> {
    match state.scheduler.spawn_run() {
        Ok(_) => {
            info!("Job scraping started via API");
            Ok(Accepted(Json(ApiResponse::message(
                "Job scraping started in background",
            ))))
        }
        // a busy trigger is discarded but still acknowledged
        Err(PipelineError::AlreadyRunning) => Ok(Accepted(Json(ApiResponse::message(
            "Scraping already in progress",
        )))),
        Err(e) => Err(api_error(
            Status::InternalServerError,
            e.to_string(),
            "INTERNAL_ERROR",
        )),
    }
}

pub async fn stats_handler(state: &State<AppState>) -> ApiResult<ScrapingStats> {
    let repository = &state.repository;

    let total_jobs = repository
        .count_jobs(&JobFilter::default())
        .await
        .map_err(|e| internal("Failed to count jobs", e))?;
    let scraped_jobs = repository
        .count_jobs(&JobFilter::scraped())
        .await
        .map_err(|e| internal("Failed to count scraped jobs", e))?;
    let jobs_by_source = repository
        .jobs_by_source()
        .await
        .map_err(|e| internal("Failed to group jobs by source", e))?;
    let recent_jobs = repository
        .list_scraped_jobs(None, RECENT_JOBS, 0)
        .await
        .map_err(|e| internal("Failed to load recent jobs", e))?;

    Ok(Json(ApiResponse::success(
        "Scraping statistics",
        ScrapingStats {
            total_jobs,
            scraped_jobs,
            jobs_by_source,
            recent_jobs,
        },
    )))
}

pub async fn jobs_by_source_handler(
    source: &str,
    page: Option<u32>,
    limit: Option<u32>,
    state: &State<AppState>,
) -> ApiResult<Vec<JobListing>> {
    let filter = JobFilter {
        scraped_only: true,
        source: Some(source.to_string()),
    };
    let total = state
        .repository
        .count_jobs(&filter)
        .await
        .map_err(|e| internal("Failed to count jobs", e))?;

    let pagination = Pagination::new(page, limit, total);
    let jobs = state
        .repository
        .list_scraped_jobs(Some(source), i64::from(pagination.limit), pagination.offset())
        .await
        .map_err(|e| internal("Failed to load jobs", e))?;

    Ok(Json(
        ApiResponse::success(format!("Scraped jobs from {}", source), jobs)
            .with_pagination(pagination),
    ))
}

pub async fn get_config_handler(state: &State<AppState>) -> Json<ApiResponse<ScrapingConfig>> {
    Json(ApiResponse::success(
        "Scraping configuration",
        state.pipeline().config().await,
    ))
}

pub async fn update_config_handler(
    config: Json<ScrapingConfig>,
    state: &State<AppState>,
) -> ApiResult<ScrapingConfig> {
    let config = config.into_inner();

    if config.keywords.is_empty() || config.locations.is_empty() {
        return Err(api_error(
            Status::UnprocessableEntity,
            "At least one keyword and one location are required",
            "INVALID_CONFIG",
        ));
    }

    state.pipeline().replace_config(config.clone()).await;
    Ok(Json(ApiResponse::success(
        "Scraping configuration updated; applies from the next run",
        config,
    )))
}

pub async fn delete_jobs_handler(
    source: Option<String>,
    state: &State<AppState>,
) -> ApiResult<DeleteResult> {
    let deleted = state
        .repository
        .delete_scraped_jobs(source.as_deref())
        .await
        .map_err(|e| internal("Failed to delete scraped jobs", e))?;

    let message = match &source {
        Some(source) => format!("Deleted {} scraped jobs from {}", deleted, source),
        None => format!("Deleted {} scraped jobs", deleted),
    };

    Ok(Json(ApiResponse::success(
        message,
        DeleteResult { deleted, source },
    )))
}

pub async fn compliance_handler(state: &State<AppState>) -> Json<ApiResponse<ComplianceOverview>> {
    let registry = state.pipeline().registry();

    Json(ApiResponse::success(
        "Compliance report",
        ComplianceOverview {
            report: registry.compliance_report(),
            sources: registry.records().cloned().collect(),
        },
    ))
}
