// src/web/handlers/system_handlers.rs
use crate::scheduler::SchedulerStatus;
use crate::state::AppState;
use crate::web::types::*;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

pub async fn status_handler(state: &State<AppState>) -> Json<ApiResponse<SchedulerStatus>> {
    Json(ApiResponse::success(
        "Scheduler status",
        state.scheduler.status().await,
    ))
}

pub async fn health_handler(state: &State<AppState>) -> ApiResult<HealthStatus> {
    if let Err(e) = state.database.health_check().await {
        error!("Health check failed: {:#}", e);
        return Err(api_error(
            Status::ServiceUnavailable,
            "Database unavailable",
            "UNHEALTHY",
        ));
    }

    info!("Health check");
    Ok(Json(ApiResponse::success(
        "Service healthy",
        HealthStatus {
            status: "healthy",
            database: "ok",
            is_scraping: state.scheduler.is_scraping(),
        },
    )))
}
