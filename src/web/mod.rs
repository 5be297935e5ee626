// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use handlers::*;
pub use types::*;

use crate::core::config_manager::ScrapingConfig;
use crate::core::database::JobListing;
use crate::core::ConfigManager;
use crate::scheduler::SchedulerStatus;
use crate::state::AppState;
use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::response::status::Accepted;
use rocket::serde::json::Json;
use rocket::{catchers, delete, get, options, post, put, routes, Build, Request, Response, Rocket, State};
use tracing::{error, info};

pub const API_BASE: &str = "/api/scraping";

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PUT, DELETE, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
    }
}

#[post("/start")]
pub async fn start_scraping(
    state: &State<AppState>,
) -> Result<Accepted<Json<ApiResponse<()>>>, ApiError> {
    handlers::start_scraping_handler(state).await
}

#[get("/stats")]
pub async fn get_stats(state: &State<AppState>) -> ApiResult<ScrapingStats> {
    handlers::stats_handler(state).await
}

#[get("/jobs/<source>?<page>&<limit>")]
pub async fn get_jobs_by_source(
    source: &str,
    page: Option<u32>,
    limit: Option<u32>,
    state: &State<AppState>,
) -> ApiResult<Vec<JobListing>> {
    handlers::jobs_by_source_handler(source, page, limit, state).await
}

#[get("/config")]
pub async fn get_config(state: &State<AppState>) -> Json<ApiResponse<ScrapingConfig>> {
    handlers::get_config_handler(state).await
}

#[put("/config", format = "json", data = "<config>")]
pub async fn update_config(
    config: Json<ScrapingConfig>,
    state: &State<AppState>,
) -> ApiResult<ScrapingConfig> {
    handlers::update_config_handler(config, state).await
}

#[delete("/jobs?<source>")]
pub async fn delete_jobs(source: Option<String>, state: &State<AppState>) -> ApiResult<DeleteResult> {
    handlers::delete_jobs_handler(source, state).await
}

#[get("/compliance")]
pub async fn get_compliance(state: &State<AppState>) -> Json<ApiResponse<ComplianceOverview>> {
    handlers::compliance_handler(state).await
}

#[get("/status")]
pub async fn get_status(state: &State<AppState>) -> Json<ApiResponse<SchedulerStatus>> {
    handlers::status_handler(state).await
}

#[get("/health")]
pub async fn health(state: &State<AppState>) -> ApiResult<HealthStatus> {
    handlers::health_handler(state).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format",
        "BAD_REQUEST",
        vec![
            "Check your request JSON format".to_string(),
            "Verify query parameters are well-formed".to_string(),
        ],
    ))
}

#[rocket::catch(404)]
pub fn not_found(request: &Request) -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        format!("No route for {} {}", request.method(), request.uri()),
        "NOT_FOUND",
        Vec::new(),
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error",
        "INTERNAL_ERROR",
        vec!["Try again in a few moments".to_string()],
    ))
}

/// Assemble the Rocket instance without launching it
pub fn build_rocket(state: AppState) -> Rocket<Build> {
    rocket::build()
        .attach(Cors)
        .manage(state)
        .register("/", catchers![bad_request, not_found, internal_error])
        .mount(
            API_BASE,
            routes![
                start_scraping,
                get_stats,
                get_jobs_by_source,
                get_config,
                update_config,
                delete_jobs,
                get_compliance,
                get_status,
                health,
                options,
            ],
        )
}

// Main server start function
pub async fn start_web_server(config: &ConfigManager, state: AppState) -> Result<()> {
    let scheduler = state.scheduler.clone();

    if config.scraping.enabled {
        scheduler
            .start(config.scraping.schedule, config.scraping.timezone_offset_hours)
            .await?;
    } else {
        info!("Scheduled scraping disabled by configuration");
    }

    info!("Starting job scraping API server on port {}", config.port);
    info!("Database: {}", config.environment.database_path.display());

    let figment = rocket::Config::figment().merge(("port", config.port));
    let launched = build_rocket(state).configure(figment).launch().await;

    scheduler.stop_all_jobs().await;

    if let Err(e) = launched {
        error!("Web server failed: {}", e);
        anyhow::bail!("Web server failed: {}", e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::{ComplianceRecord, ComplianceRegistry};
    use crate::core::database::{Database, JobStore, NewCompany, NewJob};
    use crate::harvester::{
        EmploymentType, ExperienceLevel, Harvester, NormalizedJobRecord, SourceDescriptor,
    };
    use crate::pipeline::{IngestionPipeline, ManualClock};
    use crate::scheduler::ScrapingScheduler;
    use async_trait::async_trait;
    use chrono::Utc;
    use rocket::http::ContentType;
    use rocket::local::asynchronous::Client;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    struct EmptyHarvester;

    #[async_trait]
    impl Harvester for EmptyHarvester {
        async fn harvest(
            &self,
            _source: &SourceDescriptor,
            _keyword: &str,
            _location: &str,
        ) -> anyhow::Result<Vec<NormalizedJobRecord>> {
            Ok(Vec::new())
        }
    }

    /// Holds the first harvest call until released
    struct GatedHarvester {
        calls: AtomicUsize,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl Harvester for GatedHarvester {
        async fn harvest(
            &self,
            _source: &SourceDescriptor,
            _keyword: &str,
            _location: &str,
        ) -> anyhow::Result<Vec<NormalizedJobRecord>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.entered.notify_one();
                self.release.notified().await;
            }
            Ok(Vec::new())
        }
    }

    async fn client() -> Client {
        client_with(Arc::new(EmptyHarvester)).await
    }

    async fn client_with(harvester: Arc<dyn Harvester>) -> Client {
        let database = Database::in_memory().await.unwrap();
        let registry = ComplianceRegistry::new([ComplianceRecord {
            source: "GitHub".to_string(),
            allows_scraping: true,
            rate_limit: 60,
            requires_auth: false,
            requires_headers: false,
            robots_txt: String::new(),
            terms_url: String::new(),
            last_checked: Utc::now(),
        }]);
        let pipeline = IngestionPipeline::new(
            ScrapingConfig::default(),
            Arc::new(registry),
            harvester,
            Arc::new(database.repository()),
            Arc::new(ManualClock::new()),
        );
        let state = AppState::new(
            database,
            Arc::new(ScrapingScheduler::new(Arc::new(pipeline))),
        );
        Client::untracked(build_rocket(state)).await.unwrap()
    }

    async fn seed(client: &Client, title: &str, source: &str) {
        let repository = client.rocket().state::<AppState>().unwrap().repository.clone();
        let company = repository
            .create_company(&NewCompany::placeholder("Acme", "Remote"))
            .await
            .unwrap();
        repository
            .insert_job(&NewJob {
                record: NormalizedJobRecord {
                    title: title.to_string(),
                    company: company.name.clone(),
                    location: "Remote".to_string(),
                    description: String::new(),
                    requirements: Vec::new(),
                    responsibilities: Vec::new(),
                    benefits: Vec::new(),
                    salary: None,
                    employment_type: EmploymentType::FullTime,
                    experience: ExperienceLevel::Mid,
                    is_remote: true,
                    url: String::new(),
                    source: source.to_string(),
                    posted_at: Utc::now(),
                },
                company_id: company.id,
                is_scraped: true,
                last_scraped: Some(Utc::now()),
            })
            .await
            .unwrap();
    }

    async fn json(response: rocket::local::asynchronous::LocalResponse<'_>) -> Value {
        serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
    }

    #[rocket::async_test]
    async fn test_stats_and_paginated_jobs() {
        let client = client().await;
        seed(&client, "Rust Engineer", "GitHub").await;
        seed(&client, "Go Engineer", "GitHub").await;
        seed(&client, "Data Analyst", "StackOverflow").await;

        let response = client.get("/api/scraping/stats").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body = json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["totalJobs"], 3);
        assert_eq!(body["data"]["jobsBySource"][0]["source"], "GitHub");
        assert_eq!(body["data"]["recentJobs"].as_array().unwrap().len(), 3);

        let response = client
            .get("/api/scraping/jobs/GitHub?page=2&limit=1")
            .dispatch()
            .await;
        let body = json(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["pagination"]["total"], 2);
        assert_eq!(body["pagination"]["pages"], 2);
        assert_eq!(body["data"][0]["company_name"], "Acme");
    }

    #[rocket::async_test]
    async fn test_delete_jobs_by_source() {
        let client = client().await;
        seed(&client, "Rust Engineer", "GitHub").await;
        seed(&client, "Data Analyst", "StackOverflow").await;

        let response = client
            .delete("/api/scraping/jobs?source=GitHub")
            .dispatch()
            .await;
        let body = json(response).await;
        assert_eq!(body["data"]["deleted"], 1);

        let body = json(client.get("/api/scraping/stats").dispatch().await).await;
        assert_eq!(body["data"]["scrapedJobs"], 1);
    }

    #[rocket::async_test]
    async fn test_put_config_replaces_in_memory_config() {
        let client = client().await;

        let response = client
            .put("/api/scraping/config")
            .header(ContentType::JSON)
            .body(r#"{"keywords":["rust"],"locations":["Remote"],"schedule":"hourly"}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let body = json(client.get("/api/scraping/config").dispatch().await).await;
        assert_eq!(body["data"]["keywords"][0], "rust");
        assert_eq!(body["data"]["schedule"], "hourly");
        assert_eq!(body["data"]["keywords_per_run"], 3);

        let response = client
            .put("/api/scraping/config")
            .header(ContentType::JSON)
            .body(r#"{"keywords":[]}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);
    }

    #[rocket::async_test]
    async fn test_start_accepts_and_records_run() {
        let client = client().await;

        let response = client.post("/api/scraping/start").dispatch().await;
        assert_eq!(response.status(), Status::Accepted);
        assert_eq!(json(response).await["success"], true);

        let state = client.rocket().state::<AppState>().unwrap();
        while state.scheduler.is_scraping() {
            tokio::task::yield_now().await;
        }

        let body = json(client.get("/api/scraping/status").dispatch().await).await;
        assert_eq!(body["data"]["is_scraping"], false);
        assert_eq!(body["data"]["last_run"]["outcome"]["status"], "completed");
    }

    #[rocket::async_test]
    async fn test_start_while_running_is_accepted_and_discarded() {
        let harvester = Arc::new(GatedHarvester {
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            release: Notify::new(),
        });
        let client = client_with(harvester.clone()).await;
        let state = client.rocket().state::<AppState>().unwrap();

        let first = state.scheduler.spawn_run().unwrap();
        harvester.entered.notified().await;
        assert!(state.scheduler.is_scraping());

        let response = client.post("/api/scraping/start").dispatch().await;
        assert_eq!(response.status(), Status::Accepted);
        let body = json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Scraping already in progress");
        assert_eq!(harvester.calls.load(Ordering::SeqCst), 1);

        harvester.release.notify_one();
        first.await.unwrap().unwrap();
        assert!(!state.scheduler.is_scraping());
    }

    #[rocket::async_test]
    async fn test_compliance_health_and_unknown_route() {
        let client = client().await;

        let body = json(client.get("/api/scraping/compliance").dispatch().await).await;
        assert_eq!(body["data"]["compliant_sources"][0], "GitHub");

        let response = client.get("/api/scraping/health").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let response = client.get("/api/scraping/nope").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
        assert_eq!(json(response).await["error_code"], "NOT_FOUND");
    }
}
