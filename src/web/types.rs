// src/web/types.rs
use crate::compliance::{ComplianceRecord, ComplianceReport};
use crate::core::database::{JobListing, SourceCount};
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::serde::Serialize;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

/// Envelope for every successful response
#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            pagination: None,
        }
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            pagination: None,
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    pub success: bool,
    pub message: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl StandardErrorResponse {
    pub fn new(message: impl Into<String>, error_code: &str, suggestions: Vec<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error_code: error_code.to_string(),
            suggestions,
        }
    }
}

pub type ApiError = Custom<Json<StandardErrorResponse>>;
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn api_error(status: Status, message: impl Into<String>, error_code: &str) -> ApiError {
    Custom(
        status,
        Json(StandardErrorResponse::new(message, error_code, Vec::new())),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    /// Normalize raw query values: pages start at 1, limit within 1..=MAX_LIMIT
    pub fn new(page: Option<u32>, limit: Option<u32>, total: i64) -> Self {
        let page = page.unwrap_or(DEFAULT_PAGE).max(1);
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let pages = (total + i64::from(limit) - 1) / i64::from(limit);

        Self {
            page,
            limit,
            total,
            pages,
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct ScrapingStats {
    pub total_jobs: i64,
    pub scraped_jobs: i64,
    pub jobs_by_source: Vec<SourceCount>,
    pub recent_jobs: Vec<JobListing>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ComplianceOverview {
    #[serde(flatten)]
    pub report: ComplianceReport,
    pub sources: Vec<ComplianceRecord>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DeleteResult {
    pub deleted: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
    pub is_scraping: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_and_clamping() {
        let pagination = Pagination::new(None, None, 45);
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, 20);
        assert_eq!(pagination.pages, 3);
        assert_eq!(pagination.offset(), 0);

        let clamped = Pagination::new(Some(0), Some(1000), 0);
        assert_eq!(clamped.page, 1);
        assert_eq!(clamped.limit, MAX_LIMIT);
        assert_eq!(clamped.pages, 0);

        assert_eq!(Pagination::new(Some(3), Some(10), 45).offset(), 20);
    }
}
