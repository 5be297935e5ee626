// src/core/database.rs
//! SQLite persistence for companies and jobs, plus the store contract the
//! ingestion pipeline writes through.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::info;

use crate::harvester::NormalizedJobRecord;

// ===== Core Database Connection Management =====

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect and run migrations
    pub async fn connect(database_url: &str) -> Result<Self> {
        Self::connect_with(database_url, 5).await
    }

    /// Private in-memory database; a single connection keeps every query on the same schema
    pub async fn in_memory() -> Result<Self> {
        Self::connect_with("sqlite::memory:", 1).await
    }

    async fn connect_with(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;

        info!("Database connection established: {}", database_url);

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn repository(&self) -> JobRepository {
        JobRepository::new(self.pool.clone())
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS companies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL,
                industry TEXT NOT NULL,
                size TEXT NOT NULL,
                company_type TEXT NOT NULL,
                location TEXT NOT NULL,
                is_verified BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                requirements TEXT NOT NULL DEFAULT '[]',
                responsibilities TEXT NOT NULL DEFAULT '[]',
                benefits TEXT NOT NULL DEFAULT '[]',
                salary_min INTEGER,
                salary_max INTEGER,
                salary_currency TEXT,
                job_type TEXT NOT NULL,
                experience TEXT NOT NULL,
                is_remote BOOLEAN NOT NULL DEFAULT FALSE,
                location TEXT NOT NULL,
                company_id INTEGER NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
                source TEXT,
                external_url TEXT,
                is_scraped BOOLEAN NOT NULL DEFAULT FALSE,
                last_scraped TEXT,
                posted_at TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (title, company_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_source ON jobs(source);")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_is_scraped ON jobs(is_scraped);")
            .execute(&self.pool)
            .await?;

        info!("Database migrations completed");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }
}

// ===== Models =====

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub industry: String,
    pub size: String,
    pub company_type: String,
    pub location: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub requirements: Json<Vec<String>>,
    pub responsibilities: Json<Vec<String>>,
    pub benefits: Json<Vec<String>>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_currency: Option<String>,
    pub job_type: String,
    pub experience: String,
    pub is_remote: bool,
    pub location: String,
    pub company_id: i64,
    pub source: Option<String>,
    pub external_url: Option<String>,
    pub is_scraped: bool,
    pub last_scraped: Option<DateTime<Utc>>,
    pub posted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A job joined with the summary of its company
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct JobListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: Job,
    pub company_name: String,
    pub company_industry: String,
    pub company_size: String,
    pub company_location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SourceCount {
    pub source: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCompany {
    pub name: String,
    pub description: String,
    pub industry: String,
    pub size: String,
    pub company_type: String,
    pub location: String,
}

impl NewCompany {
    /// Placeholder profile for a company first seen in a scraped posting
    pub fn placeholder(name: &str, location: &str) -> Self {
        Self {
            name: name.to_string(),
            description: format!("Company description for {}", name),
            industry: "Technology".to_string(),
            size: "MEDIUM".to_string(),
            company_type: "PRIVATE".to_string(),
            location: location.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub record: NormalizedJobRecord,
    pub company_id: i64,
    pub is_scraped: bool,
    pub last_scraped: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub scraped_only: bool,
    pub source: Option<String>,
}

impl JobFilter {
    pub fn scraped() -> Self {
        Self {
            scraped_only: true,
            source: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Created(Job),
    /// A job with the same (title, company) already exists
    Duplicate,
}

// ===== Store contract =====

/// Persistence operations the ingestion pipeline depends on
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>>;

    async fn create_company(&self, company: &NewCompany) -> Result<Company>;

    /// Insert unless (title, company_id) already exists
    async fn insert_job(&self, job: &NewJob) -> Result<InsertOutcome>;

    async fn count_jobs(&self, filter: &JobFilter) -> Result<i64>;
}

// ===== Job Repository =====

const LISTING_SELECT: &str = r#"
    SELECT j.*, c.name AS company_name, c.industry AS company_industry,
           c.size AS company_size, c.location AS company_location
    FROM jobs j
    JOIN companies c ON c.id = j.company_id
"#;

#[derive(Clone)]
pub struct JobRepository {
    pool: SqlitePool,
}

impl JobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_job(&self, id: i64) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    /// Scraped jobs, newest posting first. A negative `limit` means no limit.
    pub async fn list_scraped_jobs(
        &self,
        source: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<JobListing>> {
        let sql = format!(
            "{} WHERE j.is_scraped = TRUE AND (? IS NULL OR j.source = ?) \
             ORDER BY j.posted_at DESC, j.id DESC LIMIT ? OFFSET ?",
            LISTING_SELECT
        );

        let jobs = sqlx::query_as::<_, JobListing>(&sql)
            .bind(source)
            .bind(source)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(jobs)
    }

    pub async fn jobs_by_source(&self) -> Result<Vec<SourceCount>> {
        let counts = sqlx::query_as::<_, SourceCount>(
            r#"
            SELECT source, COUNT(*) AS count
            FROM jobs
            WHERE is_scraped = TRUE AND source IS NOT NULL
            GROUP BY source
            ORDER BY count DESC, source ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Bulk-delete scraped jobs, optionally for one source only
    pub async fn delete_scraped_jobs(&self, source: Option<&str>) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM jobs WHERE is_scraped = TRUE AND (? IS NULL OR source = ?)")
                .bind(source)
                .bind(source)
                .execute(&self.pool)
                .await?;

        let deleted = result.rows_affected();
        info!(
            source = source.unwrap_or("all"),
            deleted, "Deleted scraped jobs"
        );
        Ok(deleted)
    }
}

#[async_trait]
impl JobStore for JobRepository {
    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    async fn create_company(&self, company: &NewCompany) -> Result<Company> {
        sqlx::query(
            r#"
            INSERT INTO companies (name, description, industry, size, company_type, location, is_verified, created_at)
            VALUES (?, ?, ?, ?, ?, ?, FALSE, ?)
            ON CONFLICT(name) DO NOTHING
            "#,
        )
        .bind(&company.name)
        .bind(&company.description)
        .bind(&company.industry)
        .bind(&company.size)
        .bind(&company.company_type)
        .bind(&company.location)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.find_company_by_name(&company.name)
            .await?
            .with_context(|| format!("Company {} missing after insert", company.name))
    }

    async fn insert_job(&self, job: &NewJob) -> Result<InsertOutcome> {
        let record = &job.record;
        let salary = record.salary.as_ref();

        let result = sqlx::query(
            r#"
            INSERT INTO jobs (
                title, description, requirements, responsibilities, benefits,
                salary_min, salary_max, salary_currency, job_type, experience,
                is_remote, location, company_id, source, external_url,
                is_scraped, last_scraped, posted_at, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(title, company_id) DO NOTHING
            "#,
        )
        .bind(&record.title)
        .bind(&record.description)
        .bind(Json(&record.requirements))
        .bind(Json(&record.responsibilities))
        .bind(Json(&record.benefits))
        .bind(salary.map(|s| s.min))
        .bind(salary.map(|s| s.max))
        .bind(salary.map(|s| s.currency.clone()))
        .bind(record.employment_type.as_str())
        .bind(record.experience.as_str())
        .bind(record.is_remote)
        .bind(&record.location)
        .bind(job.company_id)
        .bind(&record.source)
        .bind(&record.url)
        .bind(job.is_scraped)
        .bind(job.last_scraped)
        .bind(record.posted_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(InsertOutcome::Duplicate);
        }

        let job = self
            .find_job(result.last_insert_rowid())
            .await?
            .context("Job missing after insert")?;
        Ok(InsertOutcome::Created(job))
    }

    async fn count_jobs(&self, filter: &JobFilter) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM jobs WHERE (? = FALSE OR is_scraped = TRUE) AND (? IS NULL OR source = ?)",
        )
        .bind(filter.scraped_only)
        .bind(filter.source.as_deref())
        .bind(filter.source.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvester::{EmploymentType, ExperienceLevel, SalaryRange};

    fn record(title: &str, company: &str, source: &str) -> NormalizedJobRecord {
        NormalizedJobRecord {
            title: title.to_string(),
            company: company.to_string(),
            location: "Remote".to_string(),
            description: "Requirements:\nRust".to_string(),
            requirements: vec!["Rust".to_string()],
            responsibilities: Vec::new(),
            benefits: Vec::new(),
            salary: Some(SalaryRange {
                min: 80_000,
                max: 120_000,
                currency: "USD".to_string(),
            }),
            employment_type: EmploymentType::FullTime,
            experience: ExperienceLevel::Mid,
            is_remote: true,
            url: format!("https://{}.example/{}", source, title),
            source: source.to_string(),
            posted_at: Utc::now(),
        }
    }

    async fn scraped(repo: &JobRepository, title: &str, company: &str, source: &str) -> InsertOutcome {
        let company = repo
            .create_company(&NewCompany::placeholder(company, "Remote"))
            .await
            .unwrap();
        repo.insert_job(&NewJob {
            record: record(title, &company.name, source),
            company_id: company.id,
            is_scraped: true,
            last_scraped: Some(Utc::now()),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_company_is_idempotent_by_name() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.repository();

        let first = repo
            .create_company(&NewCompany::placeholder("Acme", "Austin"))
            .await
            .unwrap();
        let second = repo
            .create_company(&NewCompany::placeholder("Acme", "Boston"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.location, "Austin");
        assert_eq!(second.industry, "Technology");
        assert!(!second.is_verified);
    }

    #[tokio::test]
    async fn test_insert_job_reports_duplicate_title_and_company() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.repository();

        let created = scraped(&repo, "Rust Engineer", "Acme", "GitHub").await;
        let InsertOutcome::Created(job) = created else {
            panic!("first insert should create");
        };
        assert!(job.is_scraped);
        assert_eq!(job.requirements.0, vec!["Rust".to_string()]);
        assert_eq!(job.salary_max, Some(120_000));
        assert_eq!(job.job_type, "FULL_TIME");

        assert!(matches!(
            scraped(&repo, "Rust Engineer", "Acme", "GitHub").await,
            InsertOutcome::Duplicate
        ));
        assert!(matches!(
            scraped(&repo, "Rust Engineer", "Beta", "GitHub").await,
            InsertOutcome::Created(_)
        ));
    }

    #[tokio::test]
    async fn test_counts_listing_and_delete_by_source() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.repository();

        scraped(&repo, "A", "Acme", "GitHub").await;
        scraped(&repo, "B", "Acme", "GitHub").await;
        scraped(&repo, "C", "Beta", "StackOverflow").await;

        assert_eq!(repo.count_jobs(&JobFilter::default()).await.unwrap(), 3);
        let github = JobFilter {
            scraped_only: true,
            source: Some("GitHub".to_string()),
        };
        assert_eq!(repo.count_jobs(&github).await.unwrap(), 2);

        assert_eq!(
            repo.jobs_by_source().await.unwrap(),
            vec![
                SourceCount {
                    source: "GitHub".to_string(),
                    count: 2
                },
                SourceCount {
                    source: "StackOverflow".to_string(),
                    count: 1
                },
            ]
        );

        let page = repo.list_scraped_jobs(Some("GitHub"), 1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].company_name, "Acme");

        assert_eq!(repo.delete_scraped_jobs(Some("GitHub")).await.unwrap(), 2);
        assert_eq!(repo.count_jobs(&JobFilter::scraped()).await.unwrap(), 1);
        assert_eq!(repo.delete_scraped_jobs(None).await.unwrap(), 1);
    }
}
