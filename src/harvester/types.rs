// src/harvester/types.rs
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which response shape a source's API returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "github")]
    GitHub,
    #[serde(rename = "stackoverflow")]
    StackOverflow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub name: String,
    pub base_url: String,
    #[serde(default = "default_api_based")]
    pub api_based: bool,
    pub kind: SourceKind,
}

fn default_api_based() -> bool {
    true
}

impl SourceDescriptor {
    pub fn github() -> Self {
        Self {
            name: "GitHub".to_string(),
            base_url: "https://jobs.github.com/positions.json".to_string(),
            api_based: true,
            kind: SourceKind::GitHub,
        }
    }

    pub fn stack_overflow() -> Self {
        Self {
            name: "StackOverflow".to_string(),
            base_url: "https://api.stackexchange.com/2.3/jobs".to_string(),
            api_based: true,
            kind: SourceKind::StackOverflow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Freelance,
}

impl EmploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "FULL_TIME",
            EmploymentType::PartTime => "PART_TIME",
            EmploymentType::Contract => "CONTRACT",
            EmploymentType::Internship => "INTERNSHIP",
            EmploymentType::Freelance => "FREELANCE",
        }
    }
}

impl Default for EmploymentType {
    fn default() -> Self {
        EmploymentType::FullTime
    }
}

impl fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmploymentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FULL_TIME" => Ok(EmploymentType::FullTime),
            "PART_TIME" => Ok(EmploymentType::PartTime),
            "CONTRACT" => Ok(EmploymentType::Contract),
            "INTERNSHIP" => Ok(EmploymentType::Internship),
            "FREELANCE" => Ok(EmploymentType::Freelance),
            other => anyhow::bail!("Unknown employment type: {}", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExperienceLevel {
    Entry,
    Junior,
    Mid,
    Senior,
    Executive,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "ENTRY",
            ExperienceLevel::Junior => "JUNIOR",
            ExperienceLevel::Mid => "MID",
            ExperienceLevel::Senior => "SENIOR",
            ExperienceLevel::Executive => "EXECUTIVE",
        }
    }
}

impl Default for ExperienceLevel {
    fn default() -> Self {
        ExperienceLevel::Entry
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ENTRY" => Ok(ExperienceLevel::Entry),
            "JUNIOR" => Ok(ExperienceLevel::Junior),
            "MID" => Ok(ExperienceLevel::Mid),
            "SENIOR" => Ok(ExperienceLevel::Senior),
            "EXECUTIVE" => Ok(ExperienceLevel::Executive),
            other => anyhow::bail!("Unknown experience level: {}", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: i64,
    pub max: i64,
    pub currency: String,
}

/// Canonical, source-independent job posting produced by a harvester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedJobRecord {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub responsibilities: Vec<String>,
    pub benefits: Vec<String>,
    pub salary: Option<SalaryRange>,
    pub employment_type: EmploymentType,
    pub experience: ExperienceLevel,
    pub is_remote: bool,
    pub url: String,
    pub source: String,
    pub posted_at: DateTime<Utc>,
}

// ===== Source API response shapes =====

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GitHubPosting {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    pub created_at: Option<String>,
}

impl GitHubPosting {
    /// GitHub Jobs used both RFC 3339 and "Wed May 20 18:36:53 UTC 2020"
    pub fn posted_at(&self) -> DateTime<Utc> {
        let Some(raw) = self.created_at.as_deref() else {
            return Utc::now();
        };

        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return parsed.with_timezone(&Utc);
        }

        chrono::NaiveDateTime::parse_from_str(raw, "%a %b %d %H:%M:%S UTC %Y")
            .map(|naive| naive.and_utc())
            .unwrap_or_else(|_| Utc::now())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StackOverflowResponse {
    #[serde(default)]
    pub items: Vec<StackOverflowPosting>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StackOverflowPosting {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    pub creation_date: Option<i64>,
}

impl StackOverflowPosting {
    pub fn posted_at(&self) -> DateTime<Utc> {
        self.creation_date
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_else(Utc::now)
    }
}
