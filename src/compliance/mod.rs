// src/compliance/mod.rs
//! Per-source scraping policy: who may be contacted, and how often.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{error, warn};

pub mod robots;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    pub source: String,
    pub allows_scraping: bool,
    /// Requests per hour
    pub rate_limit: u32,
    pub requires_auth: bool,
    pub requires_headers: bool,
    pub robots_txt: String,
    pub terms_url: String,
    pub last_checked: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceReport {
    pub compliant_sources: Vec<String>,
    pub non_compliant_sources: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Static table of terms-of-service facts, immutable after construction
#[derive(Debug, Clone)]
pub struct ComplianceRegistry {
    records: BTreeMap<String, ComplianceRecord>,
}

impl ComplianceRegistry {
    pub fn new(records: impl IntoIterator<Item = ComplianceRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|mut record| {
                if !record.allows_scraping && record.rate_limit != 0 {
                    warn!(
                        source = %record.source,
                        rate_limit = record.rate_limit,
                        "Disallowed source declared a rate limit; forcing it to 0"
                    );
                    record.rate_limit = 0;
                }
                (record.source.clone(), record)
            })
            .collect();

        Self { records }
    }

    /// Terms as reviewed for the known job boards
    pub fn with_default_terms() -> Self {
        let now = Utc::now();
        let record = |source: &str,
                      allows_scraping: bool,
                      rate_limit: u32,
                      requires_auth: bool,
                      requires_headers: bool,
                      robots_txt: &str,
                      terms_url: &str| ComplianceRecord {
            source: source.to_string(),
            allows_scraping,
            rate_limit,
            requires_auth,
            requires_headers,
            robots_txt: robots_txt.to_string(),
            terms_url: terms_url.to_string(),
            last_checked: now,
        };

        Self::new([
            record(
                "LinkedIn",
                false,
                0,
                true,
                true,
                "https://www.linkedin.com/robots.txt",
                "https://www.linkedin.com/legal/user-agreement",
            ),
            record(
                "Indeed",
                false,
                0,
                false,
                true,
                "https://www.indeed.com/robots.txt",
                "https://www.indeed.com/legal",
            ),
            record(
                "Glassdoor",
                false,
                0,
                false,
                true,
                "https://www.glassdoor.com/robots.txt",
                "https://www.glassdoor.com/about/terms.htm",
            ),
            record(
                "Monster",
                false,
                0,
                false,
                true,
                "https://www.monster.com/robots.txt",
                "https://www.monster.com/terms-of-use",
            ),
            record(
                "GitHub",
                true,
                60,
                false,
                false,
                "https://jobs.github.com/robots.txt",
                "https://docs.github.com/en/rest/reference/search#search-jobs",
            ),
            record(
                "StackOverflow",
                true,
                30,
                false,
                false,
                "https://stackoverflow.com/jobs/robots.txt",
                "https://stackoverflow.com/legal/api-terms-of-use",
            ),
        ])
    }

    /// Unknown sources are never allowed
    pub fn is_scraping_allowed(&self, source: &str) -> bool {
        self.records
            .get(source)
            .map(|record| record.allows_scraping)
            .unwrap_or(false)
    }

    pub fn rate_limit(&self, source: &str) -> u32 {
        self.records
            .get(source)
            .map(|record| record.rate_limit)
            .unwrap_or(0)
    }

    pub fn compliant_sources(&self) -> BTreeSet<String> {
        self.records
            .values()
            .filter(|record| record.allows_scraping)
            .map(|record| record.source.clone())
            .collect()
    }

    pub fn terms_of_service(&self, source: &str) -> Option<&ComplianceRecord> {
        self.records.get(source)
    }

    pub fn records(&self) -> impl Iterator<Item = &ComplianceRecord> {
        self.records.values()
    }

    pub fn compliance_report(&self) -> ComplianceReport {
        let compliant_sources: Vec<String> = self.compliant_sources().into_iter().collect();
        let non_compliant_sources = self
            .records
            .keys()
            .filter(|source| !compliant_sources.contains(source))
            .cloned()
            .collect();

        ComplianceReport {
            compliant_sources,
            non_compliant_sources,
            recommendations: vec![
                "Use only API-based sources for automated data collection".to_string(),
                "Implement proper rate limiting for all requests".to_string(),
                "Respect robots.txt files".to_string(),
                "Monitor for changes in terms of service".to_string(),
                "Consider using official APIs instead of scraping".to_string(),
            ],
        }
    }

    pub fn log_violation(&self, source: &str, violation: &str) {
        error!(target: "compliance", source, "LEGAL COMPLIANCE VIOLATION: {}", violation);
    }
}

impl Default for ComplianceRegistry {
    fn default() -> Self {
        Self::with_default_terms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source: &str, allows_scraping: bool, rate_limit: u32) -> ComplianceRecord {
        ComplianceRecord {
            source: source.to_string(),
            allows_scraping,
            rate_limit,
            requires_auth: false,
            requires_headers: false,
            robots_txt: format!("https://{}.example/robots.txt", source),
            terms_url: format!("https://{}.example/terms", source),
            last_checked: Utc::now(),
        }
    }

    #[test]
    fn test_default_terms() {
        let registry = ComplianceRegistry::with_default_terms();
        assert!(registry.is_scraping_allowed("GitHub"));
        assert!(!registry.is_scraping_allowed("LinkedIn"));
        assert_eq!(registry.rate_limit("GitHub"), 60);
        assert_eq!(registry.rate_limit("StackOverflow"), 30);
        assert_eq!(
            registry.compliant_sources().into_iter().collect::<Vec<_>>(),
            vec!["GitHub".to_string(), "StackOverflow".to_string()]
        );
    }

    #[test]
    fn test_unknown_source_fails_closed() {
        let registry = ComplianceRegistry::with_default_terms();
        assert!(!registry.is_scraping_allowed("Craigslist"));
        assert_eq!(registry.rate_limit("Craigslist"), 0);
        assert!(registry.terms_of_service("Craigslist").is_none());
    }

    #[test]
    fn test_disallowed_source_rate_limit_forced_to_zero() {
        let registry = ComplianceRegistry::new([record("Shady", false, 120)]);
        assert_eq!(registry.rate_limit("Shady"), 0);
        assert!(registry.compliant_sources().is_empty());
    }

    #[test]
    fn test_compliance_report_partitions_sources() {
        let registry = ComplianceRegistry::new([
            record("Alpha", true, 10),
            record("Beta", false, 0),
            record("Gamma", true, 5),
        ]);
        let report = registry.compliance_report();
        assert_eq!(report.compliant_sources, vec!["Alpha", "Gamma"]);
        assert_eq!(report.non_compliant_sources, vec!["Beta"]);
        assert_eq!(report.recommendations.len(), 5);
    }
}
