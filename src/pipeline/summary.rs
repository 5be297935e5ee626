// src/pipeline/summary.rs
//! Observable result of a scraping run: every unit of work reports an outcome
//! and nothing is swallowed into logs alone.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Aborted { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Harvested,
    SkippedNonCompliant,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnitOutcome {
    Harvested {
        fetched: usize,
        created: usize,
        duplicates: usize,
        failed: usize,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    pub keyword: String,
    pub location: String,
    pub outcome: UnitOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub source: String,
    pub status: SourceStatus,
    pub units: Vec<UnitReport>,
}

impl SourceSummary {
    pub fn skipped(source: &str) -> Self {
        Self {
            source: source.to_string(),
            status: SourceStatus::SkippedNonCompliant,
            units: Vec::new(),
        }
    }

    /// A source fails as a whole only when it had work and every unit failed
    pub fn from_units(source: &str, units: Vec<UnitReport>) -> Self {
        let last_error = units.iter().rev().find_map(|unit| match &unit.outcome {
            UnitOutcome::Failed { error } => Some(error.clone()),
            UnitOutcome::Harvested { .. } => None,
        });
        let all_failed = !units.is_empty()
            && units
                .iter()
                .all(|unit| matches!(unit.outcome, UnitOutcome::Failed { .. }));

        let status = match last_error {
            Some(error) if all_failed => SourceStatus::Failed { error },
            _ => SourceStatus::Harvested,
        };

        Self {
            source: source.to_string(),
            status,
            units,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    pub units_succeeded: usize,
    pub units_failed: usize,
    pub sources_skipped: usize,
    pub sources_failed: usize,
    pub jobs_fetched: usize,
    pub jobs_created: usize,
    pub duplicates: usize,
    pub persistence_failures: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: RunOutcome,
    pub sources: Vec<SourceSummary>,
    pub totals: RunTotals,
}

impl RunSummary {
    pub fn completed(run_id: Uuid, started_at: DateTime<Utc>, sources: Vec<SourceSummary>) -> Self {
        let totals = Self::tally(&sources);
        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            outcome: RunOutcome::Completed,
            sources,
            totals,
        }
    }

    pub fn aborted(run_id: Uuid, started_at: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            outcome: RunOutcome::Aborted {
                reason: reason.into(),
            },
            sources: Vec::new(),
            totals: RunTotals::default(),
        }
    }

    fn tally(sources: &[SourceSummary]) -> RunTotals {
        let mut totals = RunTotals::default();

        for source in sources {
            match source.status {
                SourceStatus::SkippedNonCompliant => totals.sources_skipped += 1,
                SourceStatus::Failed { .. } => totals.sources_failed += 1,
                SourceStatus::Harvested => {}
            }

            for unit in &source.units {
                match unit.outcome {
                    UnitOutcome::Harvested {
                        fetched,
                        created,
                        duplicates,
                        failed,
                    } => {
                        totals.units_succeeded += 1;
                        totals.jobs_fetched += fetched;
                        totals.jobs_created += created;
                        totals.duplicates += duplicates;
                        totals.persistence_failures += failed;
                    }
                    UnitOutcome::Failed { .. } => totals.units_failed += 1,
                }
            }
        }

        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(outcome: UnitOutcome) -> UnitReport {
        UnitReport {
            keyword: "rust".to_string(),
            location: "Remote".to_string(),
            outcome,
        }
    }

    fn failed(error: &str) -> UnitOutcome {
        UnitOutcome::Failed {
            error: error.to_string(),
        }
    }

    #[test]
    fn test_source_fails_only_when_every_unit_failed() {
        let partial = SourceSummary::from_units(
            "GitHub",
            vec![
                unit(failed("timeout")),
                unit(UnitOutcome::Harvested {
                    fetched: 1,
                    created: 1,
                    duplicates: 0,
                    failed: 0,
                }),
            ],
        );
        assert_eq!(partial.status, SourceStatus::Harvested);

        let dead = SourceSummary::from_units("GitHub", vec![unit(failed("a")), unit(failed("b"))]);
        assert_eq!(
            dead.status,
            SourceStatus::Failed {
                error: "b".to_string()
            }
        );
    }

    #[test]
    fn test_totals_aggregate_units_and_sources() {
        let summary = RunSummary::completed(
            Uuid::new_v4(),
            Utc::now(),
            vec![
                SourceSummary::skipped("LinkedIn"),
                SourceSummary::from_units(
                    "GitHub",
                    vec![
                        unit(UnitOutcome::Harvested {
                            fetched: 3,
                            created: 1,
                            duplicates: 1,
                            failed: 1,
                        }),
                        unit(failed("HTTP 500")),
                    ],
                ),
            ],
        );

        assert_eq!(
            summary.totals,
            RunTotals {
                units_succeeded: 1,
                units_failed: 1,
                sources_skipped: 1,
                sources_failed: 0,
                jobs_fetched: 3,
                jobs_created: 1,
                duplicates: 1,
                persistence_failures: 1,
            }
        );
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let summary = RunSummary::aborted(Uuid::new_v4(), Utc::now(), "no compliant sources");
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["outcome"]["status"], "aborted");
        assert_eq!(json["outcome"]["reason"], "no compliant sources");
    }
}
