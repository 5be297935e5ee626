// src/harvester/extract.rs
//! Keyword heuristics that turn a free-text job description into structured fields.

use super::types::{EmploymentType, ExperienceLevel, SalaryRange};
use regex::Regex;
use scraper::Html;
use std::sync::OnceLock;

/// Maximum number of entries kept per extracted section
pub const SECTION_ITEM_CAP: usize = 5;

struct Section {
    starts: &'static [&'static str],
    stops: &'static [&'static str],
}

const REQUIREMENTS: Section = Section {
    starts: &["requirements", "qualifications"],
    stops: &["responsibilities", "duties", "benefits", "perks"],
};

const RESPONSIBILITIES: Section = Section {
    starts: &["responsibilities", "duties"],
    stops: &["benefits", "perks", "requirements", "qualifications"],
};

const BENEFITS: Section = Section {
    starts: &["benefits", "perks"],
    stops: &["requirements", "qualifications", "responsibilities", "duties"],
};

pub fn extract_requirements(description: &str) -> Vec<String> {
    extract_section(description, &REQUIREMENTS)
}

pub fn extract_responsibilities(description: &str) -> Vec<String> {
    extract_section(description, &RESPONSIBILITIES)
}

pub fn extract_benefits(description: &str) -> Vec<String> {
    extract_section(description, &BENEFITS)
}

fn extract_section(description: &str, section: &Section) -> Vec<String> {
    let mut items = Vec::new();
    let mut inside = false;

    for line in description.lines() {
        let lower = line.to_lowercase();

        if !inside {
            if section.starts.iter().any(|header| lower.contains(header)) {
                inside = true;
            }
            continue;
        }

        if section.stops.iter().any(|header| lower.contains(header)) {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        items.push(trimmed.to_string());
        if items.len() == SECTION_ITEM_CAP {
            break;
        }
    }

    items
}

fn salary_regex() -> &'static Regex {
    static SALARY: OnceLock<Regex> = OnceLock::new();
    SALARY.get_or_init(|| {
        Regex::new(r"\$(\d{1,3}(?:,\d{3})*)\s*-\s*\$(\d{1,3}(?:,\d{3})*)")
            .expect("salary pattern is valid")
    })
}

/// Matches the first `$N,NNN - $N,NNN` range; amounts are always USD.
pub fn extract_salary(description: &str) -> Option<SalaryRange> {
    let captures = salary_regex().captures(description)?;
    let parse = |idx: usize| -> Option<i64> {
        captures.get(idx)?.as_str().replace(',', "").parse().ok()
    };

    Some(SalaryRange {
        min: parse(1)?,
        max: parse(2)?,
        currency: "USD".to_string(),
    })
}

pub fn determine_employment_type(title: &str, description: &str) -> EmploymentType {
    let text = format!("{} {}", title, description).to_lowercase();

    if contains_any(&text, &["full-time", "full time"]) {
        EmploymentType::FullTime
    } else if contains_any(&text, &["part-time", "part time"]) {
        EmploymentType::PartTime
    } else if text.contains("contract") {
        EmploymentType::Contract
    } else if contains_any(&text, &["internship", "intern"]) {
        EmploymentType::Internship
    } else if text.contains("freelance") {
        EmploymentType::Freelance
    } else {
        EmploymentType::default()
    }
}

pub fn determine_experience_level(title: &str, description: &str) -> ExperienceLevel {
    let text = format!("{} {}", title, description).to_lowercase();

    if contains_any(&text, &["senior", "lead", "principal"]) {
        ExperienceLevel::Senior
    } else if contains_any(&text, &["junior", "entry level", "entry-level"]) {
        ExperienceLevel::Junior
    } else if contains_any(&text, &["executive", "director", "vp"]) {
        ExperienceLevel::Executive
    } else if contains_any(&text, &["mid", "intermediate"]) {
        ExperienceLevel::Mid
    } else {
        ExperienceLevel::default()
    }
}

pub fn is_remote_job(title: &str, description: &str, location: &str) -> bool {
    let text = format!("{} {} {}", title, description, location).to_lowercase();
    contains_any(&text, &["remote", "work from home", "wfh"])
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

fn block_tag_regex() -> &'static Regex {
    static BLOCK_TAGS: OnceLock<Regex> = OnceLock::new();
    BLOCK_TAGS.get_or_init(|| {
        Regex::new(r"(?i)<br\s*/?>|</?(?:p|li|ul|ol|div|h[1-6]|tr)(?:\s[^>]*)?>")
            .expect("block tag pattern is valid")
    })
}

/// Flatten an HTML description into plain text, one block element per line.
/// Plain-text descriptions are returned unchanged.
pub fn description_to_text(description: &str) -> String {
    if !looks_like_html(description) {
        return description.to_string();
    }

    let with_breaks = block_tag_regex().replace_all(description, "\n");
    let fragment = Html::parse_fragment(&with_breaks);
    let text: String = fragment.root_element().text().collect();

    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn looks_like_html(text: &str) -> bool {
    let trimmed = text.trim_start();
    trimmed.starts_with('<') || block_tag_regex().is_match(text)
}
