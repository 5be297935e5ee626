// src/compliance/robots.rs
use super::ComplianceRegistry;
use reqwest::Client;
use tracing::{info, warn};

const DISALLOWED_PATHS: [&str; 4] = ["/jobs", "/search", "/api", "*"];

/// True when the robots.txt body blocks none of the paths a harvester would touch
pub fn robots_permits_harvesting(robots_txt: &str) -> bool {
    !DISALLOWED_PATHS
        .iter()
        .any(|path| robots_txt.contains(&format!("Disallow: {}", path)))
}

impl ComplianceRegistry {
    /// Advisory robots.txt check. Network failures report "not compliant" for
    /// this check only; the static policy flag is never touched.
    pub async fn check_robots_txt(&self, client: &Client, source: &str) -> bool {
        let Some(terms) = self.terms_of_service(source) else {
            return false;
        };

        let body = match client.get(&terms.robots_txt).send().await {
            Ok(response) => match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(source, "Failed to read robots.txt: {}", e);
                    return false;
                }
            },
            Err(e) => {
                warn!(source, "Failed to fetch robots.txt: {}", e);
                return false;
            }
        };

        let permitted = robots_permits_harvesting(&body);
        info!(source, permitted, "robots.txt checked");
        permitted
    }
}
