use crate::parser::{ParseError, parse_course_listing};
use crate::types::CourseRecord;
use crate::utils::department_slug;

use futures::future;
use reqwest::Client;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
    #[error("Invalid department code: {0:?}")]
    InvalidDepartment(String),
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: crate::BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    base_url: String,
}

impl WebScraper {
    pub fn new() -> Result<Self, ScraperError> {
        Self::with_config(ScraperConfig::default())
    }

    pub fn with_config(config: ScraperConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn department_url(&self, department: &str) -> Result<String, ScraperError> {
        let slug = department_slug(department);
        if slug.is_empty() {
            return Err(ScraperError::InvalidDepartment(department.to_string()));
        }
        Ok(format!("{}/{}", self.base_url, slug))
    }

    /// Fetches one department listing page and extracts its course records.
    pub async fn fetch_department(
        &self,
        department: &str,
    ) -> Result<Vec<CourseRecord>, ScraperError> {
        let url = self.department_url(department)?;
        log::info!("Fetching course listing for {}: {}", department, url);
        let html = self.get_html(&url).await?;
        let records = parse_course_listing(&html)?;
        log::info!("Extracted {} course(s) from {}", records.len(), department);
        Ok(records)
    }

    /// Fetches several departments concurrently. Results keep the requested
    /// order; departments that fail are logged and skipped.
    pub async fn fetch_departments(&self, departments: &[String]) -> Vec<CourseRecord> {
        let results = future::join_all(
            departments
                .iter()
                .map(|department| async move { (department, self.fetch_department(department).await) }),
        )
        .await;

        let mut all = Vec::new();
        for (department, result) in results {
            match result {
                Ok(records) => all.extend(records),
                Err(e) => log::warn!("Failed to fetch department {}: {}", department, e),
            }
        }
        all
    }

    async fn get_html(&self, url: &str) -> Result<String, ScraperError> {
        Ok(self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?)
    }
}
