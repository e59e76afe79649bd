use super::{PublishTimeSource, ResolveError};
use crate::constants::{BROWSER_USER_AGENT, VK_PLATFORM};
use crate::platform::Platform;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::USER_AGENT;
use tracing::warn;

/// Pattern-scrape strategy: known timestamp shapes in the raw page body,
/// tried in priority order. This is the least
/// reliable of the three strategies and is expected to degrade when the page
/// markup changes; only its diagnostic surfaces that, never the ledger.
pub struct VkSource {
    client: reqwest::Client,
}

/// Priority order matters: the quoted, whitespace-tolerant forms are the
/// ones the clip pages currently emit; the bare `"date":<n>` form is the
/// last-resort catch-all.
static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#""date":\s*(\d+)"#,
        r#"data-published="(\d+)""#,
        r#""publish_date":\s*(\d+)"#,
        r#""date":(\d+)"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// First capturing match wins.
pub(crate) fn find_publish_date(body: &str) -> Option<i64> {
    DATE_PATTERNS
        .iter()
        .find_map(|p| p.captures(body))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

impl VkSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl PublishTimeSource for VkSource {
    fn platform(&self) -> Platform {
        Platform::Vk
    }

    async fn resolve_publish_time(&self, url: &str) -> Result<i64, ResolveError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!("VK page fetch failed: {e}");
                ResolveError::Fetch(VK_PLATFORM)
            })?;

        let body = response.text().await.map_err(|e| {
            warn!("VK page body read failed: {e}");
            ResolveError::Fetch(VK_PLATFORM)
        })?;

        find_publish_date(&body).ok_or(ResolveError::TimestampNotLocated)
    }
}
