use super::{PublishTimeSource, ResolveError};
use crate::constants::{BROWSER_USER_AGENT, TIKTOK_PLATFORM, TIKTOK_REHYDRATION_MARKER};
use crate::platform::Platform;
use once_cell::sync::Lazy;
use reqwest::header::USER_AGENT;
use scraper::{Html, Selector};
use tracing::warn;

/// Embedded-JSON strategy: the page ships its own structured data block, we
/// descend a fixed key path to the creation time.
pub struct TikTokSource {
    client: reqwest::Client,
}

static MARKER_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(&format!(r#"script[id="{TIKTOK_REHYDRATION_MARKER}"]"#)).unwrap()
});

const CREATE_TIME_PATH: &str = "/__DEFAULT_SCOPE__/webapp.video-detail/itemInfo/itemStruct/createTime";

/// Pulls the creation time out of a fetched page body. A missing marker, a
/// block that does not parse, or a moved key path all mean the page layout
/// changed or the content was removed.
pub(crate) fn extract_create_time(body: &str) -> Result<i64, ResolveError> {
    let document = Html::parse_document(body);
    let script = document
        .select(&MARKER_SELECTOR)
        .next()
        .ok_or(ResolveError::MarkerNotFound)?;

    let raw = script.text().collect::<String>();
    let data: serde_json::Value =
        serde_json::from_str(&raw).map_err(|_| ResolveError::MarkerNotFound)?;

    let create_time = data
        .pointer(CREATE_TIME_PATH)
        .ok_or(ResolveError::MarkerNotFound)?;

    // The field has shipped both as a bare integer and as a decimal string
    create_time
        .as_i64()
        .or_else(|| create_time.as_str().and_then(|s| s.parse().ok()))
        .ok_or(ResolveError::MarkerNotFound)
}

impl TikTokSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl PublishTimeSource for TikTokSource {
    fn platform(&self) -> Platform {
        Platform::TikTok
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
                warn!("TikTok page fetch failed: {e}");
                ResolveError::Fetch(TIKTOK_PLATFORM)
            })?;

        let body = response.text().await.map_err(|e| {
            warn!("TikTok page body read failed: {e}");
            ResolveError::Fetch(TIKTOK_PLATFORM)
        })?;

        extract_create_time(&body)
    }
}
