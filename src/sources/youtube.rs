use super::{PublishTimeSource, ResolveError};
use crate::constants::{MAX_SHORT_DURATION_SECS, YOUTUBE_VIDEOS_ENDPOINT};
use crate::platform::Platform;
use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{error, warn};

/// Structured-API strategy: the one platform where we get publish time and
/// duration from an authenticated metadata endpoint instead of scraping.
pub struct YoutubeSource {
    client: reqwest::Client,
    api_key: String,
}

/// The three accepted URL shapes, all carrying the 11-character video id.
static ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"youtube\.com/shorts/([A-Za-z0-9_-]{11})",
        r"youtu\.be/([A-Za-z0-9_-]{11})",
        r"youtube\.com/watch\?v=([A-Za-z0-9_-]{11})",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static DURATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$").unwrap()
});

pub(crate) fn extract_video_id(url: &str) -> Option<String> {
    ID_PATTERNS
        .iter()
        .find_map(|p| p.captures(url))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parses the API's ISO-8601 duration form (`PT1M5S` and friends) into
/// seconds. Anything the pattern does not cover is treated as a malformed
/// upstream response by the caller.
pub(crate) fn parse_duration_secs(iso: &str) -> Option<u64> {
    let caps = DURATION_PATTERN.captures(iso)?;
    let field = |i: usize| {
        caps.get(i)
            .map(|m| m.as_str().parse::<u64>().unwrap_or(0))
            .unwrap_or(0)
    };
    let secs = field(1) * 86_400 + field(2) * 3_600 + field(3) * 60 + field(4);
    // An empty match like "P" carries no information
    if caps.get(1).is_none() && caps.get(2).is_none() && caps.get(3).is_none() && caps.get(4).is_none()
    {
        return None;
    }
    Some(secs)
}

/// Applies the short-form ceiling to a raw API duration string.
pub(crate) fn short_form_duration(iso: &str) -> Result<u64, ResolveError> {
    let secs = parse_duration_secs(iso).ok_or_else(|| {
        warn!("Unparseable duration in API response: {iso}");
        ResolveError::UpstreamApi
    })?;
    if secs > MAX_SHORT_DURATION_SECS {
        Err(ResolveError::ExceedsDurationLimit(secs))
    } else {
        Ok(secs)
    }
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: Snippet,
    #[serde(rename = "contentDetails")]
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    #[serde(rename = "publishedAt")]
    published_at: String,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: String,
}

impl YoutubeSource {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait::async_trait]
impl PublishTimeSource for YoutubeSource {
    fn platform(&self) -> Platform {
        Platform::Youtube
    }

    async fn resolve_publish_time(&self, url: &str) -> Result<i64, ResolveError> {
        let video_id = extract_video_id(url).ok_or(ResolveError::UnrecognizedUrl)?;

        // Network, quota and malformed-response failures all fold into one
        // diagnostic; the caller rejects the submission, never the process.
        let response = self
            .client
            .get(YOUTUBE_VIDEOS_ENDPOINT)
            .query(&[
                ("part", "snippet,contentDetails"),
                ("id", video_id.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("YouTube API request failed: {e}");
                ResolveError::UpstreamApi
            })?;

        if !response.status().is_success() {
            error!("YouTube API returned status {}", response.status());
            return Err(ResolveError::UpstreamApi);
        }

        let body: VideoListResponse = response.json().await.map_err(|e| {
            error!("YouTube API response did not parse: {e}");
            ResolveError::UpstreamApi
        })?;

        let item = body.items.into_iter().next().ok_or(ResolveError::NotFound)?;

        short_form_duration(&item.content_details.duration)?;

        let published = DateTime::parse_from_rfc3339(&item.snippet.published_at).map_err(|e| {
            error!("YouTube publishedAt did not parse: {e}");
            ResolveError::UpstreamApi
        })?;

        Ok(published.timestamp())
    }
}
