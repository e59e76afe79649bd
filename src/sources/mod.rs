pub mod tiktok;
pub mod vk;
pub mod youtube;

use crate::config::Config;
use crate::constants::FETCH_TIMEOUT_SECS;
use crate::error::Result;
use crate::platform::{classify, Platform};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use tiktok::TikTokSource;
use vk::VkSource;
use youtube::YoutubeSource;

/// Why a publish time could not be produced for a submission. Every variant
/// renders as the diagnostic shown to the submitting user; none of them is a
/// process-level failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("the link is not a recognizable YouTube video URL")]
    UnrecognizedUrl,

    #[error("video not found or private")]
    NotFound,

    #[error("not short-form content (duration {0}s exceeds the limit)")]
    ExceedsDurationLimit(u64),

    #[error("YouTube API error")]
    UpstreamApi,

    #[error("could not locate the embedded TikTok data block")]
    MarkerNotFound,

    #[error("failed to load the {0} page")]
    Fetch(&'static str),

    #[error("publish date not found on the VK page")]
    TimestampNotLocated,

    #[error("only YouTube Shorts, TikTok and VK Clips links are supported")]
    UnsupportedPlatform,
}

/// One strategy per platform, unified behind a single contract: a URL either
/// yields an epoch publish timestamp or a diagnostic explaining why not.
#[async_trait::async_trait]
pub trait PublishTimeSource: Send + Sync {
    fn platform(&self) -> Platform;

    async fn resolve_publish_time(&self, url: &str) -> std::result::Result<i64, ResolveError>;
}

/// The seam the eligibility engine consumes. Production code dispatches to a
/// per-platform strategy; tests substitute a canned implementation.
#[async_trait::async_trait]
pub trait ResolvePublishTime: Send + Sync {
    async fn resolve(&self, url: &str) -> std::result::Result<i64, ResolveError>;
}

/// Classifier-driven dispatch over the three strategies. Adding a platform
/// means adding a variant and a strategy, not branching in call sites.
pub struct PlatformResolver {
    youtube: YoutubeSource,
    tiktok: TikTokSource,
    vk: VkSource,
}

impl PlatformResolver {
    pub fn new(config: &Config) -> Result<Self> {
        // One client, shared by every strategy: redirects on (reqwest
        // default), every request bounded so a slow platform cannot stall a
        // submission handler indefinitely.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            youtube: YoutubeSource::new(client.clone(), config.youtube_api_key.clone()),
            tiktok: TikTokSource::new(client.clone()),
            vk: VkSource::new(client),
        })
    }
}

#[async_trait::async_trait]
impl ResolvePublishTime for PlatformResolver {
    async fn resolve(&self, url: &str) -> std::result::Result<i64, ResolveError> {
        let url = url.trim();
        let source: &dyn PublishTimeSource = match classify(url) {
            Some(Platform::Youtube) => &self.youtube,
            Some(Platform::TikTok) => &self.tiktok,
            Some(Platform::Vk) => &self.vk,
            None => return Err(ResolveError::UnsupportedPlatform),
        };

        let resolved = source.resolve_publish_time(url).await;
        match &resolved {
            Ok(ts) => info!(
                "Resolved publish time {} for {} link",
                ts,
                source.platform().name()
            ),
            Err(reason) => info!(
                "No publish time for {} link: {}",
                source.platform().name(),
                reason
            ),
        }
        resolved
    }
}
