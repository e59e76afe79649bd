/// Platform name constants to keep log lines and diagnostics consistent
/// across the classifier, the resolvers and the reply formatting.

pub const YOUTUBE_PLATFORM: &str = "YouTube Shorts";
pub const TIKTOK_PLATFORM: &str = "TikTok";
pub const VK_PLATFORM: &str = "VK Clips";

/// Metadata endpoint for the structured-API strategy.
pub const YOUTUBE_VIDEOS_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/videos";

/// Script element carrying TikTok's embedded page data.
pub const TIKTOK_REHYDRATION_MARKER: &str = "__UNIVERSAL_DATA_FOR_REHYDRATION__";

/// Anything longer than this is not short-form content and never earns a ticket.
pub const MAX_SHORT_DURATION_SECS: u64 = 65;

/// Upper bound on every upstream fetch; a timeout is treated as a fetch error.
pub const FETCH_TIMEOUT_SECS: u64 = 15;

/// Page fetches need a realistic client identifier or the platforms serve
/// stripped-down markup without the embedded data we read.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

/// Default path of the ledger database, overridable via `GIVEAWAY_DB`.
pub const DEFAULT_DB_PATH: &str = "giveaway.db";

/// Default row count for the admin top list.
pub const DEFAULT_TOP_LIMIT: usize = 10;
