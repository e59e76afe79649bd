use crate::constants::DEFAULT_DB_PATH;
use crate::error::{GiveawayError, Result};
use std::env;

/// Immutable runtime configuration, resolved once at startup.
///
/// Core logic never reads the process environment; everything it needs is
/// handed to it through this value at construction time.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the structured metadata lookups.
    pub youtube_api_key: String,
    /// The single identity allowed to run administrative commands.
    pub admin_id: i64,
    /// Bot handle used when rendering referral links.
    pub bot_handle: String,
    /// Path of the SQLite ledger database.
    pub db_path: String,
}

impl Config {
    /// Reads configuration from the environment. Missing credentials are a
    /// startup-fatal configuration error; nothing is fetched lazily later.
    pub fn from_env() -> Result<Self> {
        let youtube_api_key = require("YOUTUBE_API_KEY")?;
        let admin_id = require("ADMIN_ID")?
            .parse::<i64>()
            .map_err(|_| GiveawayError::Config("ADMIN_ID must be a numeric user id".into()))?;
        let bot_handle = require("BOT_HANDLE")?;
        let db_path = env::var("GIVEAWAY_DB").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

        Ok(Self {
            youtube_api_key,
            admin_id,
            bot_handle,
            db_path,
        })
    }
}

fn require(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(GiveawayError::Config(format!("{name} is not set"))),
    }
}
