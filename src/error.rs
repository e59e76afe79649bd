use thiserror::Error;

#[derive(Error, Debug)]
pub enum GiveawayError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("a video ticket already exists for this user and giveaway")]
    DuplicateSubmission,

    #[error("no tickets in the draw pool")]
    NoParticipants,
}

pub type Result<T> = std::result::Result<T, GiveawayError>;
