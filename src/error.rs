use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("no token given: pass --token or set SLACK_TOKEN")]
    MissingToken,

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("Slack API error on {method}: {error}")]
    SlackApi { method: String, error: String },

    #[error("Slack rate limit error on {method}: retry after {retry_after_secs}s")]
    SlackRateLimit { method: String, retry_after_secs: u64 },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("invalid API url: {0}")]
    InvalidUrl(String),

    #[error("{method} for {channel} still had more pages after {pages} requests")]
    PageLimitExceeded {
        method: String,
        channel: String,
        pages: usize,
    },

    #[error("{method} for {channel} reported more pages but gave no timestamp to continue from")]
    MissingCursor { method: String, channel: String },

    #[error("failed to read file at {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write file at {path}: {source}")]
    WriteFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("JSON serialization error: {0}")]
    JsonSerialize(String),

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("export incomplete: {failed} conversation(s) failed")]
    ExportIncomplete { failed: usize },
}

pub type Result<T> = std::result::Result<T, AppError>;
