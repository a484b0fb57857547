use thiserror::Error;

use crate::messages::{self, Message};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("invalid api url: {0}")]
    Url(#[from] url::ParseError),
    #[error("api returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid api response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("job search failed: {0}")]
    Api(#[from] ApiError),
    #[error("cache update failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("desktop notification failed: {0}")]
    Desktop(String),
    #[error("failed to open {url}: {source}")]
    Browser {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("badge update failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration directory available on this platform")]
    NoConfigDir,
    #[error("configuration io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Required(String),
}

impl ConfigError {
    pub fn required(field: &str) -> Self {
        ConfigError::Required(messages::get(Message::Required, field))
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid oauth url: {0}")]
    Url(#[from] url::ParseError),
    #[error("token exchange failed: {0}")]
    Exchange(String),
    #[error("authorization state does not match the request")]
    StateMismatch,
    #[error("callback url carries no authorization code")]
    MissingCode,
    #[error("profile request failed: {0}")]
    Api(#[from] ApiError),
    #[error("failed to store access credential: {0}")]
    Store(#[from] StoreError),
    #[error("terminal io error: {0}")]
    Io(#[from] std::io::Error),
}
