use std::path::PathBuf;

use shared::error::ErrorInfo;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("classification transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("classification service answered with status {status}")]
    Status { status: u16 },
    #[error("malformed classification response: {0}")]
    Decode(String),
    #[error("no tokio runtime available to run the request")]
    NoRuntime,
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ClientError {
    /// Every failure reaches the user as the same connectivity message.
    pub fn to_error_info(&self) -> ErrorInfo {
        ErrorInfo::connectivity()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid url for {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        source: url::ParseError,
    },
    #[error("invalid value for {key}: {value:?}")]
    InvalidNumber { key: String, value: String },
}
