use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use shared::protocol::UPLOAD_FIELD_NAME;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "leafscan.toml";
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/predict";
pub const DEFAULT_HEALTH_URL: &str = "http://localhost:8000/ping";
pub const DEFAULT_PUBLISH_DELAY: Duration = Duration::from_millis(400);
pub const DEFAULT_ACCEPT: &str = "image/*";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub endpoint: Url,
    pub health_url: Url,
    pub field_name: String,
    /// Pause between a successful response and publishing it, so the result
    /// card does not flash in. Not a retry or backoff.
    pub publish_delay: Duration,
    /// `None` leaves the transport default in place.
    pub request_timeout: Option<Duration>,
    pub accept: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid url"),
            health_url: Url::parse(DEFAULT_HEALTH_URL).expect("default health url is a valid url"),
            field_name: UPLOAD_FIELD_NAME.into(),
            publish_delay: DEFAULT_PUBLISH_DELAY,
            request_timeout: None,
            accept: DEFAULT_ACCEPT.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    endpoint: Option<String>,
    health_url: Option<String>,
    field_name: Option<String>,
    publish_delay_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    accept: Option<String>,
}

/// Defaults, then `leafscan.toml` (or `path`), then `APP__*` environment
/// overrides. An explicit `path` must exist; the default file is optional.
pub fn load_settings(path: Option<&Path>) -> Result<ClientSettings, ConfigError> {
    let mut settings = ClientSettings::default();

    let file_path = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);
    match fs::read_to_string(&file_path) {
        Ok(raw) => apply_file(&mut settings, &raw)?,
        Err(err) if path.is_none() && err.kind() == std::io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(ConfigError::Io {
                path: file_path,
                source,
            })
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut ClientSettings, raw: &str) -> Result<(), ConfigError> {
    let file_cfg: FileSettings = toml::from_str(raw)?;

    if let Some(v) = file_cfg.endpoint {
        settings.endpoint = parse_url("endpoint", &v)?;
    }
    if let Some(v) = file_cfg.health_url {
        settings.health_url = parse_url("health_url", &v)?;
    }
    if let Some(v) = file_cfg.field_name {
        settings.field_name = v;
    }
    if let Some(v) = file_cfg.publish_delay_ms {
        settings.publish_delay = Duration::from_millis(v);
    }
    if let Some(v) = file_cfg.request_timeout_ms {
        settings.request_timeout = Some(Duration::from_millis(v));
    }
    if let Some(v) = file_cfg.accept {
        settings.accept = v;
    }
    Ok(())
}

fn apply_env_overrides(
    settings: &mut ClientSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(v) = lookup("LEAFSCAN_ENDPOINT") {
        settings.endpoint = parse_url("LEAFSCAN_ENDPOINT", &v)?;
    }
    if let Some(v) = lookup("APP__ENDPOINT") {
        settings.endpoint = parse_url("APP__ENDPOINT", &v)?;
    }
    if let Some(v) = lookup("APP__HEALTH_URL") {
        settings.health_url = parse_url("APP__HEALTH_URL", &v)?;
    }
    if let Some(v) = lookup("APP__PUBLISH_DELAY_MS") {
        settings.publish_delay = Duration::from_millis(parse_millis("APP__PUBLISH_DELAY_MS", v)?);
    }
    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_MS") {
        settings.request_timeout = Some(Duration::from_millis(parse_millis(
            "APP__REQUEST_TIMEOUT_MS",
            v,
        )?));
    }
    Ok(())
}

pub fn parse_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { field, source })
}

fn parse_millis(key: &str, value: String) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidNumber {
            key: key.to_string(),
            value,
        })
}
