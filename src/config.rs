use reqwest::Url;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required setting {0}")] Missing(&'static str),
    #[error("invalid value for {key}: {reason}")] Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base of the presentation API; `/presigned` and `/generate` hang off it.
    pub base_url: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("PRESENTATION_API_BASE").ok_or(ConfigError::Missing("PRESENTATION_API_BASE"))?;
        let mut config = Self::new(&base_url)?;

        if let Some(port) = lookup("PORT") {
            config.port = port.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                key: "PORT",
                reason: e.to_string(),
            })?;
        }
        if let Some(limit) = lookup("MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = limit.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                key: "MAX_UPLOAD_BYTES",
                reason: e.to_string(),
            })?;
        }
        Ok(config)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|e| ConfigError::Invalid { key: "PRESENTATION_API_BASE", reason: e.to_string() })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            key: "PRESENTATION_API_BASE",
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(trimmed.to_string())
}
