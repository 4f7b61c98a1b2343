//! Runtime configuration read from the environment (and an optional `.env`).

use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;
const DEFAULT_LOOKUP_TTL_SECS: u64 = 300;

const ENV_API_URL: &str = "BAGSPACE_API_URL";
const ENV_HTTP_TIMEOUT: &str = "BAGSPACE_HTTP_TIMEOUT_SECS";
const ENV_LOOKUP_TTL: &str = "BAGSPACE_LOOKUP_TTL_SECS";
const ENV_API_TOKEN: &str = "BAGSPACE_API_TOKEN";
const ENV_USER_NAME: &str = "BAGSPACE_USER";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BAGSPACE_API_URL is not a valid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("{key} must be a whole number of seconds, got {value:?}")]
    InvalidSeconds { key: &'static str, value: String },
}

#[derive(Clone, PartialEq)]
pub struct AppConfig {
    pub api_base_url: Url,
    pub http_timeout: Duration,
    pub lookup_ttl: Duration,
    /// Bearer token of an existing session, issued by the web sign-in flow.
    pub api_token: Option<String>,
    pub user_name: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_base_url", &self.api_base_url.as_str())
            .field("http_timeout", &self.http_timeout)
            .field("lookup_ttl", &self.lookup_ttl)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("user_name", &self.user_name)
            .finish()
    }
}

impl AppConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = match lookup(ENV_API_URL).filter(|value| !value.trim().is_empty()) {
            Some(raw) => parse_base_url(raw.trim())?,
            None => parse_base_url(DEFAULT_API_URL)?,
        };
        let mut config = Self {
            api_base_url,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            lookup_ttl: Duration::from_secs(DEFAULT_LOOKUP_TTL_SECS),
            api_token: non_blank(lookup(ENV_API_TOKEN)),
            user_name: non_blank(lookup(ENV_USER_NAME)),
        };

        if let Some(raw) = lookup(ENV_HTTP_TIMEOUT) {
            config.http_timeout = parse_seconds(ENV_HTTP_TIMEOUT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_LOOKUP_TTL) {
            config.lookup_ttl = parse_seconds(ENV_LOOKUP_TTL, &raw)?;
        }

        Ok(config)
    }
}

/// `Url::join` drops the last segment unless the base ends with `/`.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    if raw.ends_with('/') {
        Ok(Url::parse(raw)?)
    } else {
        Ok(Url::parse(&format!("{raw}/"))?)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn parse_seconds(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::InvalidSeconds {
            key,
            value: raw.to_string(),
        })
}
