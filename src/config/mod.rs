//! Client configuration, resolved from the environment once at startup.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Development default, matching a locally running backend.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Everything the client needs to reach the backend and persist state.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root of the backend API namespace, e.g. `http://localhost:8000/api`.
    pub api_url: Url,
    /// Directory holding the durable session store.
    pub data_dir: PathBuf,
    /// Per-request timeout. Pleading generation can take a while.
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = parse_api_url(
            optional_env("QANOUNI_API_URL")
                .as_deref()
                .unwrap_or(DEFAULT_API_URL),
        )?;

        let data_dir = match optional_env("QANOUNI_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir(),
        };

        let request_timeout = match optional_env("QANOUNI_TIMEOUT_SECS") {
            Some(raw) => parse_timeout_secs(&raw)?,
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url,
            data_dir,
            request_timeout,
        })
    }
}

/// Returns `~/.qanouni/`.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".qanouni")
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidValue {
        key: "QANOUNI_API_URL".to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn parse_timeout_secs(raw: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: "QANOUNI_TIMEOUT_SECS".to_string(),
        message: format!("expected a number of seconds, got '{raw}'"),
    })?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            key: "QANOUNI_TIMEOUT_SECS".to_string(),
            message: "timeout must be at least one second".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_api_url_parses() {
        let url = parse_api_url(DEFAULT_API_URL).unwrap();
        assert_eq!(url.path(), "/api");
    }

    #[test]
    fn api_url_rejects_garbage() {
        assert!(parse_api_url("not a url").is_err());
    }

    #[test]
    fn timeout_rejects_zero_and_non_numbers() {
        assert!(parse_timeout_secs("0").is_err());
        assert!(parse_timeout_secs("soon").is_err());
        assert_eq!(parse_timeout_secs("45").unwrap(), Duration::from_secs(45));
    }
}
