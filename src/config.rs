//! Environment-driven application configuration

use crate::error::{AppError, Result};
use std::time::Duration;
use url::Url;

/// Environment variable holding the market-data backend base URL.
pub const API_URL_VAR: &str = "MARKET_API_URL";

/// Application configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Base URL of the market-data backend, e.g. `http://localhost:8000`.
    pub api_base_url: Url,

    /// Per-request HTTP timeout.
    pub request_timeout: Duration,

    /// How long a cached snapshot stays fresh.
    pub cache_ttl: Duration,

    /// Delay between refresh-status polls.
    pub refresh_poll_interval: Duration,

    /// Maximum number of status polls per refresh before giving up.
    ///
    /// Bounds the polling session so a hung server-side job can never
    /// leave the UI refreshing forever.
    pub refresh_max_polls: u32,
}

impl AppConfig {
    /// Read configuration from the environment.
    ///
    /// `MARKET_API_URL` is mandatory; everything else has defaults:
    /// `MARKET_API_TIMEOUT_SECS` (20), `MARKET_CACHE_TTL_SECS` (300),
    /// `REFRESH_POLL_INTERVAL_SECS` (5), `REFRESH_MAX_POLLS` (120).
    pub fn from_env() -> Result<Self> {
        let raw = std::env::var(API_URL_VAR)
            .map_err(|_| AppError::Config(format!("{} is not set", API_URL_VAR)))?;

        let api_base_url = Url::parse(&raw)
            .map_err(|e| AppError::Config(format!("{} is not a valid URL: {}", API_URL_VAR, e)))?;

        Ok(Self {
            api_base_url,
            request_timeout: Duration::from_secs(env_u64("MARKET_API_TIMEOUT_SECS", 20)?),
            cache_ttl: Duration::from_secs(env_u64("MARKET_CACHE_TTL_SECS", 300)?),
            refresh_poll_interval: Duration::from_secs(env_u64("REFRESH_POLL_INTERVAL_SECS", 5)?),
            refresh_max_polls: env_u64("REFRESH_MAX_POLLS", 120)? as u32,
        })
    }

    /// Configuration with defaults for a given base URL. Used by tests and
    /// embedders that wire the URL themselves.
    pub fn with_base_url(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            request_timeout: Duration::from_secs(20),
            cache_ttl: Duration::from_secs(300),
            refresh_poll_interval: Duration::from_secs(5),
            refresh_max_polls: 120,
        }
    }
}

fn env_u64(var: &str, default: u64) -> Result<u64> {
    match std::env::var(var) {
        Ok(v) => v
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be an integer, got '{}'", var, v))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_base_url_applies_defaults() {
        let cfg = AppConfig::with_base_url(Url::parse("http://localhost:8000").unwrap());
        assert_eq!(cfg.cache_ttl, Duration::from_secs(300));
        assert_eq!(cfg.refresh_poll_interval, Duration::from_secs(5));
        assert_eq!(cfg.refresh_max_polls, 120);
    }

    #[test]
    fn invalid_url_is_a_config_error() {
        let err = Url::parse("not a url")
            .map_err(|e| AppError::Config(format!("{} is not a valid URL: {}", API_URL_VAR, e)))
            .unwrap_err();
        assert_eq!(err.to_response().code, "CONFIG_ERROR");
    }
}
