use std::time::Duration;

use crate::error::{AppError, Result};

/// Delay between consecutive `/combats` pages.
pub const COMBAT_PAGE_DELAY: Duration = Duration::from_millis(500);

/// Delay before each `/pokemon` list page after the first.
pub const POKEMON_PAGE_DELAY: Duration = Duration::from_millis(800);

/// Pause after a non-429 failure while fetching a single creature's details.
pub const TRANSIENT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Base of the exponential 429 backoff: attempt `n` sleeps `BACKOFF_BASE * 2^n`.
pub const BACKOFF_BASE: Duration = Duration::from_secs(1);

pub const DEFAULT_COMBATS_PER_PAGE: u32 = 10;
pub const DEFAULT_POKEMON_PER_PAGE: u32 = 50;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

pub const DEFAULT_COMBATS_CSV: &str = "combats.csv";
pub const DEFAULT_DETAILS_CSV: &str = "pokemon_details.csv";

#[derive(Debug, Clone)]
pub struct Config {
    /// API root without trailing slash (API_BASE_URL)
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub log_level: String,
    /// Page size for `/combats` (COMBATS_PER_PAGE)
    pub combats_per_page: u32,
    /// Page size for `/pokemon` (POKEMON_PER_PAGE)
    pub pokemon_per_page: u32,
    /// Attempts per request before giving up on 429 (MAX_RETRIES)
    pub max_retries: u32,
    pub request_timeout: Duration,
    pub combats_csv: String,
    pub details_csv: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::Config(format!("{key} must be set")))
        };

        let cfg = Self {
            base_url: required("API_BASE_URL")?.trim_end_matches('/').to_string(),
            username: required("API_USERNAME")?,
            password: lookup("API_PASSWORD")
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::Config("API_PASSWORD must be set".to_string()))?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            combats_per_page: parse_positive(&lookup, "COMBATS_PER_PAGE", DEFAULT_COMBATS_PER_PAGE)?,
            pokemon_per_page: parse_positive(&lookup, "POKEMON_PER_PAGE", DEFAULT_POKEMON_PER_PAGE)?,
            max_retries: parse_positive(&lookup, "MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            request_timeout: Duration::from_secs(
                parse_positive(&lookup, "REQUEST_TIMEOUT_SECS", 30)? as u64,
            ),
            combats_csv: lookup("COMBATS_CSV").unwrap_or_else(|| DEFAULT_COMBATS_CSV.to_string()),
            details_csv: lookup("DETAILS_CSV").unwrap_or_else(|| DEFAULT_DETAILS_CSV.to_string()),
        };
        Ok(cfg)
    }
}

fn parse_positive<F>(lookup: &F, key: &str, default: u32) -> Result<u32>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(AppError::Config(format!("{key} must be a positive integer, got {raw:?}"))),
        },
    }
}
