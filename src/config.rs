//! Service configuration from the environment.

use std::time::Duration;

use crate::geocode::{NominatimConfig, DEFAULT_NOMINATIM_URL, DEFAULT_USER_AGENT};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3030";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` leaves the datastore unconfigured; the service still starts.
    pub database_url: Option<String>,
    pub pool_size: u32,
    pub connect_timeout: Duration,
    pub lookup_timeout: Duration,
    /// In-flight spatial queries per aggregate lookup.
    pub lookup_max_concurrency: usize,
    pub nominatim: NominatimConfig,
    pub bind_addr: String,
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let number = |key: &str, default: u64| {
            var(key)
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(default)
        };

        Self {
            database_url: var("DATABASE_URL"),
            pool_size: number("DATABASE_POOL_SIZE", 10) as u32,
            connect_timeout: Duration::from_secs(number("DATABASE_CONNECT_TIMEOUT_SECS", 30)),
            lookup_timeout: Duration::from_secs(number("LOOKUP_TIMEOUT_SECS", 20)),
            lookup_max_concurrency: number("LOOKUP_MAX_CONCURRENCY", 8) as usize,
            nominatim: NominatimConfig {
                base_url: var("NOMINATIM_URL").unwrap_or_else(|| DEFAULT_NOMINATIM_URL.into()),
                user_agent: var("NOMINATIM_USER_AGENT")
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.into()),
                referer: var("APP_URL"),
            },
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
