//! Environment-driven configuration for both binaries.
//!
//! `.env` is loaded first (if present), then each setting falls back to a
//! default when its variable is unset or unparsable.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use coin_dashboard_core::models::settings::{DashboardSettings, DEFAULT_MARKET_DATA_URL};

/// Read `key` and parse it, falling back to `default`.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value for {key}: {raw:?}, using default");
            default
        }),
        Err(_) => default,
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Coin directory server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen port (`PORT`)
    pub port: u16,

    /// Static asset directory (`PUBLIC_DIR`)
    pub public_dir: PathBuf,

    /// Market data API root (`COINGECKO_BASE_URL`)
    pub market_data_url: String,

    /// Optional demo key (`COINGECKO_API_KEY`)
    pub api_key: Option<String>,

    /// Directory refresh period (`DIRECTORY_REFRESH_MINUTES`)
    pub refresh_interval: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self {
            port: env_or("PORT", 4000),
            public_dir: PathBuf::from(env_or("PUBLIC_DIR", "public".to_string())),
            market_data_url: env_or("COINGECKO_BASE_URL", DEFAULT_MARKET_DATA_URL.to_string()),
            api_key: env_opt("COINGECKO_API_KEY"),
            refresh_interval: Duration::from_secs(
                env_or("DIRECTORY_REFRESH_MINUTES", 60u64).max(1) * 60,
            ),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            public_dir: PathBuf::from("public"),
            market_data_url: DEFAULT_MARKET_DATA_URL.to_string(),
            api_key: None,
            refresh_interval: Duration::from_secs(60 * 60),
        }
    }
}

/// Headless dashboard runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub settings: DashboardSettings,

    /// Alerts service root (`ALERTS_API_BASE`); `None` keeps alerts in memory
    pub alerts_api_base: Option<String>,

    /// Where the portfolio files live (`DATA_DIR`)
    pub data_dir: PathBuf,
}

impl RunnerConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let defaults = DashboardSettings::default();
        let alerts_api_base = env_opt("ALERTS_API_BASE");
        let settings = DashboardSettings {
            poll_interval_secs: env_or("POLL_INTERVAL_SECS", defaults.poll_interval_secs),
            per_page: env_or("PER_PAGE", defaults.per_page),
            market_data_url: env_or("COINGECKO_BASE_URL", defaults.market_data_url.clone()),
            api_key: env_opt("COINGECKO_API_KEY"),
            alerts_url: alerts_api_base
                .clone()
                .unwrap_or_else(|| defaults.alerts_url.clone()),
            ..defaults
        };
        Self {
            settings,
            alerts_api_base,
            data_dir: PathBuf::from(env_or("DATA_DIR", ".coin-dashboard".to_string())),
        }
    }
}
