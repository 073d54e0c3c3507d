use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::portfolio::HISTORY_CAP;
use super::table::Pagination;

/// Public CoinGecko v3 API root.
pub const DEFAULT_MARKET_DATA_URL: &str = "https://api.coingecko.com/api/v3";

/// Where the alerts service listens by default.
pub const DEFAULT_ALERTS_URL: &str = "http://localhost:5000";

/// Dashboard configuration. Every field has a working default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Quote currency for the market snapshot (e.g. "usd")
    pub vs_currency: String,

    /// Number of coins requested per snapshot
    pub markets_per_fetch: u32,

    /// Initial market table page size
    pub per_page: usize,

    /// Seconds between poll cycles
    pub poll_interval_secs: u64,

    /// Maximum number of portfolio history points
    pub history_cap: usize,

    /// Delay before sparklines are drawn after the table, in milliseconds
    pub sparkline_delay_ms: u64,

    /// Market data API root
    pub market_data_url: String,

    /// Alerts service root
    pub alerts_url: String,

    /// Optional CoinGecko demo API key
    pub api_key: Option<String>,
}

impl DashboardSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn sparkline_delay(&self) -> Duration {
        Duration::from_millis(self.sparkline_delay_ms)
    }
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            vs_currency: "usd".to_string(),
            markets_per_fetch: 250,
            per_page: Pagination::DEFAULT_PER_PAGE,
            poll_interval_secs: 30,
            history_cap: HISTORY_CAP,
            sparkline_delay_ms: 50,
            market_data_url: DEFAULT_MARKET_DATA_URL.to_string(),
            alerts_url: DEFAULT_ALERTS_URL.to_string(),
            api_key: None,
        }
    }
}

/// Color scheme of the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    /// Label of the toggle button for this theme.
    pub fn icon(self) -> &'static str {
        match self {
            Theme::Dark => "🌙",
            Theme::Light => "☀️",
        }
    }
}
