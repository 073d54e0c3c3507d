use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::alert::{NewAlert, PriceAlert};
use crate::models::coin::{CoinDirectoryEntry, CoinMarket};

/// Parameters of a market snapshot request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketQuery {
    pub vs_currency: String,
    pub per_page: u32,
    pub page: u32,
}

impl Default for MarketQuery {
    fn default() -> Self {
        Self {
            vs_currency: "usd".to_string(),
            per_page: 250,
            page: 1,
        }
    }
}

/// Source of coin directory, market snapshot and simple price data.
///
/// The CoinGecko client implements this; tests and alternative data
/// sources plug in here without touching the services.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Full list of known coins.
    async fn fetch_coin_list(&self) -> Result<Vec<CoinDirectoryEntry>, CoreError>;

    /// Market snapshot ordered by market cap, with 1h/24h/7d changes and
    /// the 7-day sparkline.
    async fn fetch_markets(&self, query: &MarketQuery) -> Result<Vec<CoinMarket>, CoreError>;

    /// Current price of one coin by canonical id.
    /// `Ok(None)` when the source has no quote in `vs_currency`.
    async fn fetch_simple_price(
        &self,
        coin_id: &str,
        vs_currency: &str,
    ) -> Result<Option<f64>, CoreError>;
}

/// CRUD surface of the alerts service.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait AlertsApi: Send + Sync {
    async fn list_alerts(&self) -> Result<Vec<PriceAlert>, CoreError>;

    /// Returns the stored alert including its server-assigned id.
    async fn create_alert(&self, alert: &NewAlert) -> Result<PriceAlert, CoreError>;

    async fn delete_alert(&self, alert_id: &str) -> Result<(), CoreError>;
}

/// Delivers user-facing messages (alert set, alert fired).
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}
