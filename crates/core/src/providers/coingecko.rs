use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::coin::{CoinDirectoryEntry, CoinMarket};
use crate::models::settings::DEFAULT_MARKET_DATA_URL;
use super::traits::{MarketDataProvider, MarketQuery};

const PROVIDER: &str = "CoinGecko";
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// CoinGecko v3 API provider.
///
/// - **Free**: works without a key; a demo key raises the rate limit.
/// - **Endpoints**: `/coins/list`, `/coins/markets`, `/simple/price`
///
/// The base URL is configurable so a compatible mirror or a local stub
/// can stand in for the public API.
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoProvider {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_MARKET_DATA_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Attach a demo API key, sent as a header on every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn coin_list_url(&self) -> String {
        format!("{}/coins/list", self.base_url)
    }

    pub fn markets_url(&self, query: &MarketQuery) -> String {
        format!(
            "{}/coins/markets?vs_currency={}&order=market_cap_desc&per_page={}&page={}\
             &sparkline=true&price_change_percentage=1h,24h,7d",
            self.base_url, query.vs_currency, query.per_page, query.page
        )
    }

    pub fn simple_price_url(&self, coin_id: &str, vs_currency: &str) -> String {
        format!(
            "{}/simple/price?ids={coin_id}&vs_currencies={vs_currency}",
            self.base_url
        )
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    /// GET + status check + JSON decode, with errors tagged by `what`.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        what: &str,
    ) -> Result<T, CoreError> {
        let resp = self.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("{what} request failed with status {status}"),
            });
        }
        resp.json().await.map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to parse {what}: {e}"),
        })
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── CoinGecko API response types ────────────────────────────────────

/// `/simple/price` answers `{ "bitcoin": { "usd": 67000.0 } }`.
pub type SimplePriceResponse = HashMap<String, HashMap<String, Option<f64>>>;

/// Pull a single quote out of a `/simple/price` response.
pub fn extract_simple_price(
    resp: &SimplePriceResponse,
    coin_id: &str,
    vs_currency: &str,
) -> Option<f64> {
    resp.get(coin_id)
        .and_then(|quotes| quotes.get(&vs_currency.to_lowercase()))
        .copied()
        .flatten()
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl MarketDataProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch_coin_list(&self) -> Result<Vec<CoinDirectoryEntry>, CoreError> {
        self.get_json(&self.coin_list_url(), "coin list").await
    }

    async fn fetch_markets(&self, query: &MarketQuery) -> Result<Vec<CoinMarket>, CoreError> {
        self.get_json(&self.markets_url(query), "market snapshot")
            .await
    }

    async fn fetch_simple_price(
        &self,
        coin_id: &str,
        vs_currency: &str,
    ) -> Result<Option<f64>, CoreError> {
        let url = self.simple_price_url(coin_id, vs_currency);
        let resp: SimplePriceResponse = self
            .get_json(&url, &format!("price for {coin_id}"))
            .await?;
        Ok(extract_simple_price(&resp, coin_id, vs_currency))
    }
}
