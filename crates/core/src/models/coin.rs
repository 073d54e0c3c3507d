use serde::{Deserialize, Serialize};

/// One entry of the full coin directory (`/coins/list`).
///
/// The directory is only used to resolve free-form user input to a
/// canonical id before a price lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinDirectoryEntry {
    /// Canonical id, e.g. "bitcoin"
    pub id: String,

    /// Ticker symbol as published upstream (usually lowercase), e.g. "btc"
    pub symbol: String,

    /// Display name, e.g. "Bitcoin"
    pub name: String,
}

impl CoinDirectoryEntry {
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
        }
    }

    /// Case-insensitive match against id, symbol or name.
    /// `query` must already be trimmed and lowercased.
    pub fn matches(&self, query: &str) -> bool {
        self.id.to_lowercase() == query
            || self.symbol.to_lowercase() == query
            || self.name.to_lowercase() == query
    }
}

/// 7-day price series attached to a market entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sparkline {
    #[serde(default)]
    pub price: Vec<f64>,
}

/// A coin as returned by the market snapshot endpoint (`/coins/markets`).
///
/// Every numeric field can be `null` upstream, so they are all optional.
/// The snapshot is replaced wholesale on every poll; the only identity a
/// coin has locally is its `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinMarket {
    pub id: String,
    pub symbol: String,
    pub name: String,

    /// Logo URL
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub current_price: Option<f64>,

    #[serde(default)]
    pub market_cap: Option<f64>,

    #[serde(default)]
    pub market_cap_rank: Option<f64>,

    #[serde(default)]
    pub total_volume: Option<f64>,

    #[serde(default)]
    pub circulating_supply: Option<f64>,

    #[serde(default)]
    pub price_change_percentage_1h_in_currency: Option<f64>,

    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,

    #[serde(default)]
    pub price_change_percentage_7d_in_currency: Option<f64>,

    #[serde(default)]
    pub sparkline_in_7d: Option<Sparkline>,
}

impl CoinMarket {
    /// Minimal constructor, mostly useful for building snapshots by hand.
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        name: impl Into<String>,
        current_price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
            image: None,
            current_price: Some(current_price),
            market_cap: None,
            market_cap_rank: None,
            total_volume: None,
            circulating_supply: None,
            price_change_percentage_1h_in_currency: None,
            price_change_percentage_24h: None,
            price_change_percentage_7d_in_currency: None,
            sparkline_in_7d: None,
        }
    }

    /// The 7-day sparkline series, empty if upstream sent none.
    pub fn sparkline_prices(&self) -> &[f64] {
        self.sparkline_in_7d
            .as_ref()
            .map(|s| s.price.as_slice())
            .unwrap_or(&[])
    }

    /// Case-insensitive substring match on name, symbol or id.
    /// An empty needle matches everything.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        needle.is_empty()
            || self.name.to_lowercase().contains(&needle)
            || self.symbol.to_lowercase().contains(&needle)
            || self.id.to_lowercase().contains(&needle)
    }
}

/// Result of resolving user input through the coin directory and fetching
/// its current USD price. Field names are the backend's wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLookup {
    /// The input exactly as the caller sent it
    pub user_input: String,

    /// Canonical id of the matched coin
    pub matched_id: String,

    /// Uppercased ticker symbol
    pub symbol: String,

    /// Display name
    pub name: String,

    /// `None` if the price source had no USD quote for this id
    pub price_usd: Option<f64>,
}
