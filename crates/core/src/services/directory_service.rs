use std::sync::{Arc, RwLock};

use crate::errors::CoreError;
use crate::models::coin::{CoinDirectoryEntry, PriceLookup};
use crate::providers::traits::MarketDataProvider;

/// In-memory coin directory with lookup-by-name/symbol/id and price proxy.
///
/// The directory is replaced wholesale on every refresh. Readers clone the
/// inner `Arc`, so a lookup running during a refresh sees either the old
/// or the new list, never a mix.
pub struct DirectoryService {
    provider: Arc<dyn MarketDataProvider>,
    entries: RwLock<Arc<Vec<CoinDirectoryEntry>>>,
    vs_currency: String,
}

impl DirectoryService {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            provider,
            entries: RwLock::new(Arc::new(Vec::new())),
            vs_currency: "usd".to_string(),
        }
    }

    /// Start from a known directory instead of an empty one.
    pub fn with_entries(
        provider: Arc<dyn MarketDataProvider>,
        entries: Vec<CoinDirectoryEntry>,
    ) -> Self {
        let service = Self::new(provider);
        service.replace(entries);
        service
    }

    /// Current directory (cheap: clones the `Arc`).
    pub fn entries(&self) -> Arc<Vec<CoinDirectoryEntry>> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn replace(&self, entries: Vec<CoinDirectoryEntry>) {
        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(entries);
    }

    /// Re-fetch the whole directory and swap it in.
    ///
    /// On failure the previous directory stays in place and the error is
    /// returned for the caller to log; nothing is retried here.
    pub async fn refresh(&self) -> Result<usize, CoreError> {
        let entries = self.provider.fetch_coin_list().await?;
        let count = entries.len();
        self.replace(entries);
        tracing::info!("Coin list updated. Total coins: {count}");
        Ok(count)
    }

    /// `refresh`, but failures are logged instead of returned.
    pub async fn refresh_logged(&self) {
        if let Err(e) = self.refresh().await {
            tracing::error!("Failed to update coin list: {e}");
        }
    }

    /// Resolve free-form input to a directory entry.
    ///
    /// Input is trimmed and lowercased; the first entry whose id, symbol or
    /// name matches case-insensitively wins.
    pub fn find(&self, input: &str) -> Option<CoinDirectoryEntry> {
        let query = input.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        self.entries().iter().find(|c| c.matches(&query)).cloned()
    }

    /// Resolve `input` and fetch the matched coin's current price.
    ///
    /// - no directory match → `CoreError::CoinNotFound` (no upstream call)
    /// - price fetch failure → the upstream error, unchanged
    /// - upstream without a quote → `price_usd: None`
    pub async fn lookup_price(&self, input: &str) -> Result<PriceLookup, CoreError> {
        let entry = self
            .find(input)
            .ok_or_else(|| CoreError::CoinNotFound(input.to_string()))?;

        let price_usd = self
            .provider
            .fetch_simple_price(&entry.id, &self.vs_currency)
            .await?;

        Ok(PriceLookup {
            user_input: input.to_string(),
            matched_id: entry.id,
            symbol: entry.symbol.to_uppercase(),
            name: entry.name,
            price_usd,
        })
    }
}
