use crate::errors::CoreError;
use crate::models::portfolio::{Portfolio, PortfolioHistory, PortfolioSnapshot};

use super::traits::KeyValueStore;

/// Storage key of the holdings map.
pub const PORTFOLIO_KEY: &str = "portfolio";

/// Storage key of the capped value history.
pub const HISTORY_KEY: &str = "portfolioHistory";

/// Loads and saves the portfolio and its history through any
/// `KeyValueStore`.
///
/// Flow: Portfolio → serde_json → store[`portfolio`]
///       PortfolioHistory → serde_json → store[`portfolioHistory`]
pub struct PortfolioRepository {
    store: Box<dyn KeyValueStore>,
}

impl PortfolioRepository {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the holdings. A missing key is an empty portfolio.
    pub fn load_portfolio(&self) -> Result<Portfolio, CoreError> {
        match self.store.get(PORTFOLIO_KEY)? {
            Some(json) => serde_json::from_str(&json).map_err(|e| {
                CoreError::Deserialization(format!("Failed to deserialize portfolio: {e}"))
            }),
            None => Ok(Portfolio::new()),
        }
    }

    pub fn save_portfolio(&self, portfolio: &Portfolio) -> Result<(), CoreError> {
        let json = serde_json::to_string(portfolio)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize portfolio: {e}")))?;
        self.store.set(PORTFOLIO_KEY, &json)
    }

    /// Load the history, re-applying `cap` to whatever was stored.
    pub fn load_history(&self, cap: usize) -> Result<PortfolioHistory, CoreError> {
        let mut history = PortfolioHistory::with_cap(cap);
        if let Some(json) = self.store.get(HISTORY_KEY)? {
            let stored: Vec<PortfolioSnapshot> = serde_json::from_str(&json).map_err(|e| {
                CoreError::Deserialization(format!("Failed to deserialize portfolio history: {e}"))
            })?;
            for point in stored {
                history.push(point);
            }
        }
        Ok(history)
    }

    pub fn save_history(&self, history: &PortfolioHistory) -> Result<(), CoreError> {
        let json = serde_json::to_string(history).map_err(|e| {
            CoreError::Serialization(format!("Failed to serialize portfolio history: {e}"))
        })?;
        self.store.set(HISTORY_KEY, &json)
    }

    /// Load both, falling back to empty values when stored data is
    /// unreadable. Storage I/O failures still propagate.
    pub fn load_or_default(&self, cap: usize) -> Result<(Portfolio, PortfolioHistory), CoreError> {
        let portfolio = match self.load_portfolio() {
            Ok(p) => p,
            Err(CoreError::Deserialization(msg)) => {
                tracing::warn!("Discarding stored portfolio: {msg}");
                Portfolio::new()
            }
            Err(e) => return Err(e),
        };
        let history = match self.load_history(cap) {
            Ok(h) => h,
            Err(CoreError::Deserialization(msg)) => {
                tracing::warn!("Discarding stored portfolio history: {msg}");
                PortfolioHistory::with_cap(cap)
            }
            Err(e) => return Err(e),
        };
        Ok((portfolio, history))
    }
}
