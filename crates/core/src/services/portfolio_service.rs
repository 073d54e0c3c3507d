use chrono::{DateTime, Utc};

use crate::errors::CoreError;
use crate::models::coin::CoinMarket;
use crate::models::portfolio::{
    Holding, HoldingRow, Portfolio, PortfolioHistory, PortfolioSnapshot, PortfolioView,
};

/// Manages holdings and computes their valuation.
///
/// Pure business logic over the portfolio; no I/O.
pub struct PortfolioService;

impl PortfolioService {
    pub fn new() -> Self {
        Self
    }

    /// Parse a user-entered quantity. Must be a finite number above zero.
    pub fn parse_quantity(input: &str) -> Result<f64, CoreError> {
        let qty: f64 = input.trim().parse().map_err(|_| {
            CoreError::ValidationError(format!("Quantity is not a number: {input:?}"))
        })?;
        if !qty.is_finite() || qty <= 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Quantity must be a positive number, got {qty}"
            )));
        }
        Ok(qty)
    }

    /// Add `quantity` of a coin at `price`.
    ///
    /// A new holding is created at `price`. An existing one accumulates the
    /// quantity, and both its purchase price and current price are reset to
    /// `price` (the cost basis is not averaged).
    pub fn add(
        &self,
        portfolio: &mut Portfolio,
        coin_id: &str,
        name: &str,
        price: f64,
        quantity: f64,
    ) -> Result<(), CoreError> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(CoreError::ValidationError(
                "Quantity must be a positive number".into(),
            ));
        }
        if !price.is_finite() || price < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Invalid price for {coin_id}: {price}"
            )));
        }

        let holding = portfolio
            .holdings
            .entry(coin_id.to_string())
            .or_insert_with(|| Holding {
                name: name.to_string(),
                quantity: 0.0,
                purchase_price: price,
                current_price: price,
            });
        holding.quantity += quantity;
        holding.purchase_price = price;
        holding.current_price = price;
        Ok(())
    }

    /// Add using the coin's snapshot price.
    pub fn add_from_market(
        &self,
        portfolio: &mut Portfolio,
        coin: &CoinMarket,
        quantity: f64,
    ) -> Result<(), CoreError> {
        let price = coin.current_price.ok_or_else(|| {
            CoreError::ValidationError(format!("No current price for {}", coin.id))
        })?;
        self.add(portfolio, &coin.id, &coin.name, price, quantity)
    }

    /// Delete a holding outright. Returns whether it existed.
    pub fn remove(&self, portfolio: &mut Portfolio, coin_id: &str) -> bool {
        portfolio.holdings.remove(coin_id).is_some()
    }

    /// Copy snapshot prices onto matching holdings.
    /// Holdings whose coin is absent from the snapshot keep their last price.
    pub fn refresh_prices(&self, portfolio: &mut Portfolio, coins: &[CoinMarket]) -> usize {
        let mut updated = 0;
        for (coin_id, holding) in portfolio.holdings.iter_mut() {
            let price = coins
                .iter()
                .find(|c| &c.id == coin_id)
                .and_then(|c| c.current_price);
            if let Some(price) = price {
                holding.current_price = price;
                updated += 1;
            }
        }
        updated
    }

    /// Case-insensitive substring match on name or id; empty matches all.
    pub fn matches_search(coin_id: &str, holding: &Holding, search: &str) -> bool {
        let needle = search.trim().to_lowercase();
        needle.is_empty()
            || holding.name.to_lowercase().contains(&needle)
            || coin_id.to_lowercase().contains(&needle)
    }

    /// Value the holdings that match `search`.
    /// The total covers the visible rows only.
    pub fn valuate(&self, portfolio: &Portfolio, search: &str) -> PortfolioView {
        let rows: Vec<HoldingRow> = portfolio
            .holdings
            .iter()
            .filter(|(id, h)| Self::matches_search(id, h, search))
            .map(|(id, h)| {
                let change_pct = h.change_pct();
                HoldingRow {
                    coin_id: id.clone(),
                    name: h.name.clone(),
                    quantity: h.quantity,
                    purchase_price: h.purchase_price,
                    current_price: h.current_price,
                    value: h.value(),
                    change_pct,
                    gaining: change_pct.map_or(true, |pct| pct >= 0.0),
                }
            })
            .collect();
        let total = rows.iter().map(|r| r.value).sum();
        PortfolioView { rows, total }
    }

    /// Append a point to the history; the oldest falls off past the cap.
    pub fn record_history(&self, history: &mut PortfolioHistory, time: DateTime<Utc>, total: f64) {
        history.push(PortfolioSnapshot { time, total });
    }
}

impl Default for PortfolioService {
    fn default() -> Self {
        Self::new()
    }
}
