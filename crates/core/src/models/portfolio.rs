use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Maximum number of points kept in the portfolio value history.
pub const HISTORY_CAP: usize = 50;

/// A single tracked coin position.
///
/// Field names follow the stored JSON layout (`purchasePrice`, `price`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    /// Display name captured at the time of the last add
    pub name: String,

    /// Accumulated quantity across all adds
    pub quantity: f64,

    /// Snapshot price at the most recent add (not a weighted average)
    pub purchase_price: f64,

    /// Latest known snapshot price
    #[serde(rename = "price")]
    pub current_price: f64,
}

impl Holding {
    /// Current value of the position.
    pub fn value(&self) -> f64 {
        self.quantity * self.current_price
    }

    /// Percent change against the purchase price.
    /// `None` when the purchase price is zero (no meaningful basis).
    pub fn change_pct(&self) -> Option<f64> {
        if self.purchase_price == 0.0 {
            return None;
        }
        Some((self.current_price - self.purchase_price) / self.purchase_price * 100.0)
    }
}

/// Holdings keyed by coin id. Keys are unique by construction.
///
/// Serialized transparently as a JSON object so the stored format is a
/// plain `{coinId: holding}` map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Portfolio {
    pub holdings: BTreeMap<String, Holding>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, coin_id: &str) -> Option<&Holding> {
        self.holdings.get(coin_id)
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}

/// One point of the portfolio value-over-time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub time: DateTime<Utc>,
    pub total: f64,
}

/// Rolling window of portfolio totals, oldest first, capped at `cap` points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<PortfolioSnapshot>", into = "Vec<PortfolioSnapshot>")]
pub struct PortfolioHistory {
    points: VecDeque<PortfolioSnapshot>,
    cap: usize,
}

impl PortfolioHistory {
    pub fn new() -> Self {
        Self::with_cap(HISTORY_CAP)
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(cap),
            cap: cap.max(1),
        }
    }

    /// Append a point, evicting the oldest ones beyond the cap.
    pub fn push(&mut self, snapshot: PortfolioSnapshot) {
        self.points.push_back(snapshot);
        while self.points.len() > self.cap {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn iter(&self) -> impl Iterator<Item = &PortfolioSnapshot> {
        self.points.iter()
    }

    pub fn latest(&self) -> Option<&PortfolioSnapshot> {
        self.points.back()
    }
}

impl Default for PortfolioHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<PortfolioSnapshot>> for PortfolioHistory {
    fn from(points: Vec<PortfolioSnapshot>) -> Self {
        // Stored data may predate the cap; keep only the newest points.
        let mut history = Self::new();
        for point in points {
            history.push(point);
        }
        history
    }
}

impl From<PortfolioHistory> for Vec<PortfolioSnapshot> {
    fn from(history: PortfolioHistory) -> Self {
        history.points.into_iter().collect()
    }
}

/// One rendered row of the portfolio table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingRow {
    pub coin_id: String,
    pub name: String,
    pub quantity: f64,
    pub purchase_price: f64,
    pub current_price: f64,
    pub value: f64,
    /// `None` when there is no purchase price to compare against
    pub change_pct: Option<f64>,
    /// True when the change is zero or positive
    pub gaining: bool,
}

/// The portfolio table plus its search-filtered total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioView {
    pub rows: Vec<HoldingRow>,
    /// Sum of the visible rows only
    pub total: f64,
}

impl PortfolioView {
    pub fn total_label(&self) -> String {
        format!("Total Portfolio Value: ${:.2}", self.total)
    }
}
