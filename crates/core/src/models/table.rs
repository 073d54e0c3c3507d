use serde::{Deserialize, Serialize};

use super::chart::LineChart;
use super::coin::CoinMarket;
use crate::errors::CoreError;

/// Number of columns in the market table (used by the error placeholder).
pub const MARKET_TABLE_COLUMNS: usize = 10;

/// Text shown in place of the market rows when the snapshot fetch fails.
pub const LOAD_ERROR_TEXT: &str = "⚠️ Error loading data";

/// Numeric column the market table can be sorted by.
///
/// The string forms are the upstream field names, which is also what the
/// column headers carry as their sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKey {
    MarketCapRank,
    CurrentPrice,
    Change1h,
    Change24h,
    Change7d,
    MarketCap,
    TotalVolume,
    CirculatingSupply,
}

impl SortKey {
    pub const ALL: [SortKey; 8] = [
        SortKey::MarketCapRank,
        SortKey::CurrentPrice,
        SortKey::Change1h,
        SortKey::Change24h,
        SortKey::Change7d,
        SortKey::MarketCap,
        SortKey::TotalVolume,
        SortKey::CirculatingSupply,
    ];

    pub fn field_name(self) -> &'static str {
        match self {
            SortKey::MarketCapRank => "market_cap_rank",
            SortKey::CurrentPrice => "current_price",
            SortKey::Change1h => "price_change_percentage_1h_in_currency",
            SortKey::Change24h => "price_change_percentage_24h",
            SortKey::Change7d => "price_change_percentage_7d_in_currency",
            SortKey::MarketCap => "market_cap",
            SortKey::TotalVolume => "total_volume",
            SortKey::CirculatingSupply => "circulating_supply",
        }
    }

    /// Value used for comparison. Missing values compare as zero.
    pub fn value(self, coin: &CoinMarket) -> f64 {
        let field = match self {
            SortKey::MarketCapRank => coin.market_cap_rank,
            SortKey::CurrentPrice => coin.current_price,
            SortKey::Change1h => coin.price_change_percentage_1h_in_currency,
            SortKey::Change24h => coin.price_change_percentage_24h,
            SortKey::Change7d => coin.price_change_percentage_7d_in_currency,
            SortKey::MarketCap => coin.market_cap,
            SortKey::TotalVolume => coin.total_volume,
            SortKey::CirculatingSupply => coin.circulating_supply,
        };
        field.unwrap_or(0.0)
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

impl std::str::FromStr for SortKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|k| k.field_name() == s.trim())
            .ok_or_else(|| CoreError::ValidationError(format!("Unknown sort key: {s}")))
    }
}

/// Active sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub ascending: bool,
}

impl SortState {
    /// Header click: the active column flips direction, a new column
    /// starts ascending.
    pub fn toggle(&mut self, key: SortKey) {
        if self.key == key {
            self.ascending = !self.ascending;
        } else {
            *self = SortState {
                key,
                ascending: true,
            };
        }
    }
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: SortKey::MarketCap,
            ascending: false,
        }
    }
}

/// Current page (1-based) and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    pub const DEFAULT_PER_PAGE: usize = 20;

    pub fn new(per_page: usize) -> Self {
        Self {
            page: 1,
            per_page: per_page.max(1),
        }
    }

    /// Index of the first row on the current page.
    pub fn start(&self) -> usize {
        (self.page - 1) * self.per_page
    }

    /// Row range of the current page, clamped to `total`.
    pub fn range(&self, total: usize) -> std::ops::Range<usize> {
        let start = self.start().min(total);
        let end = (start + self.per_page).min(total);
        start..end
    }

    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.per_page)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self, total: usize) -> bool {
        self.page * self.per_page < total
    }

    /// Move back one page. No-op (returns false) on page 1.
    pub fn prev(&mut self) -> bool {
        if self.has_prev() {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Move forward one page. No-op (returns false) when no rows remain.
    pub fn next(&mut self, total: usize) -> bool {
        if self.has_next(total) {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Change the page size and go back to the first page.
    pub fn set_per_page(&mut self, per_page: usize) {
        self.per_page = per_page.max(1);
        self.page = 1;
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PER_PAGE)
    }
}

/// Direction coloring for prices and percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

impl Trend {
    /// Flash color: compares a price against the previously rendered one.
    pub fn between(previous: Option<f64>, current: Option<f64>) -> Self {
        match (previous, current) {
            (Some(prev), Some(cur)) if cur > prev => Trend::Up,
            (Some(prev), Some(cur)) if cur < prev => Trend::Down,
            _ => Trend::Neutral,
        }
    }

    /// Sign coloring: zero and above is up.
    pub fn of_change(change: Option<f64>) -> Self {
        match change {
            Some(c) if c >= 0.0 => Trend::Up,
            Some(_) => Trend::Down,
            None => Trend::Neutral,
        }
    }

    pub fn css_color(self) -> &'static str {
        match self {
            Trend::Up => "lightgreen",
            Trend::Down => "red",
            Trend::Neutral => "",
        }
    }
}

/// One rendered row of the market table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketRow {
    /// 1-based position in the sorted, filtered list
    pub rank: usize,
    pub id: String,
    pub name: String,
    /// Uppercased ticker
    pub symbol: String,
    pub image: Option<String>,
    pub current_price: Option<f64>,
    /// Movement since the previous render of this coin
    pub flash: Trend,
    pub change_1h: Option<f64>,
    pub change_1h_trend: Trend,
    pub change_24h: Option<f64>,
    pub change_24h_trend: Trend,
    pub change_7d: Option<f64>,
    pub change_7d_trend: Trend,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>,
    pub circulating_supply: Option<f64>,
}

/// A sparkline to be drawn after the table itself has been rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SparklineJob {
    /// Canvas id the chart belongs to (`chart-{coin id}`)
    pub canvas_id: String,
    pub coin_id: String,
    pub chart: LineChart,
}

/// Body of the market table: rows, or the single error placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TableBody {
    Rows(Vec<MarketRow>),
    Error { message: String, colspan: usize },
}

impl TableBody {
    pub fn load_error() -> Self {
        TableBody::Error {
            message: LOAD_ERROR_TEXT.to_string(),
            colspan: MARKET_TABLE_COLUMNS,
        }
    }

    pub fn rows(&self) -> &[MarketRow] {
        match self {
            TableBody::Rows(rows) => rows,
            TableBody::Error { .. } => &[],
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TableBody::Error { .. })
    }
}

/// Everything needed to paint the market table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketTableView {
    pub body: TableBody,
    /// Deferred sparkline charts for the visible rows
    pub sparklines: Vec<SparklineJob>,
    pub page: usize,
    pub per_page: usize,
    pub page_count: usize,
    pub total_rows: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub sort: SortState,
}

impl MarketTableView {
    pub fn page_info(&self) -> String {
        format!("Page {}", self.page)
    }
}
