use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::coin::CoinMarket;
use crate::models::table::{
    MarketRow, MarketTableView, Pagination, SortState, SparklineJob, TableBody, Trend,
};
use crate::services::chart_service::ChartService;

/// Last rendered price per coin id, used for flash coloring.
pub type PreviousPrices = HashMap<String, f64>;

/// Sorts, filters and paginates the market snapshot into table rows.
///
/// Pure logic over borrowed state, no I/O.
pub struct MarketService {
    chart_service: ChartService,
}

impl MarketService {
    pub fn new() -> Self {
        Self {
            chart_service: ChartService::new(),
        }
    }

    /// Record a first price for every coin not seen before, so its first
    /// render shows no flash color. Known ids are left untouched.
    pub fn seed_previous_prices(&self, previous: &mut PreviousPrices, coins: &[CoinMarket]) {
        for coin in coins {
            if let Some(price) = coin.current_price {
                previous.entry(coin.id.clone()).or_insert(price);
            }
        }
    }

    /// Stable sort by the selected key. Missing values count as zero.
    pub fn sort(&self, coins: &mut [&CoinMarket], sort: SortState) {
        coins.sort_by(|a, b| {
            let (x, y) = (sort.key.value(a), sort.key.value(b));
            let ord = if sort.ascending {
                x.partial_cmp(&y)
            } else {
                y.partial_cmp(&x)
            };
            ord.unwrap_or(Ordering::Equal)
        });
    }

    /// Coins matching `search`, sorted. The snapshot itself is not reordered.
    pub fn filter_and_sort<'a>(
        &self,
        coins: &'a [CoinMarket],
        search: &str,
        sort: SortState,
    ) -> Vec<&'a CoinMarket> {
        let mut rows: Vec<&CoinMarket> =
            coins.iter().filter(|c| c.matches_search(search)).collect();
        self.sort(&mut rows, sort);
        rows
    }

    /// Number of rows the table currently has (after the search filter).
    pub fn row_count(&self, coins: &[CoinMarket], search: &str) -> usize {
        coins.iter().filter(|c| c.matches_search(search)).count()
    }

    /// Build one table row, comparing against the previously rendered price.
    pub fn build_row(&self, coin: &CoinMarket, rank: usize, previous: Option<f64>) -> MarketRow {
        let change_1h = coin.price_change_percentage_1h_in_currency;
        let change_24h = coin.price_change_percentage_24h;
        let change_7d = coin.price_change_percentage_7d_in_currency;
        MarketRow {
            rank,
            id: coin.id.clone(),
            name: coin.name.clone(),
            symbol: coin.symbol.to_uppercase(),
            image: coin.image.clone(),
            current_price: coin.current_price,
            flash: Trend::between(previous, coin.current_price),
            change_1h,
            change_1h_trend: Trend::of_change(change_1h),
            change_24h,
            change_24h_trend: Trend::of_change(change_24h),
            change_7d,
            change_7d_trend: Trend::of_change(change_7d),
            market_cap: coin.market_cap,
            total_volume: coin.total_volume,
            circulating_supply: coin.circulating_supply,
        }
    }

    /// Render the current page.
    ///
    /// Every visible row's price is written back to `previous` after it is
    /// compared, so the flash only ever reflects the last render.
    pub fn render_table(
        &self,
        coins: &[CoinMarket],
        search: &str,
        sort: SortState,
        pagination: Pagination,
        previous: &mut PreviousPrices,
    ) -> MarketTableView {
        let sorted = self.filter_and_sort(coins, search, sort);
        let total = sorted.len();
        let range = pagination.range(total);
        let start = range.start;

        let mut rows = Vec::with_capacity(range.len());
        let mut sparklines = Vec::with_capacity(range.len());

        for (i, coin) in sorted[range].iter().enumerate() {
            let row = self.build_row(coin, start + i + 1, previous.get(&coin.id).copied());
            if let Some(price) = coin.current_price {
                previous.insert(coin.id.clone(), price);
            }
            rows.push(row);
            sparklines.push(SparklineJob {
                canvas_id: format!("chart-{}", coin.id),
                coin_id: coin.id.clone(),
                chart: self.chart_service.sparkline(coin.sparkline_prices()),
            });
        }

        MarketTableView {
            body: TableBody::Rows(rows),
            sparklines,
            page: pagination.page,
            per_page: pagination.per_page,
            page_count: pagination.page_count(total),
            total_rows: total,
            has_prev: pagination.has_prev(),
            has_next: pagination.has_next(total),
            sort,
        }
    }

    /// The table as shown after a failed snapshot fetch.
    pub fn error_table(&self, sort: SortState, pagination: Pagination) -> MarketTableView {
        MarketTableView {
            body: TableBody::load_error(),
            sparklines: Vec::new(),
            page: pagination.page,
            per_page: pagination.per_page,
            page_count: 0,
            total_rows: 0,
            has_prev: pagination.has_prev(),
            has_next: false,
            sort,
        }
    }
}

impl Default for MarketService {
    fn default() -> Self {
        Self::new()
    }
}
