pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::{DateTime, Utc};
use models::{
    alert::{NewAlert, PriceAlert, TriggeredAlert},
    chart::LineChart,
    coin::CoinMarket,
    portfolio::{Portfolio, PortfolioHistory, PortfolioView},
    settings::{DashboardSettings, Theme},
    table::{MarketTableView, Pagination, SortKey, SortState},
};
use providers::traits::{AlertsApi, MarketDataProvider, MarketQuery, Notifier};
use services::{
    alert_service::{AlertService, PendingDeletes, ReferencePrices},
    chart_service::ChartService,
    market_service::{MarketService, PreviousPrices},
    portfolio_service::PortfolioService,
};
use std::sync::Arc;
use storage::{manager::PortfolioRepository, traits::KeyValueStore};

use errors::CoreError;

/// All mutable dashboard state, owned by `CoinDashboard` and only changed
/// through its methods.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    /// Latest market snapshot, replaced on every successful poll
    pub coins: Vec<CoinMarket>,

    /// Last rendered price per coin (flash coloring)
    pub previous_prices: PreviousPrices,

    /// Price per coin at the previous alert evaluation
    pub alert_reference: ReferencePrices,

    /// Fired alerts still waiting to be deleted on the service
    pub pending_deletes: PendingDeletes,

    pub sort: SortState,
    pub pagination: Pagination,

    /// Market table search text
    pub search: String,

    /// Portfolio table search text
    pub portfolio_search: String,

    pub portfolio: Portfolio,
    pub history: PortfolioHistory,
    pub alerts: Vec<PriceAlert>,
    pub theme: Theme,

    /// When the snapshot was last replaced
    pub last_updated: Option<DateTime<Utc>>,
}

/// Portfolio table plus the value-over-time chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioRender {
    pub view: PortfolioView,
    pub chart: LineChart,
}

/// Everything a successful poll cycle re-renders.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub table: MarketTableView,
    pub portfolio: PortfolioRender,
    /// Alerts that fired (and were retired) during this cycle
    pub triggered: Vec<TriggeredAlert>,
}

/// Result of one poll cycle.
#[derive(Debug)]
pub enum PollOutcome {
    Updated(DashboardView),
    /// The snapshot fetch failed; only the table shows the error row and
    /// every other piece of state is left as it was.
    Failed {
        table: MarketTableView,
        error: CoreError,
    },
}

/// Main entry point for the dashboard client.
/// Holds the dashboard state and all services needed to operate on it.
#[must_use]
pub struct CoinDashboard {
    state: DashboardState,
    settings: DashboardSettings,
    market_data: Arc<dyn MarketDataProvider>,
    alerts_api: Arc<dyn AlertsApi>,
    notifier: Arc<dyn Notifier>,
    repository: PortfolioRepository,
    market_service: MarketService,
    portfolio_service: PortfolioService,
    alert_service: AlertService,
    chart_service: ChartService,
}

impl std::fmt::Debug for CoinDashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoinDashboard")
            .field("provider", &self.market_data.name())
            .field("coins", &self.state.coins.len())
            .field("holdings", &self.state.portfolio.len())
            .field("history", &self.state.history.len())
            .field("alerts", &self.state.alerts.len())
            .field("sort", &self.state.sort)
            .field("pagination", &self.state.pagination)
            .finish()
    }
}

impl CoinDashboard {
    /// Build a dashboard, loading the persisted portfolio and history.
    ///
    /// Unreadable stored data is discarded with a warning; a failing store
    /// is an error.
    pub fn new(
        settings: DashboardSettings,
        market_data: Arc<dyn MarketDataProvider>,
        alerts_api: Arc<dyn AlertsApi>,
        store: Box<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, CoreError> {
        let repository = PortfolioRepository::new(store);
        let (portfolio, history) = repository.load_or_default(settings.history_cap)?;
        let state = DashboardState {
            pagination: Pagination::new(settings.per_page),
            portfolio,
            history,
            ..DashboardState::default()
        };

        Ok(Self {
            state,
            settings,
            market_data,
            alerts_api,
            notifier,
            repository,
            market_service: MarketService::new(),
            portfolio_service: PortfolioService::new(),
            alert_service: AlertService::new(),
            chart_service: ChartService::new(),
        })
    }

    #[must_use]
    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    #[must_use]
    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    #[must_use]
    pub fn chart_service(&self) -> &ChartService {
        &self.chart_service
    }

    fn market_query(&self) -> MarketQuery {
        MarketQuery {
            vs_currency: self.settings.vs_currency.clone(),
            per_page: self.settings.markets_per_fetch,
            page: 1,
        }
    }

    // ── Polling ─────────────────────────────────────────────────────

    /// One poll cycle: fetch the snapshot, refresh alerts and holding
    /// prices, fire alerts, then render the table and the portfolio.
    ///
    /// Alerts are only evaluated when the list was loaded, so a crossing
    /// during an alerts outage still fires on the next good cycle.
    pub async fn poll(&mut self) -> PollOutcome {
        let coins = match self.market_data.fetch_markets(&self.market_query()).await {
            Ok(coins) => coins,
            Err(error) => {
                tracing::error!("Error fetching data: {error}");
                let table = self
                    .market_service
                    .error_table(self.state.sort, self.state.pagination);
                return PollOutcome::Failed { table, error };
            }
        };

        self.market_service
            .seed_previous_prices(&mut self.state.previous_prices, &coins);
        self.state.coins = coins;
        self.state.last_updated = Some(Utc::now());

        let alerts_loaded = self.refresh_alerts().await;
        self.portfolio_service
            .refresh_prices(&mut self.state.portfolio, &self.state.coins);
        let triggered = if alerts_loaded {
            self.check_alerts().await
        } else {
            Vec::new()
        };

        let table = self.render_table();
        let portfolio = self.render_portfolio();

        PollOutcome::Updated(DashboardView {
            table,
            portfolio,
            triggered,
        })
    }

    // ── Market Table ────────────────────────────────────────────────

    /// Render the current page of the market table.
    /// Updates the flash-color reference for every visible row.
    pub fn render_table(&mut self) -> MarketTableView {
        self.market_service.render_table(
            &self.state.coins,
            &self.state.search,
            self.state.sort,
            self.state.pagination,
            &mut self.state.previous_prices,
        )
    }

    /// Column header click. The page is kept.
    pub fn sort_by(&mut self, key: SortKey) -> MarketTableView {
        self.state.sort.toggle(key);
        self.render_table()
    }

    /// `None` when already on the last page.
    pub fn next_page(&mut self) -> Option<MarketTableView> {
        let total = self
            .market_service
            .row_count(&self.state.coins, &self.state.search);
        if self.state.pagination.next(total) {
            Some(self.render_table())
        } else {
            None
        }
    }

    /// `None` when already on page 1.
    pub fn prev_page(&mut self) -> Option<MarketTableView> {
        if self.state.pagination.prev() {
            Some(self.render_table())
        } else {
            None
        }
    }

    /// Page-size selector. Invalid input is ignored (`None`).
    pub fn set_per_page(&mut self, input: &str) -> Option<MarketTableView> {
        match input.trim().parse::<usize>() {
            Ok(per_page) if per_page > 0 => {
                self.state.pagination.set_per_page(per_page);
                Some(self.render_table())
            }
            _ => {
                tracing::debug!("Ignoring page size {input:?}");
                None
            }
        }
    }

    /// Market search box. Always goes back to page 1.
    pub fn set_search(&mut self, search: &str) -> MarketTableView {
        self.state.search = search.to_string();
        self.state.pagination.reset();
        self.render_table()
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.state.theme = self.state.theme.toggled();
        self.state.theme
    }

    // ── Portfolio ───────────────────────────────────────────────────

    /// Render the portfolio table, append a history point and redraw the
    /// value chart.
    pub fn render_portfolio(&mut self) -> PortfolioRender {
        self.render_portfolio_at(Utc::now())
    }

    /// `render_portfolio` with an explicit timestamp for the history point.
    pub fn render_portfolio_at(&mut self, time: DateTime<Utc>) -> PortfolioRender {
        let view = self
            .portfolio_service
            .valuate(&self.state.portfolio, &self.state.portfolio_search);
        self.portfolio_service
            .record_history(&mut self.state.history, time, view.total);
        if let Err(e) = self.repository.save_history(&self.state.history) {
            tracing::error!("Failed to save portfolio history: {e}");
        }
        let chart = self.chart_service.portfolio_chart(&self.state.history);
        PortfolioRender { view, chart }
    }

    /// Portfolio search box.
    pub fn set_portfolio_search(&mut self, search: &str) -> PortfolioRender {
        self.state.portfolio_search = search.to_string();
        self.render_portfolio()
    }

    /// "Add to portfolio" on a market row.
    ///
    /// Returns `None` (and changes nothing) when the quantity is not a
    /// positive number or the coin is not in the current snapshot.
    pub fn add_to_portfolio(
        &mut self,
        coin_id: &str,
        quantity_input: &str,
    ) -> Option<PortfolioRender> {
        let quantity = match PortfolioService::parse_quantity(quantity_input) {
            Ok(q) => q,
            Err(e) => {
                tracing::debug!("Add to portfolio cancelled: {e}");
                return None;
            }
        };
        let coin = self.state.coins.iter().find(|c| c.id == coin_id)?;
        if let Err(e) = self
            .portfolio_service
            .add_from_market(&mut self.state.portfolio, coin, quantity)
        {
            tracing::debug!("Add to portfolio cancelled: {e}");
            return None;
        }
        self.save_portfolio();
        Some(self.render_portfolio())
    }

    /// "Remove" on a portfolio row. No confirmation.
    pub fn remove_from_portfolio(&mut self, coin_id: &str) -> PortfolioRender {
        self.portfolio_service.remove(&mut self.state.portfolio, coin_id);
        self.save_portfolio();
        self.render_portfolio()
    }

    fn save_portfolio(&self) {
        if let Err(e) = self.repository.save_portfolio(&self.state.portfolio) {
            tracing::error!("Failed to save portfolio: {e}");
        }
    }

    // ── Alerts ──────────────────────────────────────────────────────

    /// Reload the alert list and retry outstanding deletes. A failure
    /// leaves the list empty and returns `false`.
    pub async fn refresh_alerts(&mut self) -> bool {
        let api = self.alerts_api.as_ref();
        if let Err(e) = self.alert_service.refresh(api, &mut self.state.alerts).await {
            tracing::error!("Error fetching alerts: {e}");
            return false;
        }
        self.alert_service
            .retry_deletes(api, &mut self.state.alerts, &mut self.state.pending_deletes)
            .await;
        true
    }

    /// "Set alert" on a market row.
    ///
    /// Returns `None` when the price input is not a number, the coin is not
    /// in the snapshot, or the alerts service rejects the request.
    pub async fn set_alert(&mut self, coin_id: &str, price_input: &str) -> Option<PriceAlert> {
        let target = match AlertService::parse_target(price_input) {
            Ok(t) => t,
            Err(e) => {
                tracing::debug!("Set alert cancelled: {e}");
                return None;
            }
        };
        let coin_name = self
            .state
            .coins
            .iter()
            .find(|c| c.id == coin_id)?
            .name
            .clone();

        let new_alert = NewAlert::new(coin_id, coin_name.clone(), target);
        match self
            .alert_service
            .create(self.alerts_api.as_ref(), &mut self.state.alerts, new_alert)
            .await
        {
            Ok(created) => {
                self.notifier
                    .notify(&format!("🚨 Alert set for {coin_name} at ${target}"));
                Some(created)
            }
            Err(e) => {
                tracing::error!("Error creating alert: {e}");
                None
            }
        }
    }

    /// Evaluate every alert against the snapshot; notify and delete the
    /// ones that fired. A fired alert whose delete fails is dropped locally
    /// and its delete retried on the next alerts refresh.
    pub async fn check_alerts(&mut self) -> Vec<TriggeredAlert> {
        let triggered = self.alert_service.evaluate(
            &self.state.alerts,
            &self.state.coins,
            &mut self.state.alert_reference,
        );

        for hit in &triggered {
            tracing::info!(
                "Alert {} fired: {} {} {} (now {})",
                hit.alert.id,
                hit.coin_name,
                hit.crossing,
                hit.alert.target_price,
                hit.current_price
            );
            self.notifier.notify(&hit.message());
            if let Err(e) = self
                .alert_service
                .delete(self.alerts_api.as_ref(), &mut self.state.alerts, &hit.alert.id)
                .await
            {
                tracing::error!("Error deleting alert: {e}");
                self.state.alerts.retain(|a| a.id != hit.alert.id);
                self.state.pending_deletes.insert(hit.alert.id.clone());
            }
        }

        triggered
    }
}
