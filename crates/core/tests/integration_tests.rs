use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use coin_dashboard_core::errors::CoreError;
use coin_dashboard_core::models::alert::{AlertCrossing, NewAlert, PriceAlert};
use coin_dashboard_core::models::coin::{CoinDirectoryEntry, CoinMarket};
use coin_dashboard_core::models::settings::{DashboardSettings, Theme};
use coin_dashboard_core::models::table::{SortKey, TableBody, Trend};
use coin_dashboard_core::providers::alerts_memory::InMemoryAlertsApi;
use coin_dashboard_core::providers::notifier::RecordingNotifier;
use coin_dashboard_core::providers::traits::{AlertsApi, MarketDataProvider, MarketQuery};
use coin_dashboard_core::storage::file::FileStore;
use coin_dashboard_core::storage::memory::MemoryStore;
use coin_dashboard_core::{CoinDashboard, PollOutcome};

// ═══════════════════════════════════════════════════════════════════
// Mock Market Data (scripted snapshots, no real API calls)
// ═══════════════════════════════════════════════════════════════════

/// Serves the queued snapshot on each `fetch_markets`; the last one
/// repeats. `None` in the queue simulates an upstream failure.
struct ScriptedMarketData {
    snapshots: Mutex<Vec<Option<Vec<CoinMarket>>>>,
}

impl ScriptedMarketData {
    fn new(snapshots: Vec<Option<Vec<CoinMarket>>>) -> Self {
        Self {
            snapshots: Mutex::new(snapshots),
        }
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedMarketData {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn fetch_coin_list(&self) -> Result<Vec<CoinDirectoryEntry>, CoreError> {
        Ok(Vec::new())
    }

    async fn fetch_markets(&self, _query: &MarketQuery) -> Result<Vec<CoinMarket>, CoreError> {
        let mut queue = self.snapshots.lock().unwrap();
        let next = if queue.len() > 1 {
            queue.remove(0)
        } else {
            queue.first().cloned().flatten()
        };
        next.ok_or_else(|| CoreError::Network("upstream unavailable".into()))
    }

    async fn fetch_simple_price(&self, _: &str, _: &str) -> Result<Option<f64>, CoreError> {
        Ok(None)
    }
}

/// Alerts service that is down.
struct DownAlertsApi;

#[async_trait]
impl AlertsApi for DownAlertsApi {
    async fn list_alerts(&self) -> Result<Vec<PriceAlert>, CoreError> {
        Err(CoreError::Network("connection refused".into()))
    }

    async fn create_alert(&self, _alert: &NewAlert) -> Result<PriceAlert, CoreError> {
        Err(CoreError::Network("connection refused".into()))
    }

    async fn delete_alert(&self, _alert_id: &str) -> Result<(), CoreError> {
        Err(CoreError::Network("connection refused".into()))
    }
}

/// In-memory alerts service that fails chosen `list_alerts` calls
/// (1-based) and the first `failing_deletes` deletes.
struct FlakyAlertsApi {
    inner: InMemoryAlertsApi,
    failing_lists: Vec<usize>,
    list_calls: AtomicUsize,
    failing_deletes: AtomicUsize,
}

impl FlakyAlertsApi {
    fn new(alerts: Vec<PriceAlert>, failing_lists: Vec<usize>, failing_deletes: usize) -> Self {
        Self {
            inner: InMemoryAlertsApi::with_alerts(alerts),
            failing_lists,
            list_calls: AtomicUsize::new(0),
            failing_deletes: AtomicUsize::new(failing_deletes),
        }
    }
}

#[async_trait]
impl AlertsApi for FlakyAlertsApi {
    async fn list_alerts(&self) -> Result<Vec<PriceAlert>, CoreError> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_lists.contains(&call) {
            return Err(CoreError::Network("connection reset".into()));
        }
        self.inner.list_alerts().await
    }

    async fn create_alert(&self, alert: &NewAlert) -> Result<PriceAlert, CoreError> {
        self.inner.create_alert(alert).await
    }

    async fn delete_alert(&self, alert_id: &str) -> Result<(), CoreError> {
        let left = self.failing_deletes.load(Ordering::SeqCst);
        if left > 0 {
            self.failing_deletes.store(left - 1, Ordering::SeqCst);
            return Err(CoreError::Network("connection reset".into()));
        }
        self.inner.delete_alert(alert_id).await
    }
}

fn market(id: &str, name: &str, price: f64, market_cap: f64) -> CoinMarket {
    CoinMarket {
        market_cap: Some(market_cap),
        ..CoinMarket::new(id, &id[..3], name, price)
    }
}

fn snapshot(btc: f64, eth: f64) -> Vec<CoinMarket> {
    vec![
        market("bitcoin", "Bitcoin", btc, 1300e9),
        market("ethereum", "Ethereum", eth, 360e9),
        market("dogecoin", "Dogecoin", 0.15, 21e9),
    ]
}

struct Harness {
    dashboard: CoinDashboard,
    alerts: Arc<InMemoryAlertsApi>,
    notifier: Arc<RecordingNotifier>,
}

fn harness(snapshots: Vec<Option<Vec<CoinMarket>>>) -> Harness {
    harness_with(snapshots, DashboardSettings::default(), Vec::new())
}

fn harness_with(
    snapshots: Vec<Option<Vec<CoinMarket>>>,
    settings: DashboardSettings,
    alerts: Vec<PriceAlert>,
) -> Harness {
    let alerts = Arc::new(InMemoryAlertsApi::with_alerts(alerts));
    let notifier = Arc::new(RecordingNotifier::new());
    let dashboard = CoinDashboard::new(
        settings,
        Arc::new(ScriptedMarketData::new(snapshots)),
        alerts.clone(),
        Box::new(MemoryStore::new()),
        notifier.clone(),
    )
    .unwrap();
    Harness {
        dashboard,
        alerts,
        notifier,
    }
}

async fn poll_ok(dashboard: &mut CoinDashboard) -> coin_dashboard_core::DashboardView {
    match dashboard.poll().await {
        PollOutcome::Updated(view) => view,
        PollOutcome::Failed { error, .. } => panic!("poll failed: {error}"),
    }
}

// ═══════════════════════════════════════════════════════════════════
// Polling
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn poll_renders_table_and_portfolio() {
    let mut h = harness(vec![Some(snapshot(67000.0, 3000.0))]);
    let view = poll_ok(&mut h.dashboard).await;

    let ids: Vec<&str> = view.table.body.rows().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["bitcoin", "ethereum", "dogecoin"]);
    assert!(view.table.body.rows().iter().all(|r| r.flash == Trend::Neutral));
    assert_eq!(view.table.sparklines.len(), 3);
    assert_eq!(view.portfolio.view.total_label(), "Total Portfolio Value: $0.00");
    assert_eq!(h.dashboard.state().coins.len(), 3);
    assert!(h.dashboard.state().last_updated.is_some());
}

#[tokio::test]
async fn second_poll_flashes_price_moves() {
    let mut h = harness(vec![
        Some(snapshot(67000.0, 3000.0)),
        Some(snapshot(68000.0, 2900.0)),
    ]);
    poll_ok(&mut h.dashboard).await;
    let view = poll_ok(&mut h.dashboard).await;

    let rows = view.table.body.rows();
    assert_eq!(rows[0].flash, Trend::Up);
    assert_eq!(rows[1].flash, Trend::Down);
    assert_eq!(rows[2].flash, Trend::Neutral);
}

#[tokio::test]
async fn failed_poll_shows_error_row_and_keeps_state() {
    let mut h = harness(vec![Some(snapshot(67000.0, 3000.0)), None]);
    poll_ok(&mut h.dashboard).await;
    h.dashboard.add_to_portfolio("bitcoin", "1").unwrap();

    match h.dashboard.poll().await {
        PollOutcome::Failed { table, error } => {
            assert!(table.body.is_error());
            assert!(matches!(
                table.body,
                TableBody::Error { ref message, colspan: 10 } if message == "⚠️ Error loading data"
            ));
            assert!(error.is_upstream());
        }
        PollOutcome::Updated(_) => panic!("expected failure"),
    }
    assert_eq!(h.dashboard.state().coins.len(), 3);
    assert_eq!(h.dashboard.state().portfolio.len(), 1);
}

// ═══════════════════════════════════════════════════════════════════
// Market table interactions
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn header_click_toggles_direction() {
    let mut h = harness(vec![Some(snapshot(67000.0, 3000.0))]);
    poll_ok(&mut h.dashboard).await;

    let view = h.dashboard.sort_by(SortKey::MarketCap);
    let ids: Vec<&str> = view.body.rows().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["dogecoin", "ethereum", "bitcoin"]);

    let view = h.dashboard.sort_by(SortKey::MarketCap);
    assert_eq!(view.body.rows()[0].id, "bitcoin");

    let view = h.dashboard.sort_by(SortKey::CurrentPrice);
    assert!(view.sort.ascending);
    assert_eq!(view.body.rows()[0].id, "dogecoin");
}

#[tokio::test]
async fn page_navigation_stops_at_edges() {
    let settings = DashboardSettings {
        per_page: 2,
        ..DashboardSettings::default()
    };
    let mut h = harness_with(vec![Some(snapshot(67000.0, 3000.0))], settings, Vec::new());
    poll_ok(&mut h.dashboard).await;

    assert!(h.dashboard.prev_page().is_none());
    let page2 = h.dashboard.next_page().unwrap();
    assert_eq!(page2.page, 2);
    assert_eq!(page2.body.rows().len(), 1);
    assert!(h.dashboard.next_page().is_none());
    assert_eq!(h.dashboard.state().pagination.page, 2);
    assert_eq!(h.dashboard.prev_page().unwrap().page, 1);
}

#[tokio::test]
async fn per_page_change_resets_page_and_ignores_junk() {
    let settings = DashboardSettings {
        per_page: 1,
        ..DashboardSettings::default()
    };
    let mut h = harness_with(vec![Some(snapshot(67000.0, 3000.0))], settings, Vec::new());
    poll_ok(&mut h.dashboard).await;
    h.dashboard.next_page().unwrap();

    assert!(h.dashboard.set_per_page("abc").is_none());
    assert!(h.dashboard.set_per_page("0").is_none());
    assert_eq!(h.dashboard.state().pagination.page, 2);

    let view = h.dashboard.set_per_page("50").unwrap();
    assert_eq!(view.page, 1);
    assert_eq!(view.body.rows().len(), 3);
}

#[tokio::test]
async fn search_filters_and_resets_page() {
    let settings = DashboardSettings {
        per_page: 1,
        ..DashboardSettings::default()
    };
    let mut h = harness_with(vec![Some(snapshot(67000.0, 3000.0))], settings, Vec::new());
    poll_ok(&mut h.dashboard).await;
    h.dashboard.next_page().unwrap();

    let view = h.dashboard.set_search("doge");
    assert_eq!(view.page, 1);
    assert_eq!(view.total_rows, 1);
    assert_eq!(view.body.rows()[0].id, "dogecoin");
}

#[tokio::test]
async fn theme_toggles() {
    let mut h = harness(vec![Some(snapshot(1.0, 1.0))]);
    assert_eq!(h.dashboard.state().theme, Theme::Dark);
    assert_eq!(h.dashboard.toggle_theme(), Theme::Light);
    assert_eq!(h.dashboard.toggle_theme(), Theme::Dark);
}

// ═══════════════════════════════════════════════════════════════════
// Portfolio
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn adding_twice_accumulates_quantity_at_latest_price() {
    let mut h = harness(vec![
        Some(snapshot(100.0, 10.0)),
        Some(snapshot(150.0, 10.0)),
    ]);
    poll_ok(&mut h.dashboard).await;
    h.dashboard.add_to_portfolio("bitcoin", "2").unwrap();
    poll_ok(&mut h.dashboard).await;
    let render = h.dashboard.add_to_portfolio("bitcoin", "3").unwrap();

    let btc = h.dashboard.state().portfolio.get("bitcoin").unwrap();
    assert_eq!(btc.quantity, 5.0);
    assert_eq!(btc.purchase_price, 150.0);
    assert_eq!(render.view.total, 750.0);
}

#[tokio::test]
async fn invalid_quantity_or_unknown_coin_changes_nothing() {
    let mut h = harness(vec![Some(snapshot(100.0, 10.0))]);
    poll_ok(&mut h.dashboard).await;
    assert!(h.dashboard.add_to_portfolio("bitcoin", "-1").is_none());
    assert!(h.dashboard.add_to_portfolio("bitcoin", "lots").is_none());
    assert!(h.dashboard.add_to_portfolio("solana", "1").is_none());
    assert!(h.dashboard.state().portfolio.is_empty());
}

#[tokio::test]
async fn poll_refreshes_holding_prices() {
    let mut h = harness(vec![
        Some(snapshot(100.0, 10.0)),
        Some(snapshot(120.0, 10.0)),
    ]);
    poll_ok(&mut h.dashboard).await;
    h.dashboard.add_to_portfolio("bitcoin", "1").unwrap();
    let view = poll_ok(&mut h.dashboard).await;

    let row = &view.portfolio.view.rows[0];
    assert_eq!(row.current_price, 120.0);
    assert_eq!(row.purchase_price, 100.0);
    assert_eq!(row.change_pct, Some(20.0));
    assert!(row.gaining);
}

#[tokio::test]
async fn remove_deletes_holding() {
    let mut h = harness(vec![Some(snapshot(100.0, 10.0))]);
    poll_ok(&mut h.dashboard).await;
    h.dashboard.add_to_portfolio("bitcoin", "1").unwrap();
    h.dashboard.add_to_portfolio("ethereum", "1").unwrap();

    let render = h.dashboard.remove_from_portfolio("bitcoin");
    assert_eq!(render.view.rows.len(), 1);
    assert_eq!(render.view.total, 10.0);
}

#[tokio::test]
async fn portfolio_search_filters_total() {
    let mut h = harness(vec![Some(snapshot(100.0, 10.0))]);
    poll_ok(&mut h.dashboard).await;
    h.dashboard.add_to_portfolio("bitcoin", "1").unwrap();
    h.dashboard.add_to_portfolio("ethereum", "2").unwrap();

    let render = h.dashboard.set_portfolio_search("ether");
    assert_eq!(render.view.rows.len(), 1);
    assert_eq!(render.view.total_label(), "Total Portfolio Value: $20.00");
}

#[tokio::test]
async fn history_is_capped() {
    let mut h = harness(vec![Some(snapshot(100.0, 10.0))]);
    poll_ok(&mut h.dashboard).await;
    let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    for i in 0..60 {
        h.dashboard.render_portfolio_at(start + Duration::seconds(i));
    }
    let render = h.dashboard.render_portfolio_at(start + Duration::seconds(60));
    assert_eq!(h.dashboard.state().history.len(), 50);
    assert_eq!(render.chart.values.len(), 50);
    assert_eq!(render.chart.labels.last().unwrap(), "00:01:00");
}

#[tokio::test]
async fn portfolio_persists_across_restarts() {
    let tmp = tempfile::tempdir().unwrap();
    let build = |store: FileStore| {
        CoinDashboard::new(
            DashboardSettings::default(),
            Arc::new(ScriptedMarketData::new(vec![Some(snapshot(100.0, 10.0))])),
            Arc::new(InMemoryAlertsApi::new()),
            Box::new(store),
            Arc::new(RecordingNotifier::new()),
        )
        .unwrap()
    };

    let mut first = build(FileStore::open(tmp.path()).unwrap());
    poll_ok(&mut first).await;
    first.add_to_portfolio("ethereum", "4").unwrap();
    drop(first);

    let second = build(FileStore::open(tmp.path()).unwrap());
    let eth = second.state().portfolio.get("ethereum").unwrap();
    assert_eq!(eth.quantity, 4.0);
    assert!(!second.state().history.is_empty());
}

#[tokio::test]
async fn corrupt_stored_portfolio_starts_empty() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("portfolio.json"), "{broken").unwrap();
    let dashboard = CoinDashboard::new(
        DashboardSettings::default(),
        Arc::new(ScriptedMarketData::new(vec![None])),
        Arc::new(InMemoryAlertsApi::new()),
        Box::new(FileStore::open(tmp.path()).unwrap()),
        Arc::new(RecordingNotifier::new()),
    )
    .unwrap();
    assert!(dashboard.state().portfolio.is_empty());
}

// ═══════════════════════════════════════════════════════════════════
// Alerts
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn set_alert_notifies_and_stores() {
    let mut h = harness(vec![Some(snapshot(67000.0, 3000.0))]);
    poll_ok(&mut h.dashboard).await;

    let created = h.dashboard.set_alert("bitcoin", "70000").await.unwrap();
    assert_eq!(created.coin_name, "Bitcoin");
    assert_eq!(h.dashboard.state().alerts.len(), 1);
    assert_eq!(h.alerts.len(), 1);
    assert_eq!(h.notifier.messages(), vec!["🚨 Alert set for Bitcoin at $70000"]);
}

#[tokio::test]
async fn set_alert_rejects_bad_input_silently() {
    let mut h = harness(vec![Some(snapshot(67000.0, 3000.0))]);
    poll_ok(&mut h.dashboard).await;
    assert!(h.dashboard.set_alert("bitcoin", "soon").await.is_none());
    assert!(h.dashboard.set_alert("solana", "100").await.is_none());
    assert!(h.alerts.is_empty());
    assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn alert_fires_once_on_crossing_and_is_deleted() {
    let mut h = harness(vec![
        Some(snapshot(67000.0, 3000.0)),
        Some(snapshot(69000.0, 3000.0)),
        Some(snapshot(71000.0, 3000.0)),
        Some(snapshot(72000.0, 3000.0)),
    ]);
    poll_ok(&mut h.dashboard).await;
    h.dashboard.set_alert("bitcoin", "70000").await.unwrap();
    h.notifier.drain();

    let view = poll_ok(&mut h.dashboard).await;
    assert!(view.triggered.is_empty());

    let view = poll_ok(&mut h.dashboard).await;
    assert_eq!(view.triggered.len(), 1);
    assert_eq!(view.triggered[0].crossing, AlertCrossing::Rose);
    assert_eq!(
        h.notifier.drain(),
        vec!["🚨 Bitcoin price alert! Current: $71000 Target: $70000"]
    );
    assert!(h.alerts.is_empty());
    assert!(h.dashboard.state().alerts.is_empty());

    let view = poll_ok(&mut h.dashboard).await;
    assert!(view.triggered.is_empty());
    assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn alert_created_elsewhere_fires_on_later_crossing() {
    let existing = PriceAlert {
        id: "srv-1".into(),
        coin_id: "ethereum".into(),
        coin_name: "Ethereum".into(),
        target_price: 2950.0,
    };
    let mut h = harness_with(
        vec![Some(snapshot(67000.0, 3000.0)), Some(snapshot(67000.0, 2900.0))],
        DashboardSettings::default(),
        vec![existing],
    );

    let first = poll_ok(&mut h.dashboard).await;
    assert!(first.triggered.is_empty());
    assert_eq!(h.dashboard.state().alerts.len(), 1);

    let second = poll_ok(&mut h.dashboard).await;
    assert_eq!(second.triggered.len(), 1);
    assert_eq!(second.triggered[0].crossing, AlertCrossing::Fell);
    assert!(h.alerts.is_empty());
}

#[tokio::test]
async fn alerts_service_down_leaves_list_empty() {
    let mut dashboard = CoinDashboard::new(
        DashboardSettings::default(),
        Arc::new(ScriptedMarketData::new(vec![Some(snapshot(67000.0, 3000.0))])),
        Arc::new(DownAlertsApi),
        Box::new(MemoryStore::new()),
        Arc::new(RecordingNotifier::new()),
    )
    .unwrap();

    let view = poll_ok(&mut dashboard).await;
    assert!(view.triggered.is_empty());
    assert!(dashboard.state().alerts.is_empty());
    assert!(dashboard.set_alert("bitcoin", "1").await.is_none());
}

fn btc_alert_at_70k() -> PriceAlert {
    PriceAlert {
        id: "srv-btc".into(),
        coin_id: "bitcoin".into(),
        coin_name: "Bitcoin".into(),
        target_price: 70000.0,
    }
}

fn flaky_dashboard(
    snapshots: Vec<Option<Vec<CoinMarket>>>,
    api: Arc<FlakyAlertsApi>,
    notifier: Arc<RecordingNotifier>,
) -> CoinDashboard {
    CoinDashboard::new(
        DashboardSettings::default(),
        Arc::new(ScriptedMarketData::new(snapshots)),
        api,
        Box::new(MemoryStore::new()),
        notifier,
    )
    .unwrap()
}

#[tokio::test]
async fn crossing_during_alerts_outage_fires_on_next_good_cycle() {
    let api = Arc::new(FlakyAlertsApi::new(vec![btc_alert_at_70k()], vec![2], 0));
    let notifier = Arc::new(RecordingNotifier::new());
    let mut dashboard = flaky_dashboard(
        vec![
            Some(snapshot(67000.0, 3000.0)),
            Some(snapshot(71000.0, 3000.0)),
            Some(snapshot(72000.0, 3000.0)),
        ],
        api.clone(),
        notifier.clone(),
    );

    assert!(poll_ok(&mut dashboard).await.triggered.is_empty());

    let outage = poll_ok(&mut dashboard).await;
    assert!(outage.triggered.is_empty());
    assert!(dashboard.state().alerts.is_empty());

    let recovered = poll_ok(&mut dashboard).await;
    assert_eq!(recovered.triggered.len(), 1);
    assert_eq!(recovered.triggered[0].crossing, AlertCrossing::Rose);
    assert_eq!(
        notifier.messages(),
        vec!["🚨 Bitcoin price alert! Current: $72000 Target: $70000"]
    );
    assert!(api.inner.is_empty());
}

#[tokio::test]
async fn failed_delete_after_firing_is_retried() {
    let api = Arc::new(FlakyAlertsApi::new(vec![btc_alert_at_70k()], Vec::new(), 1));
    let notifier = Arc::new(RecordingNotifier::new());
    let mut dashboard = flaky_dashboard(
        vec![
            Some(snapshot(67000.0, 3000.0)),
            Some(snapshot(71000.0, 3000.0)),
            Some(snapshot(69000.0, 3000.0)),
        ],
        api.clone(),
        notifier.clone(),
    );

    poll_ok(&mut dashboard).await;
    let fired = poll_ok(&mut dashboard).await;
    assert_eq!(fired.triggered.len(), 1);
    assert_eq!(api.inner.len(), 1);
    assert!(dashboard.state().alerts.is_empty());
    assert!(dashboard.state().pending_deletes.contains("srv-btc"));

    // Back below the target: the alert must not fire a second time.
    let retried = poll_ok(&mut dashboard).await;
    assert!(retried.triggered.is_empty());
    assert!(api.inner.is_empty());
    assert!(dashboard.state().alerts.is_empty());
    assert!(dashboard.state().pending_deletes.is_empty());
    assert_eq!(notifier.messages().len(), 1);
}

#[tokio::test]
async fn debug_output_is_compact() {
    let h = harness(vec![None]);
    let dbg = format!("{:?}", h.dashboard);
    assert!(dbg.contains("CoinDashboard"));
    assert!(dbg.contains("Scripted"));
}
