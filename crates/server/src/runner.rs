//! Headless dashboard: polls on a timer and takes interactions as text
//! commands on stdin. Timer ticks and commands are handled on one task, so
//! dashboard state is only ever touched by one operation at a time.

use std::fmt::Write as _;
use std::sync::Arc;

use coin_dashboard_core::errors::CoreError;
use coin_dashboard_core::models::table::{MarketTableView, SortKey, SparklineJob, TableBody, Trend};
use coin_dashboard_core::providers::alerts_http::HttpAlertsApi;
use coin_dashboard_core::providers::alerts_memory::InMemoryAlertsApi;
use coin_dashboard_core::providers::coingecko::CoinGeckoProvider;
use coin_dashboard_core::providers::notifier::LogNotifier;
use coin_dashboard_core::providers::traits::AlertsApi;
use coin_dashboard_core::services::chart_service::ChartService;
use coin_dashboard_core::storage::file::FileStore;
use coin_dashboard_core::{CoinDashboard, PollOutcome, PortfolioRender};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use crate::config::RunnerConfig;

const SPARKLINE_WIDTH: usize = 24;

/// One line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Refresh,
    Sort(SortKey),
    Next,
    Prev,
    PerPage(String),
    Search(String),
    PortfolioSearch(String),
    Add { coin_id: String, quantity: String },
    Remove(String),
    Alert { coin_id: String, price: String },
    Theme,
    Help,
    Quit,
}

impl Command {
    /// Parse a command line. Unknown or incomplete commands yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let verb = parts.next()?.to_lowercase();
        let rest: Vec<&str> = parts.collect();
        let arg = |i: usize| rest.get(i).map(|s| (*s).to_string());

        let cmd = match verb.as_str() {
            "refresh" | "r" => Command::Refresh,
            "sort" => Command::Sort(arg(0)?.parse().ok()?),
            "next" | "n" => Command::Next,
            "prev" | "p" => Command::Prev,
            "per-page" => Command::PerPage(arg(0)?),
            "search" => Command::Search(rest.join(" ")),
            "psearch" => Command::PortfolioSearch(rest.join(" ")),
            "add" => Command::Add {
                coin_id: arg(0)?,
                quantity: arg(1)?,
            },
            "remove" | "rm" => Command::Remove(arg(0)?),
            "alert" => Command::Alert {
                coin_id: arg(0)?,
                price: arg(1)?,
            },
            "theme" => Command::Theme,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => return None,
        };
        Some(cmd)
    }
}

const HELP: &str = "commands: refresh | sort <field> | next | prev | per-page <n> | \
                    search <text> | psearch <text> | add <coin-id> <qty> | \
                    remove <coin-id> | alert <coin-id> <price> | theme | quit";

fn fmt_money(value: Option<f64>) -> String {
    match value {
        Some(v) if v.abs() >= 1.0 => format!("${v:.2}"),
        Some(v) => format!("${v:.6}"),
        None => "-".to_string(),
    }
}

fn fmt_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}%"))
}

/// Plain-text rendering of the market table.
pub fn format_table(view: &MarketTableView) -> String {
    let mut out = String::new();
    match &view.body {
        TableBody::Error { message, .. } => {
            let _ = writeln!(out, "{message}");
        }
        TableBody::Rows(rows) => {
            let _ = writeln!(
                out,
                "{:>4} {:<24} {:>14} {:>8} {:>8} {:>8} {:>18}",
                "#", "Coin", "Price", "1h", "24h", "7d", "Market Cap"
            );
            for row in rows {
                let flash = match row.flash {
                    Trend::Up => "▲",
                    Trend::Down => "▼",
                    Trend::Neutral => " ",
                };
                let _ = writeln!(
                    out,
                    "{:>4} {:<24} {:>13}{} {:>8} {:>8} {:>8} {:>18}",
                    row.rank,
                    format!("{} ({})", row.name, row.symbol),
                    fmt_money(row.current_price),
                    flash,
                    fmt_pct(row.change_1h),
                    fmt_pct(row.change_24h),
                    fmt_pct(row.change_7d),
                    fmt_money(row.market_cap),
                );
            }
        }
    }
    let _ = write!(
        out,
        "{} of {} | sorted by {} {}",
        view.page_info(),
        view.page_count.max(1),
        view.sort.key,
        if view.sort.ascending { "asc" } else { "desc" }
    );
    out
}

/// Plain-text rendering of the portfolio table and total.
pub fn format_portfolio(render: &PortfolioRender) -> String {
    let mut out = String::new();
    for row in &render.view.rows {
        let _ = writeln!(
            out,
            "{:<20} qty {:<12} bought {:>14} now {:>14} value {:>14} {}",
            row.name,
            row.quantity,
            fmt_money(Some(row.purchase_price)),
            fmt_money(Some(row.current_price)),
            fmt_money(Some(row.value)),
            fmt_pct(row.change_pct),
        );
    }
    let _ = write!(out, "{}", render.view.total_label());
    out
}

fn draw_sparklines(chart: &ChartService, jobs: &[SparklineJob]) {
    for job in jobs {
        tracing::debug!(
            "{:<16} {} ({})",
            job.coin_id,
            chart.text_sparkline(&job.chart.values, SPARKLINE_WIDTH),
            job.chart.border_color
        );
    }
}

/// Wire the dashboard to CoinGecko, the configured alerts service and a
/// file store under `data_dir`.
pub fn build_dashboard(config: &RunnerConfig) -> Result<CoinDashboard, CoreError> {
    let settings = config.settings.clone();

    let mut provider = CoinGeckoProvider::with_base_url(settings.market_data_url.clone());
    if let Some(key) = &settings.api_key {
        provider = provider.with_api_key(key.clone());
    }

    let alerts_api: Arc<dyn AlertsApi> = match &config.alerts_api_base {
        Some(base) => Arc::new(HttpAlertsApi::new(base.clone())),
        None => {
            tracing::info!("ALERTS_API_BASE not set, keeping alerts in memory");
            Arc::new(InMemoryAlertsApi::new())
        }
    };

    let store = FileStore::open(&config.data_dir)?;

    CoinDashboard::new(
        settings,
        Arc::new(provider),
        alerts_api,
        Box::new(store),
        Arc::new(LogNotifier),
    )
}

async fn poll_and_print(dashboard: &mut CoinDashboard) {
    match dashboard.poll().await {
        PollOutcome::Updated(view) => {
            println!("{}", format_table(&view.table));
            println!("{}", format_portfolio(&view.portfolio));
            tokio::time::sleep(dashboard.settings().sparkline_delay()).await;
            draw_sparklines(dashboard.chart_service(), &view.table.sparklines);
        }
        PollOutcome::Failed { table, .. } => {
            println!("{}", format_table(&table));
        }
    }
}

/// Apply one command. Returns `false` when the runner should stop.
pub async fn handle_command(dashboard: &mut CoinDashboard, cmd: Command) -> bool {
    match cmd {
        Command::Refresh => poll_and_print(dashboard).await,
        Command::Sort(key) => println!("{}", format_table(&dashboard.sort_by(key))),
        Command::Next => match dashboard.next_page() {
            Some(view) => println!("{}", format_table(&view)),
            None => println!("Already on the last page"),
        },
        Command::Prev => match dashboard.prev_page() {
            Some(view) => println!("{}", format_table(&view)),
            None => println!("Already on the first page"),
        },
        Command::PerPage(n) => {
            if let Some(view) = dashboard.set_per_page(&n) {
                println!("{}", format_table(&view));
            }
        }
        Command::Search(text) => println!("{}", format_table(&dashboard.set_search(&text))),
        Command::PortfolioSearch(text) => {
            println!("{}", format_portfolio(&dashboard.set_portfolio_search(&text)));
        }
        Command::Add { coin_id, quantity } => {
            if let Some(render) = dashboard.add_to_portfolio(&coin_id, &quantity) {
                println!("{}", format_portfolio(&render));
            }
        }
        Command::Remove(coin_id) => {
            println!("{}", format_portfolio(&dashboard.remove_from_portfolio(&coin_id)));
        }
        Command::Alert { coin_id, price } => {
            dashboard.set_alert(&coin_id, &price).await;
        }
        Command::Theme => {
            let theme = dashboard.toggle_theme();
            println!("{} {theme:?}", theme.icon());
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => return false,
    }
    true
}

/// Poll immediately and then every poll interval, while serving stdin
/// commands, until `quit`, end of input or Ctrl-C.
pub async fn run(config: RunnerConfig) -> Result<(), CoreError> {
    let mut dashboard = build_dashboard(&config)?;
    tracing::info!("Dashboard started: {dashboard:?}");

    let mut interval = tokio::time::interval(config.settings.poll_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = interval.tick() => poll_and_print(&mut dashboard).await,
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match Command::parse(&line) {
                        Some(cmd) => {
                            if !handle_command(&mut dashboard, cmd).await {
                                break;
                            }
                        }
                        None => println!("{HELP}"),
                    }
                }
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::warn!("stdin closed: {e}");
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    tracing::info!("Dashboard stopped");
    Ok(())
}
