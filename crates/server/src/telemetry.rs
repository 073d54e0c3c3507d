use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,coin_dashboard_core=debug,coin_dashboard_server=debug";

/// Install the fmt subscriber. `RUST_LOG` wins; otherwise info everywhere
/// and debug for this workspace's crates.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
