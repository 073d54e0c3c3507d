use std::sync::Arc;

use coin_dashboard_core::providers::coingecko::CoinGeckoProvider;
use coin_dashboard_core::services::directory_service::DirectoryService;
use coin_dashboard_server::config::ServerConfig;
use coin_dashboard_server::refresh::spawn_directory_refresh;
use coin_dashboard_server::routes::{build_router, AppState};
use coin_dashboard_server::telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    telemetry::init();
    let config = ServerConfig::from_env();
    tracing::debug!("Server config: {config:?}");

    let mut provider = CoinGeckoProvider::with_base_url(config.market_data_url.clone());
    if let Some(key) = &config.api_key {
        provider = provider.with_api_key(key.clone());
    }
    let directory = Arc::new(DirectoryService::new(Arc::new(provider)));

    spawn_directory_refresh(directory.clone(), config.refresh_interval);

    let app = build_router(AppState { directory }, &config.public_dir);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!("Server running on port {}", config.port);
    axum::serve(listener, app).await
}
