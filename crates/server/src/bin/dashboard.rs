use coin_dashboard_server::config::RunnerConfig;
use coin_dashboard_server::{runner, telemetry};

#[tokio::main]
async fn main() {
    telemetry::init();
    let config = RunnerConfig::from_env();

    if let Err(e) = runner::run(config).await {
        tracing::error!("Dashboard failed to start: {e}");
        std::process::exit(1);
    }
}
