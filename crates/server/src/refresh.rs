use std::sync::Arc;
use std::time::Duration;

use coin_dashboard_core::services::directory_service::DirectoryService;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Refresh the coin directory now and then every `period`, in the
/// background. Failures are logged and the previous directory is kept.
pub fn spawn_directory_refresh(
    directory: Arc<DirectoryService>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            // First tick completes immediately: the startup refresh.
            interval.tick().await;
            directory.refresh_logged().await;
        }
    })
}
