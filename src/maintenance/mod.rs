use tokio::time::sleep;
use tracing::info;

use crate::web::AppState;

/// Periodically drops workspaces whose owners have gone idle.
pub fn spawn(state: AppState) {
    tokio::spawn(async move {
        let interval = state.config().workspaces.sweep_interval;
        loop {
            sleep(interval).await;
            let removed = state.workspaces().sweep_idle().await;
            if removed > 0 {
                let remaining = state.workspaces().active_count().await;
                info!(removed, remaining, "idle workspaces swept");
            }
        }
    });
}
