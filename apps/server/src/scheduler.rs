//! Background scheduler for the periodic batch billing sync.

use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

use crate::main_lib::AppState;

/// Initial delay before the first run, so the server is fully up.
const INITIAL_DELAY_SECS: u64 = 60;

/// Starts the periodic batch sync over every configured organization.
pub fn start_billing_sync_scheduler(state: Arc<AppState>, period: Duration) {
    tokio::spawn(async move {
        info!("Billing sync scheduler started ({}s interval)", period.as_secs());

        tokio::time::sleep(Duration::from_secs(INITIAL_DELAY_SECS)).await;

        // First tick is immediate; a slow run skips ticks rather than bursting
        let mut sync_interval = interval(period);
        sync_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            sync_interval.tick().await;
            run_scheduled_sync(&state).await;
        }
    });
}

async fn run_scheduled_sync(state: &AppState) {
    info!("Running scheduled billing sync...");
    match state.orchestrator.sync_all().await {
        Ok(summary) => info!(
            "Scheduled billing sync completed: {} organizations ({} failed), {} documents, {} matched, {} not matched",
            summary.orgs_processed,
            summary.orgs_failed,
            summary.total,
            summary.matched,
            summary.not_matched
        ),
        Err(e) => warn!("Scheduled billing sync failed: {}", e),
    }
}
