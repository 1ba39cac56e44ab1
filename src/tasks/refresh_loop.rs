//! Per-second refresh loop for the running work session

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::state::AppState;

/// Keep the persisted remaining time fresh until the session stops being active
pub async fn refresh_loop_task(state: Arc<AppState>) {
    debug!("Starting refresh loop");

    let mut interval = interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;

        if !state.refresh_tick() {
            info!("Session no longer active, refresh loop stopped");
            break;
        }
    }
}
