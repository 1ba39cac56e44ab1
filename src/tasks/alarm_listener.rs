//! Alarm listener background task

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{services::alarms::FiredAlarm, state::AppState};

/// Dispatch fired alarms to the controller until the scheduler goes away
pub async fn alarm_listener_task(state: Arc<AppState>, mut fired_rx: mpsc::UnboundedReceiver<FiredAlarm>) {
    info!("Starting alarm listener task");

    while let Some(alarm) = fired_rx.recv().await {
        debug!("Alarm listener received '{}' (armed for {})", alarm.name, alarm.fire_at);
        state.handle_alarm(&alarm).await;
    }

    info!("Alarm channel closed, alarm listener stopped");
}
