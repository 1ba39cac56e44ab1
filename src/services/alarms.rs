//! Durable one-shot alarms
//!
//! Alarms are the backstop for the per-second refresh loop: their fire time
//! is persisted so that a pending alarm still fires after the daemon was
//! stopped or the machine slept through it.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::{sync::mpsc, task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

use crate::{
    clock::Clock,
    state::store::{Store, ALARMS_KEY},
};

/// Name of the alarm that ends a work session
pub const WORK_SESSION_ALARM: &str = "workSession";

type PersistedAlarms = HashMap<String, DateTime<Utc>>;

/// An alarm that went off, tagged with the fire time it was armed for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredAlarm {
    pub name: String,
    pub fire_at: DateTime<Utc>,
}

/// Named one-shot alarm service. Fired alarms are delivered on the
/// receiver returned by [`AlarmScheduler::new`].
pub struct AlarmScheduler {
    store: Arc<Store>,
    clock: Arc<dyn Clock>,
    fired_tx: mpsc::UnboundedSender<FiredAlarm>,
    pending: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl AlarmScheduler {
    pub fn new(store: Arc<Store>, clock: Arc<dyn Clock>) -> (Self, mpsc::UnboundedReceiver<FiredAlarm>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            store,
            clock,
            fired_tx,
            pending: Mutex::new(HashMap::new()),
        };
        (scheduler, fired_rx)
    }

    /// Schedule `name` to fire after `delay_minutes`, replacing any alarm of
    /// the same name. Fractional minutes are honoured to the next whole second.
    pub fn create(&self, name: &str, delay_minutes: f64) -> Result<DateTime<Utc>, String> {
        if !delay_minutes.is_finite() {
            return Err(format!("Invalid alarm delay for '{}': {}", name, delay_minutes));
        }

        // Round to the millisecond first so 200s / 60 * 60 stays 200s
        let millis = (delay_minutes * 60_000.0).round().max(0.0);
        let delay = Duration::from_secs((millis / 1000.0).ceil() as u64);
        let fire_at = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|delta| self.clock.now().checked_add_signed(delta))
            .ok_or_else(|| format!("Alarm delay for '{}' is out of range: {}s", name, delay.as_secs()))?;

        let mut alarms = self.load();
        alarms.insert(name.to_string(), fire_at);
        if let Err(e) = self.store.set(ALARMS_KEY, &alarms) {
            warn!("Failed to persist alarm '{}': {}", name, e);
        }

        self.arm(name, delay, fire_at);
        info!("Alarm '{}' scheduled in {}s (at {})", name, delay.as_secs(), fire_at);
        Ok(fire_at)
    }

    /// Cancel `name`. Returns whether an alarm was pending.
    pub fn clear(&self, name: &str) -> bool {
        if let Some(handle) = self.lock_pending().remove(name) {
            handle.abort();
        }

        let mut alarms = self.load();
        let existed = alarms.remove(name).is_some();
        if existed {
            if let Err(e) = self.store.set(ALARMS_KEY, &alarms) {
                warn!("Failed to persist alarm removal for '{}': {}", name, e);
            }
            info!("Alarm '{}' cleared", name);
        }
        existed
    }

    /// Fire time of a pending alarm
    pub fn scheduled(&self, name: &str) -> Option<DateTime<Utc>> {
        self.load().get(name).copied()
    }

    /// Re-arm every persisted alarm. Overdue alarms fire immediately.
    pub fn restore(&self) -> usize {
        let alarms = self.load();
        let now = self.clock.now();

        for (name, fire_at) in &alarms {
            let delay = (*fire_at - now).to_std().unwrap_or(Duration::ZERO);
            info!("Restoring alarm '{}' (fires in {}s)", name, delay.as_secs());
            self.arm(name, delay, *fire_at);
        }
        alarms.len()
    }

    fn arm(&self, name: &str, delay: Duration, fire_at: DateTime<Utc>) {
        let store = Arc::clone(&self.store);
        let fired_tx = self.fired_tx.clone();
        let alarm_name = name.to_string();

        let handle = tokio::spawn(async move {
            sleep(delay).await;

            // Only forget the persisted entry if it still belongs to this arming
            let mut alarms: PersistedAlarms = store.get(ALARMS_KEY).unwrap_or_default();
            if alarms.get(&alarm_name) == Some(&fire_at) {
                alarms.remove(&alarm_name);
                if let Err(e) = store.set(ALARMS_KEY, &alarms) {
                    warn!("Failed to persist fired alarm '{}': {}", alarm_name, e);
                }
            }

            debug!("Alarm '{}' fired", alarm_name);
            if fired_tx.send(FiredAlarm { name: alarm_name, fire_at }).is_err() {
                warn!("Alarm fired but no listener is running");
            }
        });

        if let Some(previous) = self.lock_pending().insert(name.to_string(), handle) {
            previous.abort();
        }
    }

    fn load(&self) -> PersistedAlarms {
        self.store.get(ALARMS_KEY).unwrap_or_default()
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        match self.pending.lock() {
            Ok(pending) => pending,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for AlarmScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.lock_pending().drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;

    fn scheduler() -> (AlarmScheduler, mpsc::UnboundedReceiver<FiredAlarm>, Arc<Store>) {
        let store = Arc::new(Store::in_memory());
        let (scheduler, rx) = AlarmScheduler::new(Arc::clone(&store), Arc::new(SystemClock));
        (scheduler, rx, store)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_the_delay() {
        let (alarms, mut rx, _) = scheduler();
        alarms.create(WORK_SESSION_ALARM, 1.0).unwrap();
        assert!(alarms.scheduled(WORK_SESSION_ALARM).is_some());

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(rx.recv().await.map(|alarm| alarm.name).as_deref(), Some(WORK_SESSION_ALARM));
        assert!(alarms.scheduled(WORK_SESSION_ALARM).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn fractional_minutes_round_up_to_whole_seconds() {
        let (alarms, mut rx, _) = scheduler();
        // 0.505 minutes is 30.3 seconds, armed for 31
        alarms.create("short", 0.505).unwrap();

        tokio::time::sleep(Duration::from_millis(30_500)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(rx.recv().await.map(|alarm| alarm.name).as_deref(), Some("short"));
    }

    #[tokio::test(start_paused = true)]
    async fn cleared_alarms_never_fire() {
        let (alarms, mut rx, _) = scheduler();
        alarms.create(WORK_SESSION_ALARM, 1.0).unwrap();
        assert!(alarms.clear(WORK_SESSION_ALARM));
        assert!(!alarms.clear(WORK_SESSION_ALARM));

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(rx.try_recv().is_err());
        assert!(alarms.scheduled(WORK_SESSION_ALARM).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn recreating_replaces_the_previous_alarm() {
        let (alarms, mut rx, _) = scheduler();
        alarms.create(WORK_SESSION_ALARM, 1.0).unwrap();
        alarms.create(WORK_SESSION_ALARM, 3.0).unwrap();

        tokio::time::sleep(Duration::from_secs(90)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(rx.recv().await.map(|alarm| alarm.name).as_deref(), Some(WORK_SESSION_ALARM));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn restore_rearms_persisted_alarms() {
        let store = Arc::new(Store::in_memory());
        let mut persisted = PersistedAlarms::new();
        persisted.insert("overdue".to_string(), Utc::now() - chrono::Duration::minutes(5));
        store.set(ALARMS_KEY, &persisted).unwrap();

        let (alarms, mut rx) = AlarmScheduler::new(Arc::clone(&store), Arc::new(SystemClock));
        assert_eq!(alarms.restore(), 1);

        assert_eq!(rx.recv().await.map(|alarm| alarm.name).as_deref(), Some("overdue"));
        assert!(alarms.scheduled("overdue").is_none());
    }

    #[tokio::test]
    async fn rejects_unrepresentable_delays() {
        let (alarms, _rx, _) = scheduler();
        assert!(alarms.create("bad", f64::NAN).is_err());
        assert!(alarms.create("bad", 1e300).is_err());
        assert!(alarms.scheduled("bad").is_none());
    }
}
