//! Background timer controller state and transitions

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};

use chrono::{DateTime, Utc};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info, warn};

use super::{
    store::{Store, SESSION_TYPE_KEY, TIMER_STATE_KEY},
    SessionType, TimerState,
};
use crate::{
    clock::Clock,
    services::{
        alarms::{AlarmScheduler, FiredAlarm, WORK_SESSION_ALARM},
        presenter::{Presenter, BREAK_NOTIFICATION_BODY, BREAK_NOTIFICATION_TITLE},
    },
    tasks::refresh_loop_task,
};

/// Owns the persisted timer record and every transition applied to it.
///
/// All mutations go through `handler_lock`, so a control message, a refresh
/// tick and an alarm firing never interleave their read-modify-write.
pub struct AppState {
    store: Arc<Store>,
    clock: Arc<dyn Clock>,
    pub alarms: AlarmScheduler,
    presenter: Arc<dyn Presenter>,
    handler_lock: Mutex<()>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    /// Create the controller. The returned receiver yields fired alarms
    /// and must be handed to the alarm listener task.
    pub fn new(
        store: Arc<Store>,
        clock: Arc<dyn Clock>,
        presenter: Arc<dyn Presenter>,
        host: String,
        port: u16,
    ) -> (Self, mpsc::UnboundedReceiver<FiredAlarm>) {
        let (alarms, fired_rx) = AlarmScheduler::new(Arc::clone(&store), Arc::clone(&clock));
        let state = Self {
            store,
            clock,
            alarms,
            presenter,
            handler_lock: Mutex::new(()),
            refresh_task: Mutex::new(None),
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
        };
        (state, fired_rx)
    }

    /// URL of the break surface served by this daemon
    pub fn break_url(&self) -> String {
        format!("http://{}:{}/break", self.host, self.port)
    }

    /// Begin a new work session of `minutes`, superseding any current one
    pub fn start_timer(self: &Arc<Self>, minutes: f64) -> Result<TimerState, String> {
        let guard = self.lock_handler();
        let timer = TimerState::started(minutes, self.clock.now())?;
        // Arm the alarm before persisting so a failure leaves the old record intact
        self.alarms.create(WORK_SESSION_ALARM, minutes)?;
        self.save_timer(&timer);
        self.save_session_type(SessionType::Work);
        drop(guard);

        info!("Work session started for {} minutes", minutes);
        self.record_action("startTimer");
        self.start_refresh_loop();
        Ok(timer)
    }

    /// Freeze the countdown at `time_left` seconds and cancel the alarm
    pub fn pause_timer(&self, time_left: u64) -> Result<TimerState, String> {
        let _guard = self.lock_handler();
        let mut timer = self.load_timer().unwrap_or_default();

        if !timer.active {
            debug!("Pause requested without an active session, ignoring");
            return Ok(timer);
        }

        timer.pause(time_left)?;
        self.save_timer(&timer);
        self.alarms.clear(WORK_SESSION_ALARM);

        info!("Work session paused with {}s left", time_left);
        self.record_action("pauseTimer");
        Ok(timer)
    }

    /// Continue a paused session from its frozen remaining time
    pub fn resume_timer(self: &Arc<Self>) -> Result<TimerState, String> {
        let guard = self.lock_handler();
        let mut timer = self.load_timer().unwrap_or_default();

        if !(timer.active && timer.paused) {
            debug!("Resume requested without a paused session, ignoring");
            return Ok(timer);
        }

        timer.resume(self.clock.now())?;
        self.alarms
            .create(WORK_SESSION_ALARM, timer.remaining_time as f64 / 60.0)?;
        self.save_timer(&timer);
        drop(guard);

        info!("Work session resumed with {}s left", timer.remaining_time);
        self.record_action("resumeTimer");
        self.start_refresh_loop();
        Ok(timer)
    }

    /// Current timer state with the remaining time computed for now
    pub fn get_timer_state(&self) -> Option<TimerState> {
        let _guard = self.lock_handler();
        self.load_timer().map(|timer| timer.snapshot_at(self.clock.now()))
    }

    /// Current session type, `work` when nothing was stored yet
    pub fn session_type(&self) -> SessionType {
        self.store.get(SESSION_TYPE_KEY).unwrap_or_default()
    }

    /// One refresh-loop step. Returns whether the loop should keep running.
    pub fn refresh_tick(&self) -> bool {
        let _guard = self.lock_handler();
        let Some(mut timer) = self.load_timer() else {
            return false;
        };

        if !timer.is_running() {
            return timer.active;
        }

        let still_active = timer.refresh(self.clock.now());
        self.save_timer(&timer);
        debug!("Refresh tick: {}s remaining", timer.remaining_time);

        if !still_active {
            info!("Countdown reached zero, marking session inactive");
        }
        still_active
    }

    /// React to a fired alarm. Fires left over from a session that was since
    /// paused, restarted or resumed are dropped.
    pub async fn handle_alarm(&self, alarm: &FiredAlarm) {
        if alarm.name != WORK_SESSION_ALARM {
            warn!("Ignoring unknown alarm '{}'", alarm.name);
            return;
        }

        {
            let _guard = self.lock_handler();
            if let Some(rearmed) = self.alarms.scheduled(&alarm.name) {
                if rearmed != alarm.fire_at {
                    debug!("Dropping stale '{}' fire, re-armed for {}", alarm.name, rearmed);
                    return;
                }
            }
            if self.load_timer().is_some_and(|timer| timer.active && timer.paused) {
                debug!("Dropping stale '{}' fire, session is paused", alarm.name);
                return;
            }

            self.stop_refresh_loop();
            self.save_timer(&TimerState::inactive());
            self.save_session_type(SessionType::Break);
        }
        info!("Work session complete, switching to break");
        self.record_action("workSessionComplete");

        if let Err(e) = self
            .presenter
            .notify(BREAK_NOTIFICATION_TITLE, BREAK_NOTIFICATION_BODY)
            .await
        {
            warn!("Failed to show break notification: {}", e);
        }

        let url = self.break_url();
        if let Err(e) = self.presenter.open_break_surface(&url).await {
            warn!("Failed to open break surface: {}", e);
        }
    }

    /// Bring persisted alarms and the refresh loop back after a restart
    pub fn restore(self: &Arc<Self>) {
        if self.store.fresh_install() {
            info!("Mindful Breaks installed, no previous state found");
        }

        let restored = self.alarms.restore();
        if restored > 0 {
            info!("Restored {} pending alarm(s)", restored);
        }

        if self.load_timer().is_some_and(|timer| timer.is_running()) {
            info!("Resuming refresh loop for the running work session");
            self.start_refresh_loop();
        }
    }

    /// Start the per-second refresh loop, replacing any running one
    pub fn start_refresh_loop(self: &Arc<Self>) {
        let handle = tokio::spawn(refresh_loop_task(Arc::clone(self)));
        if let Some(previous) = self.lock_refresh_task().replace(handle) {
            previous.abort();
        }
    }

    pub fn stop_refresh_loop(&self) {
        if let Some(handle) = self.lock_refresh_task().take() {
            handle.abort();
            debug!("Refresh loop stopped");
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|a| a.clone()) {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some((action.to_string(), self.clock.now()));
        }
    }

    fn load_timer(&self) -> Option<TimerState> {
        self.store.get(TIMER_STATE_KEY)
    }

    fn save_timer(&self, timer: &TimerState) {
        if let Err(e) = self.store.set(TIMER_STATE_KEY, timer) {
            error!("Failed to persist timer state: {}", e);
        }
    }

    fn save_session_type(&self, session: SessionType) {
        if let Err(e) = self.store.set(SESSION_TYPE_KEY, &session) {
            error!("Failed to persist session type: {}", e);
        }
    }

    fn lock_handler(&self) -> MutexGuard<'_, ()> {
        match self.handler_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_refresh_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        match self.refresh_task.lock() {
            Ok(task) => task,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
