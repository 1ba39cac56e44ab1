//! Popup controller
//!
//! The popup is transient and holds no authoritative state: every time it
//! opens it rebuilds its view from the background controller, and while a
//! countdown is running it re-queries the controller once per second rather
//! than keeping its own clock.

pub mod client;

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::{
    api::{ControlMessage, ControlReply},
    state::TimerState,
};
pub use client::{ControlClient, HttpControlClient, LocalControlClient};

/// What the popup currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupView {
    pub countdown: String,
    pub pause_label: &'static str,
    pub start_enabled: bool,
}

impl Default for PopupView {
    fn default() -> Self {
        Self {
            countdown: format_time(0),
            pause_label: "Pause",
            start_enabled: true,
        }
    }
}

/// One open popup bound to a controller
pub struct Popup<C: ControlClient> {
    client: C,
    active: bool,
    paused: bool,
    time_left: u64,
    view: PopupView,
}

impl<C: ControlClient> Popup<C> {
    /// Open the popup and restore its view from the controller
    pub async fn open(client: C) -> Result<Self, String> {
        let mut popup = Self {
            client,
            active: false,
            paused: false,
            time_left: 0,
            view: PopupView::default(),
        };
        let timer = popup.query().await?;
        popup.apply(timer);
        Ok(popup)
    }

    pub fn view(&self) -> &PopupView {
        &self.view
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn time_left(&self) -> u64 {
        self.time_left
    }

    /// Whether the display loop should be running
    pub fn is_counting_down(&self) -> bool {
        self.active && !self.paused
    }

    /// Start a work session from raw user input. Invalid input is ignored
    /// and reported as `Ok(false)` without contacting the controller.
    pub async fn start(&mut self, input: &str) -> Result<bool, String> {
        let Some(minutes) = parse_minutes(input) else {
            debug!("Ignoring invalid minutes input {:?}", input);
            return Ok(false);
        };

        self.expect_ack(ControlMessage::StartTimer { minutes: minutes as f64 })
            .await?;

        self.active = true;
        self.paused = false;
        self.time_left = minutes * 60;
        self.render();
        Ok(true)
    }

    /// Flip between paused and running, sending the locally tracked time left
    pub async fn toggle_pause(&mut self) -> Result<(), String> {
        if !self.active {
            debug!("Nothing to pause, no active session");
            return Ok(());
        }

        let message = if self.paused {
            ControlMessage::ResumeTimer
        } else {
            ControlMessage::PauseTimer { time_left: self.time_left }
        };
        self.expect_ack(message).await?;

        self.paused = !self.paused;
        self.render();
        Ok(())
    }

    /// Re-query the controller. Returns whether the countdown is still moving.
    pub async fn tick(&mut self) -> Result<bool, String> {
        let timer = self.query().await?;
        self.apply(timer);
        Ok(self.is_counting_down())
    }

    /// Refresh once per second until the controller reports the session
    /// inactive or paused, or the countdown reaches zero. Renders after every
    /// refresh.
    pub async fn run_display_loop<F>(&mut self, mut render: F) -> Result<(), String>
    where
        F: FnMut(&PopupView),
    {
        let mut interval = interval(Duration::from_secs(1));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.is_counting_down() {
            interval.tick().await;
            let running = self.tick().await?;
            render(&self.view);
            if !running || self.time_left == 0 {
                break;
            }
        }
        Ok(())
    }

    async fn query(&self) -> Result<Option<TimerState>, String> {
        match self.client.send(ControlMessage::GetTimerState).await? {
            ControlReply::TimerState(timer) => Ok(timer),
            ControlReply::Ack(ack) => Err(format!("Unexpected acknowledgement: {:?}", ack)),
        }
    }

    async fn expect_ack(&self, message: ControlMessage) -> Result<(), String> {
        match self.client.send(message).await? {
            ControlReply::Ack(ack) if ack.success => Ok(()),
            ControlReply::Ack(ack) => Err(ack.error.unwrap_or_else(|| "message rejected".to_string())),
            ControlReply::TimerState(_) => Err("Unexpected timer state reply".to_string()),
        }
    }

    fn apply(&mut self, timer: Option<TimerState>) {
        let timer = timer.unwrap_or_default();
        self.active = timer.active;
        self.paused = timer.active && timer.paused;
        self.time_left = if timer.active { timer.remaining_time } else { 0 };
        self.render();
    }

    fn render(&mut self) {
        self.view = PopupView {
            countdown: format_time(self.time_left),
            pause_label: if self.paused { "Resume" } else { "Pause" },
            start_enabled: !self.active,
        };
    }
}

/// Parse whole minutes the way a browser's `parseInt` would read the input
/// box: leading whitespace, an optional sign, then leading digits. Anything
/// that does not yield an integer of at least 1 is rejected.
pub fn parse_minutes(input: &str) -> Option<u64> {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 || negative {
        return None;
    }

    let minutes: u64 = rest[..digits_len].parse().ok()?;
    (minutes >= 1).then_some(minutes)
}

/// Format seconds as `m:ss`
pub fn format_time(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
