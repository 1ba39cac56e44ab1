//! Persisted work-session timer record

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Longest work session accepted, one week
pub const MAX_SESSION_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Timer state for the current work session.
///
/// `remaining_time` is authoritative while paused and only a cached value
/// while running; readers should go through [`TimerState::remaining_at`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub active: bool,
    pub paused: bool,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_duration: u64,
    #[serde(default)]
    pub remaining_time: u64,
}

impl TimerState {
    /// Create an inactive timer state
    pub fn inactive() -> Self {
        Self::default()
    }

    /// Fresh running session of `minutes` starting at `now`
    pub fn started(minutes: f64, now: DateTime<Utc>) -> Result<Self, String> {
        if !minutes.is_finite() || minutes <= 0.0 {
            return Err(format!("minutes must be a positive number, got {}", minutes));
        }
        let seconds = (minutes * 60.0).round();
        if seconds > MAX_SESSION_SECONDS as f64 {
            return Err(format!(
                "minutes must be at most {}, got {}",
                MAX_SESSION_SECONDS / 60,
                minutes
            ));
        }

        let total = seconds as u64;
        Ok(Self {
            active: true,
            paused: false,
            end_time: Some(end_time_after(now, total)?),
            total_duration: total,
            remaining_time: total,
        })
    }

    /// Whether the countdown is currently moving
    pub fn is_running(&self) -> bool {
        self.active && !self.paused
    }

    /// Remaining whole seconds at `now`, rounded up and never negative
    pub fn remaining_at(&self, now: DateTime<Utc>) -> u64 {
        match self.end_time {
            Some(end) if self.is_running() => {
                let millis = (end - now).num_milliseconds().max(0) as u64;
                millis.div_ceil(1000)
            }
            _ => self.remaining_time,
        }
    }

    /// Copy of this state with `remaining_time` recomputed for `now`
    pub fn snapshot_at(&self, now: DateTime<Utc>) -> Self {
        Self {
            remaining_time: self.remaining_at(now),
            ..self.clone()
        }
    }

    /// Freeze the countdown at `time_left` seconds
    pub fn pause(&mut self, time_left: u64) -> Result<(), String> {
        if time_left > MAX_SESSION_SECONDS {
            return Err(format!(
                "timeLeft must be at most {}s, got {}",
                MAX_SESSION_SECONDS, time_left
            ));
        }
        self.paused = true;
        self.remaining_time = time_left;
        self.end_time = None;
        Ok(())
    }

    /// Restart the countdown from the frozen remaining time. Leaves the
    /// state untouched when the end time cannot be represented.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), String> {
        let end_time = end_time_after(now, self.remaining_time)?;
        self.paused = false;
        self.end_time = Some(end_time);
        Ok(())
    }

    /// One refresh-loop step. Returns whether the session is still active.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> bool {
        if !self.active {
            return false;
        }
        if self.paused {
            return true;
        }

        self.remaining_time = self.remaining_at(now);
        if self.remaining_time == 0 {
            self.active = false;
        }
        self.active
    }
}

fn end_time_after(now: DateTime<Utc>, seconds: u64) -> Result<DateTime<Utc>, String> {
    i64::try_from(seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| format!("{}s from now is out of range", seconds))
}
