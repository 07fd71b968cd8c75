use chrono::{Local, NaiveTime, Timelike};
use std::{fmt, time::Duration};

use crate::model::ClockState;

/// How often the displayed time is recomputed.
pub const TICK_INTERVAL: Duration = Duration::from_secs(60);

/// `H:MM` in 24-hour time. Hours are not padded, minutes are.
pub fn format_clock<T: Timelike>(time: &T) -> String {
    format!("{}:{:02}", time.hour(), time.minute())
}

type TimeSource = Box<dyn Fn() -> NaiveTime + Send + Sync>;

/// Keeps the dashboard clock string, independent of any network state.
pub struct ClockTicker {
    now: TimeSource,
    state: ClockState,
}

impl ClockTicker {
    pub fn system() -> Self {
        Self::with_source(|| Local::now().time())
    }

    pub fn with_source(now: impl Fn() -> NaiveTime + Send + Sync + 'static) -> Self {
        Self { now: Box::new(now), state: ClockState::default() }
    }

    pub fn tick(&mut self) -> &ClockState {
        self.state.display = format_clock(&(self.now)());
        &self.state
    }

    pub fn state(&self) -> &ClockState {
        &self.state
    }
}

impl Default for ClockTicker {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for ClockTicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClockTicker").field("state", &self.state).finish_non_exhaustive()
    }
}
