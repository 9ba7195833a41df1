//! Interval configuration: the three planned durations plus the storage
//! handle they are run against.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::interval::Category;
use crate::storage::Repository;
use crate::timer::{Clock, SystemClock};

pub const DEFAULT_POMODORO: Duration = Duration::from_secs(25 * 60);
pub const DEFAULT_SHORT_BREAK: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_LONG_BREAK: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_LONG_BREAK_EVERY: u32 = 4;
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Everything the selector and runner need, built once per process run.
#[derive(Clone)]
pub struct IntervalConfig {
    repo: Arc<dyn Repository>,
    clock: Arc<dyn Clock>,
    pub pomodoro_duration: Duration,
    pub short_break_duration: Duration,
    pub long_break_duration: Duration,
    /// Pomodoros per long break.
    pub long_break_every: u32,
    /// Cadence of the countdown loop.
    pub tick_period: Duration,
}

impl IntervalConfig {
    /// Build a config. Any duration that is zero or negative falls back to
    /// its default (25m / 5m / 15m).
    pub fn new(
        repo: Arc<dyn Repository>,
        pomodoro: chrono::Duration,
        short_break: chrono::Duration,
        long_break: chrono::Duration,
    ) -> Self {
        Self {
            repo,
            clock: Arc::new(SystemClock),
            pomodoro_duration: positive_or(pomodoro, DEFAULT_POMODORO),
            short_break_duration: positive_or(short_break, DEFAULT_SHORT_BREAK),
            long_break_duration: positive_or(long_break, DEFAULT_LONG_BREAK),
            long_break_every: DEFAULT_LONG_BREAK_EVERY,
            tick_period: DEFAULT_TICK_PERIOD,
        }
    }

    /// Zero keeps the default cadence of 4.
    pub fn with_long_break_every(mut self, every: u32) -> Self {
        self.long_break_every = if every == 0 {
            DEFAULT_LONG_BREAK_EVERY
        } else {
            every
        };
        self
    }

    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = if period.is_zero() {
            DEFAULT_TICK_PERIOD
        } else {
            period
        };
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn repo(&self) -> &Arc<dyn Repository> {
        &self.repo
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn duration_for(&self, category: Category) -> Duration {
        match category {
            Category::Pomodoro => self.pomodoro_duration,
            Category::ShortBreak => self.short_break_duration,
            Category::LongBreak => self.long_break_duration,
        }
    }
}

impl fmt::Debug for IntervalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntervalConfig")
            .field("pomodoro_duration", &self.pomodoro_duration)
            .field("short_break_duration", &self.short_break_duration)
            .field("long_break_duration", &self.long_break_duration)
            .field("long_break_every", &self.long_break_every)
            .field("tick_period", &self.tick_period)
            .finish_non_exhaustive()
    }
}

fn positive_or(value: chrono::Duration, default: Duration) -> Duration {
    match value.to_std() {
        Ok(d) if !d.is_zero() => d,
        _ => default,
    }
}
