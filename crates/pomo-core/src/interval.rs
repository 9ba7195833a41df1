//! The interval entity and its state-transition rules.
//!
//! ## State Transitions
//!
//! ```text
//! NotStarted -> Running -> (Paused <-> Running)* -> (Done | Cancelled)
//! ```
//!
//! The methods here are pure: they validate and apply a transition on the
//! in-memory record. Persisting the result is the runner's job.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Pomodoro,
    ShortBreak,
    LongBreak,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Pomodoro => "Pomodoro",
            Category::ShortBreak => "ShortBreak",
            Category::LongBreak => "LongBreak",
        }
    }

    pub fn is_break(self) -> bool {
        matches!(self, Category::ShortBreak | Category::LongBreak)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Pomodoro" => Ok(Category::Pomodoro),
            "ShortBreak" => Ok(Category::ShortBreak),
            "LongBreak" => Ok(Category::LongBreak),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntervalState {
    NotStarted,
    Running,
    Paused,
    Done,
    Cancelled,
}

impl IntervalState {
    pub fn as_str(self) -> &'static str {
        match self {
            IntervalState::NotStarted => "NotStarted",
            IntervalState::Running => "Running",
            IntervalState::Paused => "Paused",
            IntervalState::Done => "Done",
            IntervalState::Cancelled => "Cancelled",
        }
    }

    /// `Done` and `Cancelled` accept no further transitions.
    pub fn is_finished(self) -> bool {
        matches!(self, IntervalState::Done | IntervalState::Cancelled)
    }
}

impl fmt::Display for IntervalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntervalState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "NotStarted" => Ok(IntervalState::NotStarted),
            "Running" => Ok(IntervalState::Running),
            "Paused" => Ok(IntervalState::Paused),
            "Done" => Ok(IntervalState::Done),
            "Cancelled" => Ok(IntervalState::Cancelled),
            other => Err(format!("unknown interval state: {other}")),
        }
    }
}

/// One timer run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    /// Assigned by the repository on creation; 0 until persisted.
    pub id: i64,
    /// When the countdown began. `None` until started.
    pub start_time: Option<DateTime<Utc>>,
    #[serde(rename = "planned_duration_ms", with = "duration_ms")]
    pub planned_duration: Duration,
    #[serde(rename = "actual_duration_ms", with = "duration_ms")]
    pub actual_duration: Duration,
    pub category: Category,
    pub state: IntervalState,
}

impl Interval {
    /// A fresh, unpersisted interval.
    pub fn new(category: Category, planned_duration: Duration) -> Self {
        Self {
            id: 0,
            start_time: None,
            planned_duration,
            actual_duration: Duration::ZERO,
            category,
            state: IntervalState::NotStarted,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn remaining(&self) -> Duration {
        self.planned_duration.saturating_sub(self.actual_duration)
    }

    /// 0.0 .. 1.0 progress through the planned duration.
    pub fn progress(&self) -> f64 {
        if self.planned_duration.is_zero() {
            return 1.0;
        }
        (self.actual_duration.as_secs_f64() / self.planned_duration.as_secs_f64()).min(1.0)
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Fails with `IntervalCompleted` once the interval is done or cancelled.
    pub fn ensure_not_finished(&self) -> Result<()> {
        if self.is_finished() {
            return Err(CoreError::IntervalCompleted);
        }
        Ok(())
    }

    /// Enter `Running`. A fresh interval gets its start time here; a
    /// recovered `Paused`/`Running` one keeps its original start time and
    /// accumulated duration.
    pub fn begin(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.ensure_not_finished()?;
        if self.state == IntervalState::NotStarted || self.start_time.is_none() {
            self.start_time = Some(now);
        }
        self.state = IntervalState::Running;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        self.ensure_not_finished()?;
        if self.state != IntervalState::Running {
            return Err(CoreError::InvalidState {
                state: self.state,
                operation: "pause",
            });
        }
        self.state = IntervalState::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        self.ensure_not_finished()?;
        if self.state != IntervalState::Paused {
            return Err(CoreError::InvalidState {
                state: self.state,
                operation: "resume",
            });
        }
        self.state = IntervalState::Running;
        Ok(())
    }

    /// Add running time. Returns `true` when this completes the interval.
    ///
    /// Paused intervals ignore the elapsed time.
    pub fn accumulate(&mut self, elapsed: Duration) -> Result<bool> {
        match self.state {
            IntervalState::Running => {
                self.actual_duration = self.actual_duration.saturating_add(elapsed);
                if self.actual_duration >= self.planned_duration {
                    self.state = IntervalState::Done;
                    return Ok(true);
                }
                Ok(false)
            }
            IntervalState::Paused => Ok(false),
            IntervalState::NotStarted => Err(CoreError::IntervalNotRunning),
            IntervalState::Done | IntervalState::Cancelled => Err(CoreError::IntervalCompleted),
        }
    }

    pub fn cancel(&mut self) -> Result<()> {
        match self.state {
            IntervalState::Running | IntervalState::Paused => {
                self.state = IntervalState::Cancelled;
                Ok(())
            }
            IntervalState::NotStarted => Err(CoreError::IntervalNotRunning),
            IntervalState::Done | IntervalState::Cancelled => Err(CoreError::IntervalCompleted),
        }
    }
}

/// Serialize `Duration` as integer milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
