use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::interval::{Category, Interval, IntervalState};

/// Every observable change of a running interval, as a presentation layer
/// sees it. Built from the snapshots handed to the runner's callbacks,
/// stamped with the config's clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    IntervalStarted {
        id: i64,
        category: Category,
        planned_ms: u64,
        /// Non-zero when a recovered interval picks up where it left off.
        actual_ms: u64,
        at: DateTime<Utc>,
    },
    IntervalTick {
        id: i64,
        category: Category,
        remaining_ms: u64,
        progress: f64,
        at: DateTime<Utc>,
    },
    IntervalPaused {
        id: i64,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    IntervalResumed {
        id: i64,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    IntervalCompleted {
        id: i64,
        category: Category,
        actual_ms: u64,
        at: DateTime<Utc>,
    },
    IntervalCancelled {
        id: i64,
        category: Category,
        actual_ms: u64,
        at: DateTime<Utc>,
    },
}

fn ms(d: std::time::Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Event {
    pub fn started(interval: &Interval, at: DateTime<Utc>) -> Self {
        Event::IntervalStarted {
            id: interval.id,
            category: interval.category,
            planned_ms: ms(interval.planned_duration),
            actual_ms: ms(interval.actual_duration),
            at,
        }
    }

    pub fn tick(interval: &Interval, at: DateTime<Utc>) -> Self {
        Event::IntervalTick {
            id: interval.id,
            category: interval.category,
            remaining_ms: ms(interval.remaining()),
            progress: interval.progress(),
            at,
        }
    }

    pub fn paused(interval: &Interval, at: DateTime<Utc>) -> Self {
        Event::IntervalPaused {
            id: interval.id,
            remaining_ms: ms(interval.remaining()),
            at,
        }
    }

    pub fn resumed(interval: &Interval, at: DateTime<Utc>) -> Self {
        Event::IntervalResumed {
            id: interval.id,
            remaining_ms: ms(interval.remaining()),
            at,
        }
    }

    /// `IntervalCancelled` for a cancelled snapshot, `IntervalCompleted` otherwise.
    pub fn finished(interval: &Interval, at: DateTime<Utc>) -> Self {
        if interval.state == IntervalState::Cancelled {
            Event::IntervalCancelled {
                id: interval.id,
                category: interval.category,
                actual_ms: ms(interval.actual_duration),
                at,
            }
        } else {
            Event::IntervalCompleted {
                id: interval.id,
                category: interval.category,
                actual_ms: ms(interval.actual_duration),
                at,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let mut i = Interval::new(Category::ShortBreak, Duration::from_secs(300));
        i.id = 9;
        let json = serde_json::to_value(Event::started(&i, Utc::now())).unwrap();
        assert_eq!(json["type"], "IntervalStarted");
        assert_eq!(json["category"], "ShortBreak");
        assert_eq!(json["planned_ms"], 300_000);
    }

    #[test]
    fn finished_distinguishes_cancellation() {
        let mut i = Interval::new(Category::Pomodoro, Duration::from_secs(60));
        i.begin(Utc::now()).unwrap();
        i.accumulate(Duration::from_secs(20)).unwrap();
        i.cancel().unwrap();
        assert!(matches!(
            Event::finished(&i, Utc::now()),
            Event::IntervalCancelled { actual_ms: 20_000, .. }
        ));

        let mut j = Interval::new(Category::Pomodoro, Duration::from_secs(60));
        j.begin(Utc::now()).unwrap();
        j.accumulate(Duration::from_secs(60)).unwrap();
        assert!(matches!(Event::finished(&j, Utc::now()), Event::IntervalCompleted { .. }));
    }

    #[test]
    fn tick_reports_remaining_time() {
        let mut i = Interval::new(Category::Pomodoro, Duration::from_secs(60));
        i.begin(Utc::now()).unwrap();
        i.accumulate(Duration::from_secs(15)).unwrap();
        match Event::tick(&i, Utc::now()) {
            Event::IntervalTick { remaining_ms, progress, .. } => {
                assert_eq!(remaining_ms, 45_000);
                assert!((progress - 0.25).abs() < 1e-9);
            }
            other => panic!("Expected IntervalTick, got {other:?}"),
        }
    }

    #[test]
    fn events_carry_the_given_timestamp() {
        use chrono::TimeZone;

        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut i = Interval::new(Category::Pomodoro, Duration::from_secs(60));
        i.begin(at).unwrap();
        for event in [
            Event::started(&i, at),
            Event::tick(&i, at),
            Event::paused(&i, at),
            Event::resumed(&i, at),
            Event::finished(&i, at),
        ] {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["at"], "2024-03-01T09:00:00Z", "{event:?}");
        }
    }
}
