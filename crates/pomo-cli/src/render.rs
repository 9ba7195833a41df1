//! Terminal output for runner events.

use std::io::Write;
use std::time::Duration;

use pomo_core::{Category, Event};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// Human-readable status, ticks redrawn in place.
    Text,
    /// One JSON object per line.
    Json,
}

impl Output {
    pub fn emit(self, event: &Event) {
        match self {
            Output::Json => match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!("failed to encode event: {e}"),
            },
            Output::Text => {
                let line = describe(event);
                if matches!(event, Event::IntervalTick { .. }) {
                    print!("\r{line:<40}");
                    let _ = std::io::stdout().flush();
                } else {
                    println!("\r{line:<40}");
                }
            }
        }
    }
}

pub fn format_clock(d: Duration) -> String {
    let secs = d.as_secs_f64().ceil() as u64;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn label(category: Category) -> &'static str {
    match category {
        Category::Pomodoro => "Pomodoro",
        Category::ShortBreak => "Short break",
        Category::LongBreak => "Long break",
    }
}

pub fn describe(event: &Event) -> String {
    match event {
        Event::IntervalStarted {
            id,
            category,
            planned_ms,
            actual_ms,
            ..
        } => {
            let left = Duration::from_millis(planned_ms.saturating_sub(*actual_ms));
            if *actual_ms > 0 {
                format!("{} #{id} resumed, {} to go", label(*category), format_clock(left))
            } else {
                format!("{} #{id} started, {} to go", label(*category), format_clock(left))
            }
        }
        Event::IntervalTick {
            category,
            remaining_ms,
            ..
        } => format!(
            "{}  {} remaining",
            label(*category),
            format_clock(Duration::from_millis(*remaining_ms))
        ),
        Event::IntervalPaused { remaining_ms, .. } => format!(
            "Paused with {} left (r to resume)",
            format_clock(Duration::from_millis(*remaining_ms))
        ),
        Event::IntervalResumed { remaining_ms, .. } => format!(
            "Resumed, {} left",
            format_clock(Duration::from_millis(*remaining_ms))
        ),
        Event::IntervalCompleted {
            id,
            category,
            actual_ms,
            ..
        } => format!(
            "{} #{id} done after {}",
            label(*category),
            format_clock(Duration::from_millis(*actual_ms))
        ),
        Event::IntervalCancelled {
            id,
            category,
            actual_ms,
            ..
        } => format!(
            "{} #{id} cancelled after {}",
            label(*category),
            format_clock(Duration::from_millis(*actual_ms))
        ),
    }
}
