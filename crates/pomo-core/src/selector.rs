//! Next-interval selection.
//!
//! The decision is derived only from persisted history (`last` and
//! `breaks`), so it survives process restarts.

use tracing::debug;

use crate::config::IntervalConfig;
use crate::error::{CoreError, Result};
use crate::interval::{Category, Interval};
use crate::storage::Repository;

/// The interval the caller should run next.
///
/// An unfinished last interval (`NotStarted`, `Running` or `Paused`) is
/// returned as-is so it can be resumed. Otherwise a new, unpersisted
/// interval is built for the next category in the rotation.
///
/// # Errors
/// Store errors other than an empty history propagate unchanged.
pub fn get_interval(config: &IntervalConfig) -> Result<Interval> {
    let repo = config.repo().as_ref();
    let last = match repo.last() {
        Ok(last) if !last.is_finished() => {
            debug!(id = last.id, state = %last.state, "resuming unfinished interval");
            return Ok(last);
        }
        Ok(last) => Some(last),
        Err(CoreError::NoIntervals) => None,
        Err(e) => return Err(e),
    };

    let category = category_after(last.as_ref(), repo, config.long_break_every)?;
    debug!(%category, "selected next interval");
    Ok(Interval::new(category, config.duration_for(category)))
}

/// Category rotation: Pomodoro after every break; after a Pomodoro, a long
/// break once the previous `every - 1` breaks were all short.
///
/// # Errors
/// Store errors other than an empty history propagate unchanged.
pub fn next_category(repo: &dyn Repository, every: u32) -> Result<Category> {
    let last = match repo.last() {
        Ok(last) => Some(last),
        Err(CoreError::NoIntervals) => None,
        Err(e) => return Err(e),
    };
    category_after(last.as_ref(), repo, every)
}

fn category_after(last: Option<&Interval>, repo: &dyn Repository, every: u32) -> Result<Category> {
    let Some(last) = last else {
        return Ok(Category::Pomodoro);
    };
    if last.category.is_break() {
        return Ok(Category::Pomodoro);
    }

    let wanted = every.saturating_sub(1) as usize;
    let recent = repo.breaks(wanted)?;
    if recent.len() < wanted || recent.iter().any(|i| i.category == Category::LongBreak) {
        return Ok(Category::ShortBreak);
    }
    Ok(Category::LongBreak)
}
