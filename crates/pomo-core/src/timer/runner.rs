//! Interval runner.
//!
//! The runner drives one [`Interval`] through its countdown. It is an
//! explicit state machine polled once per tick: every wake-up flushes the
//! elapsed time into the interval, persists it, and reports it to the
//! caller's callbacks.
//!
//! ## Usage
//!
//! ```ignore
//! let interval = get_interval(&config)?;
//! let runner = IntervalRunner::new(interval);
//! let handle = runner.handle(); // pause/resume from another task
//! let done = runner.start(cancel, &config, on_start, on_tick, on_end).await?;
//! ```
//!
//! Elapsed time is measured with `tokio::time::Instant`, so tests can run
//! whole intervals under paused virtual time.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::IntervalConfig;
use crate::error::{CoreError, Result};
use crate::interval::{Interval, IntervalState};
use crate::storage::Repository;

/// Bookkeeping that only exists while a countdown loop is active.
struct Active {
    repo: Arc<dyn Repository>,
    last_flush: Instant,
}

struct Shared {
    interval: Interval,
    active: Option<Active>,
}

impl Shared {
    /// Move time since the last flush into the interval. Returns `true` once
    /// the interval is done.
    fn flush(&mut self) -> Result<bool> {
        let active = self.active.as_mut().ok_or(CoreError::IntervalNotRunning)?;
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(active.last_flush);
        active.last_flush = now;
        match self.interval.state {
            IntervalState::Done => Ok(true),
            _ => self.interval.accumulate(elapsed),
        }
    }

    fn next_wait(&self, tick: Duration) -> Duration {
        match self.interval.state {
            IntervalState::Running => tick.min(self.interval.remaining()),
            _ => tick,
        }
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|e| e.into_inner())
}

/// Clears the active marker however `start` exits, including when its
/// future is dropped mid-countdown.
struct ActiveGuard<'a>(&'a Mutex<Shared>);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        lock(self.0).active = None;
    }
}

/// Drives one interval from start to `Done` or `Cancelled`.
pub struct IntervalRunner {
    shared: Arc<Mutex<Shared>>,
    /// Pause/resume wake the countdown so it re-plans its next sleep.
    wake: Arc<Notify>,
}

impl IntervalRunner {
    pub fn new(interval: Interval) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                interval,
                active: None,
            })),
            wake: Arc::new(Notify::new()),
        }
    }

    /// A cloneable handle for pausing and resuming from elsewhere.
    pub fn handle(&self) -> RunnerHandle {
        RunnerHandle {
            shared: Arc::clone(&self.shared),
            wake: Arc::clone(&self.wake),
        }
    }

    pub fn snapshot(&self) -> Interval {
        lock(&self.shared).interval.clone()
    }

    pub fn pause(&self) -> Result<Interval> {
        self.handle().pause()
    }

    pub fn resume(&self) -> Result<Interval> {
        self.handle().resume()
    }

    /// Run the countdown until the interval is done or `cancel` fires.
    ///
    /// A fresh interval is created in the store first, so it carries an id
    /// before `on_start` runs. A recovered `Paused`/`Running` interval keeps
    /// its id and accumulated duration. The final tick is reported through
    /// `on_end` rather than `on_tick`.
    ///
    /// Cancellation is not an error: the returned interval is `Cancelled`.
    ///
    /// # Errors
    /// `IntervalCompleted` for a done or cancelled interval, and any store
    /// error raised while persisting. Store errors abort the run.
    pub async fn start<S, T, E>(
        &self,
        cancel: CancellationToken,
        config: &IntervalConfig,
        mut on_start: S,
        mut on_tick: T,
        mut on_end: E,
    ) -> Result<Interval>
    where
        S: FnMut(&Interval),
        T: FnMut(&Interval),
        E: FnMut(&Interval),
    {
        let repo = Arc::clone(config.repo());
        let tick = config.tick_period;

        let started = {
            let mut shared = lock(&self.shared);
            shared.interval.ensure_not_finished()?;
            if shared.active.is_some() {
                return Err(CoreError::InvalidState {
                    state: shared.interval.state,
                    operation: "start",
                });
            }

            if !shared.interval.is_persisted() {
                let id = repo.create(&shared.interval)?;
                shared.interval.id = id;
                debug!(id = shared.interval.id, "interval created");
            } else if shared.interval.state != IntervalState::NotStarted {
                warn!(
                    id = shared.interval.id,
                    state = %shared.interval.state,
                    actual_ms = shared.interval.actual_duration.as_millis() as u64,
                    "resuming interval left unfinished by an earlier run"
                );
            }

            shared.interval.begin(config.clock().now())?;
            shared.active = Some(Active {
                repo: Arc::clone(&repo),
                last_flush: Instant::now(),
            });
            shared.interval.clone()
        };
        let _active = ActiveGuard(&self.shared);

        info!(
            id = started.id,
            category = %started.category,
            planned_ms = started.planned_duration.as_millis() as u64,
            "interval started"
        );
        on_start(&started);
        // `on_start` may already have paused it through a handle.
        repo.update(&self.snapshot())?;

        loop {
            let wait = lock(&self.shared).next_wait(tick);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    let finished = {
                        let mut shared = lock(&self.shared);
                        if !shared.flush()? {
                            shared.interval.cancel()?;
                        }
                        repo.update(&shared.interval)?;
                        shared.interval.clone()
                    };
                    info!(
                        id = finished.id,
                        state = %finished.state,
                        actual_ms = finished.actual_duration.as_millis() as u64,
                        "interval finished"
                    );
                    on_end(&finished);
                    return Ok(finished);
                }
                _ = self.wake.notified() => {}
                _ = tokio::time::sleep(wait) => {
                    let (snapshot, ticked, done) = {
                        let mut shared = lock(&self.shared);
                        let ticked = shared.interval.state == IntervalState::Running;
                        let done = shared.flush()?;
                        if ticked || done {
                            repo.update(&shared.interval)?;
                        }
                        (shared.interval.clone(), ticked, done)
                    };

                    if done {
                        info!(
                            id = snapshot.id,
                            state = %snapshot.state,
                            actual_ms = snapshot.actual_duration.as_millis() as u64,
                            "interval finished"
                        );
                        on_end(&snapshot);
                        return Ok(snapshot);
                    }
                    if ticked {
                        trace!(
                            id = snapshot.id,
                            remaining_ms = snapshot.remaining().as_millis() as u64,
                            "tick"
                        );
                        on_tick(&snapshot);
                    }
                }
            }
        }
    }
}

/// Relays pause/resume to a runner, from any task or thread.
#[derive(Clone)]
pub struct RunnerHandle {
    shared: Arc<Mutex<Shared>>,
    wake: Arc<Notify>,
}

impl RunnerHandle {
    pub fn snapshot(&self) -> Interval {
        lock(&self.shared).interval.clone()
    }

    /// `Running -> Paused`. Time up to now is counted; time from here on is not.
    ///
    /// # Errors
    /// `IntervalCompleted` once done or cancelled, `InvalidState` from any
    /// other state but `Running`, `IntervalNotRunning` when no countdown is
    /// active, or the store's error.
    pub fn pause(&self) -> Result<Interval> {
        let mut shared = lock(&self.shared);
        shared.interval.ensure_not_finished()?;
        if shared.interval.state != IntervalState::Running {
            return Err(CoreError::InvalidState {
                state: shared.interval.state,
                operation: "pause",
            });
        }
        let repo = match &shared.active {
            Some(active) => Arc::clone(&active.repo),
            None => return Err(CoreError::IntervalNotRunning),
        };

        if shared.flush()? {
            // Ran out while we were asking; the countdown loop reports it.
            self.wake.notify_one();
            return Err(CoreError::IntervalCompleted);
        }
        let mut next = shared.interval.clone();
        next.pause()?;
        repo.update(&next)?;
        shared.interval = next;
        debug!(id = shared.interval.id, "interval paused");
        self.wake.notify_one();
        Ok(shared.interval.clone())
    }

    /// `Paused -> Running`.
    ///
    /// # Errors
    /// `IntervalCompleted` once done or cancelled, `InvalidState` from any
    /// other state but `Paused`, `IntervalNotRunning` when no countdown is
    /// active, or the store's error.
    pub fn resume(&self) -> Result<Interval> {
        let mut shared = lock(&self.shared);
        shared.interval.ensure_not_finished()?;
        if shared.interval.state != IntervalState::Paused {
            return Err(CoreError::InvalidState {
                state: shared.interval.state,
                operation: "resume",
            });
        }
        let repo = match &shared.active {
            Some(active) => Arc::clone(&active.repo),
            None => return Err(CoreError::IntervalNotRunning),
        };

        let mut next = shared.interval.clone();
        next.resume()?;
        repo.update(&next)?;
        shared.interval = next;
        if let Some(active) = shared.active.as_mut() {
            active.last_flush = Instant::now();
        }
        debug!(id = shared.interval.id, "interval resumed");
        self.wake.notify_one();
        Ok(shared.interval.clone())
    }
}
