//! In-memory reference repository.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{CoreError, Result};
use crate::interval::Interval;

use super::Repository;

#[derive(Debug, Default)]
struct Inner {
    /// Keyed by id; ids are handed out in creation order, so iteration order
    /// is creation order.
    intervals: BTreeMap<i64, Interval>,
    last_id: i64,
}

/// Map from id to interval with a monotonically increasing id counter.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    inner: Mutex<Inner>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic mid-write cannot leave the map half-updated, so keep going.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Repository for InMemoryRepository {
    fn create(&self, interval: &Interval) -> Result<i64> {
        let mut inner = self.lock();
        inner.last_id += 1;
        let id = inner.last_id;
        let mut stored = interval.clone();
        stored.id = id;
        inner.intervals.insert(id, stored);
        Ok(id)
    }

    fn update(&self, interval: &Interval) -> Result<()> {
        let mut inner = self.lock();
        match inner.intervals.get_mut(&interval.id) {
            Some(stored) => {
                *stored = interval.clone();
                Ok(())
            }
            None => Err(CoreError::InvalidId(interval.id)),
        }
    }

    fn by_id(&self, id: i64) -> Result<Interval> {
        self.lock()
            .intervals
            .get(&id)
            .cloned()
            .ok_or(CoreError::InvalidId(id))
    }

    fn last(&self) -> Result<Interval> {
        self.lock()
            .intervals
            .values()
            .next_back()
            .cloned()
            .ok_or(CoreError::NoIntervals)
    }

    fn breaks(&self, n: usize) -> Result<Vec<Interval>> {
        Ok(self
            .lock()
            .intervals
            .values()
            .rev()
            .filter(|i| i.category.is_break())
            .take(n)
            .cloned()
            .collect())
    }
}
