//! Interval persistence.
//!
//! [`Repository`] is the only thing the selector and runner know about
//! storage. Two implementations ship with the crate: [`InMemoryRepository`]
//! for tests and throwaway runs, and the SQLite-backed [`SqliteRepository`].

mod config;
pub mod database;
pub mod memory;

pub use config::{DurationSettings, Settings, StorageBackend, StorageSettings, TimerSettings};
pub use database::SqliteRepository;
pub use memory::InMemoryRepository;

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;
use crate::interval::Interval;

/// Capability set required of any backing store.
///
/// Implementations must make `create`/`update` atomic with respect to each
/// other; both shipped stores serialize through a mutex.
pub trait Repository: Send + Sync {
    /// Persist a new interval and return its id. Ids are positive and never reused.
    fn create(&self, interval: &Interval) -> Result<i64>;

    /// Overwrite the record with `interval.id`. `InvalidId` if there is none.
    fn update(&self, interval: &Interval) -> Result<()>;

    /// `InvalidId` if not found.
    fn by_id(&self, id: i64) -> Result<Interval>;

    /// Most recently created interval. `NoIntervals` on an empty store.
    fn last(&self) -> Result<Interval>;

    /// Up to `n` most recent break intervals, most recent first.
    fn breaks(&self, n: usize) -> Result<Vec<Interval>>;
}

/// Returns `~/.config/pomo[-dev]/` based on POMO_ENV.
///
/// Set POMO_ENV=dev to use the development data directory, or
/// POMO_CONFIG_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("POMO_CONFIG_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMO_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomo-dev")
            } else {
                base_dir.join("pomo")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Open the store selected in `settings`.
///
/// # Errors
/// Returns an error if the SQLite file cannot be opened or migrated.
pub fn open_repository(settings: &Settings) -> Result<Arc<dyn Repository>> {
    match settings.storage.backend {
        StorageBackend::Memory => Ok(Arc::new(InMemoryRepository::new())),
        StorageBackend::Sqlite => {
            let path = match &settings.storage.path {
                Some(path) => path.clone(),
                None => data_dir()?.join("pomo.db"),
            };
            Ok(Arc::new(SqliteRepository::open(path)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_memory_backend() {
        let mut settings = Settings::default();
        settings.storage.backend = StorageBackend::Memory;
        let repo = open_repository(&settings).unwrap();
        assert!(matches!(repo.last(), Err(crate::CoreError::NoIntervals)));
    }

    #[test]
    fn open_sqlite_backend_at_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.storage.path = Some(dir.path().join("history.db"));
        let repo = open_repository(&settings).unwrap();
        let id = repo
            .create(&Interval::new(
                crate::Category::Pomodoro,
                std::time::Duration::from_secs(60),
            ))
            .unwrap();
        assert_eq!(id, 1);
        assert!(dir.path().join("history.db").exists());
    }
}
