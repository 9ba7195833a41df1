pub mod config;
pub mod history;
pub mod timer;

use std::path::PathBuf;
use std::sync::Arc;

use pomo_core::storage::{self, StorageBackend};
use pomo_core::{Repository, Settings};

/// Settings and storage shared by every command.
pub struct Context {
    pub settings: Settings,
    pub settings_path: PathBuf,
}

impl Context {
    pub fn load(path: Option<PathBuf>, memory: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let settings_path = match path {
            Some(path) => path,
            None => Settings::path()?,
        };
        let mut settings = Settings::load_from(&settings_path)?;
        if memory {
            settings.storage.backend = StorageBackend::Memory;
        }
        Ok(Self {
            settings,
            settings_path,
        })
    }

    pub fn repo(&self) -> Result<Arc<dyn Repository>, Box<dyn std::error::Error>> {
        Ok(storage::open_repository(&self.settings)?)
    }
}
