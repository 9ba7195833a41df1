//! TOML-based application settings.
//!
//! Stores:
//! - Planned durations for each interval category
//! - Long-break cadence
//! - Storage backend selection
//! - Countdown tick period
//!
//! Settings are stored at `~/.config/pomo/config.toml`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{data_dir, Repository};
use crate::config::IntervalConfig;
use crate::error::{ConfigError, Result};

/// Planned durations, in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationSettings {
    #[serde(default = "default_pomodoro_min")]
    pub pomodoro_min: u32,
    #[serde(default = "default_short_break_min")]
    pub short_break_min: u32,
    #[serde(default = "default_long_break_min")]
    pub long_break_min: u32,
    #[serde(default = "default_long_break_every")]
    pub long_break_every: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Database file; defaults to `<data_dir>/pomo.db`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

/// Application settings.
///
/// Serialized to/from TOML at `~/.config/pomo/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub durations: DurationSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub timer: TimerSettings,
}

// Default functions
fn default_pomodoro_min() -> u32 {
    25
}
fn default_short_break_min() -> u32 {
    5
}
fn default_long_break_min() -> u32 {
    15
}
fn default_long_break_every() -> u32 {
    4
}
fn default_tick_ms() -> u64 {
    1000
}

impl Default for DurationSettings {
    fn default() -> Self {
        Self {
            pomodoro_min: default_pomodoro_min(),
            short_break_min: default_short_break_min(),
            long_break_min: default_long_break_min(),
            long_break_every: default_long_break_every(),
        }
    }
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

impl Settings {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|e| invalid(format!("'{value}' is not a whole number: {e}")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default settings file location.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from `path`, writing defaults there if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the defaults cannot be written.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let settings: Settings = toml::from_str(&content)
                    .map_err(|e| ConfigError::ParseFailed(format!("{}: {e}", path.display())))?;
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let settings = Self::default();
                settings.save_to(path)?;
                Ok(settings)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be serialized or written.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => Some(String::new()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Resolve into the config the selector and runner consume.
    pub fn interval_config(&self, repo: Arc<dyn Repository>) -> IntervalConfig {
        let minutes = |m: u32| chrono::Duration::minutes(i64::from(m));
        IntervalConfig::new(
            repo,
            minutes(self.durations.pomodoro_min),
            minutes(self.durations.short_break_min),
            minutes(self.durations.long_break_min),
        )
        .with_long_break_every(self.durations.long_break_every)
        .with_tick_period(Duration::from_millis(self.timer.tick_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryRepository;

    #[test]
    fn default_settings_roundtrip() {
        let cfg = Settings::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Settings = toml::from_str("[durations]\npomodoro_min = 50\n").unwrap();
        assert_eq!(parsed.durations.pomodoro_min, 50);
        assert_eq!(parsed.durations.short_break_min, 5);
        assert_eq!(parsed.storage.backend, StorageBackend::Sqlite);
        assert_eq!(parsed.timer.tick_ms, 1000);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Settings::default();
        assert_eq!(cfg.get("durations.pomodoro_min").as_deref(), Some("25"));
        assert_eq!(cfg.get("storage.backend").as_deref(), Some("sqlite"));
        assert!(cfg.get("durations.missing").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_number_and_enum() {
        let mut cfg = Settings::default();
        cfg.set("durations.long_break_min", "20").unwrap();
        cfg.set("storage.backend", "memory").unwrap();
        assert_eq!(cfg.durations.long_break_min, 20);
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn set_storage_path() {
        let mut cfg = Settings::default();
        assert_eq!(cfg.get("storage.path").as_deref(), Some(""));
        cfg.set("storage.path", "/tmp/pomo.db").unwrap();
        assert_eq!(cfg.storage.path, Some(PathBuf::from("/tmp/pomo.db")));
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Settings::default();
        let err = cfg.set("durations.nope", "1").unwrap_err();
        assert!(matches!(
            err,
            crate::CoreError::Config(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.set("durations", "1").is_err());
    }

    #[test]
    fn set_rejects_bad_values() {
        let mut cfg = Settings::default();
        assert!(cfg.set("durations.pomodoro_min", "soon").is_err());
        assert!(cfg.set("storage.backend", "postgres").is_err());
        assert_eq!(cfg, Settings::default());
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Settings::load_from(&path).unwrap();
        assert_eq!(cfg, Settings::default());
        assert!(path.exists());
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "durations = 3 = 4").unwrap();
        assert!(matches!(
            Settings::load_from(&path),
            Err(crate::CoreError::Config(ConfigError::ParseFailed(_)))
        ));
    }

    #[test]
    fn interval_config_uses_minutes_and_fallbacks() {
        let mut cfg = Settings::default();
        cfg.durations.pomodoro_min = 50;
        cfg.durations.short_break_min = 0;
        cfg.timer.tick_ms = 250;
        let ic = cfg.interval_config(Arc::new(InMemoryRepository::new()));
        assert_eq!(ic.pomodoro_duration, Duration::from_secs(50 * 60));
        assert_eq!(ic.short_break_duration, Duration::from_secs(5 * 60));
        assert_eq!(ic.tick_period, Duration::from_millis(250));
        assert_eq!(ic.long_break_every, 4);
    }
}
