//! # pomo Core Library
//!
//! This library provides the core logic of the pomo interactive Pomodoro
//! timer: deciding which interval comes next, running its countdown, and
//! recording every transition in a pluggable store.
//!
//! ## Architecture
//!
//! - **Interval**: the record for one timer run and its transition rules
//! - **Selector**: picks the next category from persisted history
//! - **Runner**: a tick-polled state machine with pause/resume/cancel that
//!   reports progress through three callbacks
//! - **Storage**: the `Repository` contract with in-memory and SQLite
//!   implementations, plus TOML settings
//!
//! ## Key Components
//!
//! - [`get_interval`]: next-interval selection
//! - [`IntervalRunner`]: countdown state machine
//! - [`Repository`]: storage contract
//! - [`IntervalConfig`]: durations and storage handle

pub mod config;
pub mod error;
pub mod events;
pub mod interval;
pub mod selector;
pub mod storage;
pub mod timer;

pub use config::IntervalConfig;
pub use error::{ConfigError, CoreError, DatabaseError, Result};
pub use events::Event;
pub use interval::{Category, Interval, IntervalState};
pub use selector::{get_interval, next_category};
pub use storage::{InMemoryRepository, Repository, Settings, SqliteRepository};
pub use timer::{Clock, IntervalRunner, ManualClock, RunnerHandle, SystemClock};
