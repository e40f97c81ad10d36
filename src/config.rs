//! Store and refresh-listener configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::persist::schema::{SCHEMA_VERSION, SeedHook};

/// What a stats update does when no stats row exists yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsPolicy {
    /// Insert a zeroed row, then apply the update.
    #[default]
    CreateOnFirstUpdate,
    /// Leave the table empty; the update is a logged no-op.
    RequireRow,
}

/// Options for [`crate::persist::sqlite::SqliteStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file. `None` opens an in-memory database.
    pub path: Option<PathBuf>,
    /// Schema version the store expects; an older file is recreated.
    pub schema_version: u32,
    /// Hook run after the tables are (re)created.
    pub seed: SeedHook,
    /// Missing-row behaviour for stats updates.
    pub stats_policy: StatsPolicy,
    /// SQLite busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
    /// Use WAL journaling for file databases.
    pub wal: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            schema_version: SCHEMA_VERSION,
            seed: SeedHook::None,
            stats_policy: StatsPolicy::default(),
            busy_timeout_ms: 5_000,
            wal: true,
        }
    }
}

impl StoreConfig {
    /// Config for a file-backed store at `path`, other fields defaulted.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Parses a TOML document; absent keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Options for [`crate::runtime::listener::spawn_refresh_listener`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Feed batches that may wait before `deliver` applies backpressure.
    pub feed_queue_bound: usize,
    /// Capacity of the outcome broadcast.
    pub event_capacity: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            feed_queue_bound: 8,
            event_capacity: 64,
        }
    }
}
