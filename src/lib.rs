//! Device-local Sudoku puzzle catalog and player stats, backed by SQLite.
//!
//! Puzzles are cached per difficulty tier and replaced wholesale whenever the
//! external feed pushes a new batch; a single stats row tracks high score,
//! best time, and race results.
//!
//! # Examples
//!
//! Direct store usage:
//! ```
//! use sudoku_cache::{
//!     persist::sqlite::SqliteStore,
//!     puzzle::{PuzzleKey, PuzzleRecord},
//!     types::Difficulty,
//! };
//!
//! let store = SqliteStore::open_in_memory().expect("open");
//! let key = PuzzleKey::try_from(vec![0u8; 81]).expect("key");
//! store
//!     .replace_all(&[PuzzleRecord::new(key, Difficulty::Easy)])
//!     .expect("replace");
//!
//! let pick = store.pick_random(Difficulty::Easy).expect("pick");
//! assert_eq!(pick.difficulty, Difficulty::Easy);
//! assert!(store.pick_random(Difficulty::Expert).unwrap_err().is_not_found());
//! ```
//!
//! Feed-driven refresh:
//! ```no_run
//! use sudoku_cache::{
//!     config::RefreshConfig,
//!     persist::sqlite::SqliteStore,
//!     runtime::{events::FeedEvent, listener::spawn_refresh_listener},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = SqliteStore::open("puzzles.db").expect("open sqlite");
//! let handle = spawn_refresh_listener(store.clone(), RefreshConfig::default());
//! let json = r#"{"count": 1, "entries": [{"key": "[0,0,0]", "difficulty": "easy"}]}"#;
//! let outcome = handle
//!     .refresh(FeedEvent::from_json(json).expect("json"))
//!     .await
//!     .expect("refresh");
//! assert_eq!(outcome.skipped, 1);
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Store and listener configuration.
pub mod config;
/// Selection helpers over decoded puzzles.
pub mod core;
/// Storage errors, schema management, and the SQLite store.
pub mod persist;
/// Puzzle and stats records.
pub mod puzzle;
/// Feed refresh listener and events.
pub mod runtime;
/// Shared primitive types and enums.
pub mod types;
