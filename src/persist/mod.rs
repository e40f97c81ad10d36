//! Storage errors, the catalog write seam, and the SQLite store.

/// Table lifecycle and version handling.
pub mod schema;
/// SQLite-backed puzzle and stats store.
pub mod sqlite;

use crate::{
    puzzle::PuzzleRecord,
    types::Difficulty,
};

/// What a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFound {
    /// The stats table has no row.
    Stats,
    /// No puzzle is stored for this tier.
    Tier(Difficulty),
}

/// Errors surfaced by the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Typed absence; callers are expected to handle it.
    #[error("not found: {0:?}")]
    NotFound(NotFound),
    /// Underlying SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Filesystem failure while preparing the database path.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// File was written by a newer schema than this build understands.
    #[error("database schema v{found} is newer than supported v{supported}")]
    SchemaTooNew {
        /// Version stored in the file.
        found: u32,
        /// Version this store expects.
        supported: u32,
    },
    /// A thread panicked while holding the connection.
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// True for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Write side of the catalog used by the refresh path.
pub trait PuzzleSink: Send + Sync {
    /// Replaces the whole catalog with `puzzles` atomically.
    fn replace_all(&self, puzzles: &[PuzzleRecord]) -> StoreResult<()>;
}
