//! Feed payloads consumed by the listener and outcomes it broadcasts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::puzzle::PuzzleRecord;

/// One puzzle as delivered by the feed, not yet validated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeedEntry {
    /// 81-cell grid, either a JSON array or a string holding one.
    #[serde(default)]
    pub key: Option<Value>,
    /// Difficulty tag.
    #[serde(default)]
    pub difficulty: Option<String>,
}

impl From<&PuzzleRecord> for FeedEntry {
    fn from(rec: &PuzzleRecord) -> Self {
        Self {
            key: Some(Value::from(rec.key.cells().to_vec())),
            difficulty: Some(rec.difficulty.as_str().to_string()),
        }
    }
}

/// A "new puzzle batch" notification from the feed producer.
///
/// A missing or negative `count` means the batch carries no puzzles; applying
/// it clears the catalog.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeedEvent {
    /// Number of puzzles in the batch.
    #[serde(default)]
    pub count: Option<i64>,
    /// Entries indexed `0..count`.
    #[serde(default)]
    pub entries: Vec<FeedEntry>,
}

impl FeedEvent {
    /// Batch carrying exactly `puzzles`.
    pub fn from_puzzles(puzzles: &[PuzzleRecord]) -> Self {
        Self {
            count: Some(puzzles.len() as i64),
            entries: puzzles.iter().map(FeedEntry::from).collect(),
        }
    }

    /// Parses a JSON-encoded notification.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Count of entries the listener will attempt; 0 for the missing sentinel.
    pub fn declared_count(&self) -> usize {
        match self.count {
            Some(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX),
            _ => 0,
        }
    }
}

/// Events broadcast by the refresh listener after each batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshEvent {
    /// The catalog now holds exactly the decoded puzzles.
    CatalogReplaced {
        /// Puzzles written.
        stored: usize,
        /// Declared entries dropped for failing to decode or being absent.
        skipped: usize,
    },
    /// The store rejected the replacement; the previous catalog is intact.
    ReplaceFailed {
        /// Error text.
        reason: String,
    },
}
