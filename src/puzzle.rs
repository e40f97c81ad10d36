//! Puzzle and stats records, the stats patch, and decode errors.

use serde::{Deserialize, Serialize};

use crate::types::{Cell, Difficulty, GRID_CELLS};

/// Failure to decode one puzzle entry from a feed batch or a stored row.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Feed count promised more entries than the payload carries.
    #[error("feed declared {declared} entries but carried {present}")]
    MissingEntries {
        /// Count claimed by the feed.
        declared: usize,
        /// Entries actually present.
        present: usize,
    },
    /// Entry has no key array.
    #[error("feed entry {index} has no key")]
    MissingKey {
        /// Entry index within the batch.
        index: usize,
    },
    /// Entry has no difficulty tag.
    #[error("feed entry {index} has no difficulty")]
    MissingDifficulty {
        /// Entry index within the batch.
        index: usize,
    },
    /// Key text is not a JSON array of small integers.
    #[error("key is not a valid json array: {0}")]
    Json(#[from] serde_json::Error),
    /// Key does not have exactly 81 cells.
    #[error("key has {len} cells, expected 81")]
    WrongLength {
        /// Observed cell count.
        len: usize,
    },
    /// A cell holds something other than 0..=9.
    #[error("cell {index} holds {value}, expected 0..=9")]
    CellOutOfRange {
        /// Cell position in row-major order.
        index: usize,
        /// Offending value.
        value: Cell,
    },
    /// Tag is not one of easy, medium, hard, expert.
    #[error("unknown difficulty tag {0:?}")]
    UnknownDifficulty(String),
}

/// Row-major 9x9 grid, validated to 81 cells of 0..=9.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Cell>", into = "Vec<Cell>")]
pub struct PuzzleKey(Vec<Cell>);

impl PuzzleKey {
    /// Parses the compact JSON array form, e.g. `[5,3,0,...]`.
    pub fn from_json(text: &str) -> Result<Self, DecodeError> {
        let cells: Vec<Cell> = serde_json::from_str(text)?;
        Self::try_from(cells)
    }

    /// Renders the compact JSON array form.
    pub fn to_json(&self) -> String {
        let cells: Vec<String> = self.0.iter().map(Cell::to_string).collect();
        format!("[{}]", cells.join(","))
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.0
    }

    /// Count of blank cells.
    pub fn blanks(&self) -> usize {
        self.0.iter().filter(|c| **c == 0).count()
    }
}

impl TryFrom<Vec<Cell>> for PuzzleKey {
    type Error = DecodeError;

    fn try_from(cells: Vec<Cell>) -> Result<Self, Self::Error> {
        if cells.len() != GRID_CELLS {
            return Err(DecodeError::WrongLength { len: cells.len() });
        }
        if let Some((index, value)) = cells.iter().copied().enumerate().find(|(_, v)| *v > 9) {
            return Err(DecodeError::CellOutOfRange { index, value });
        }
        Ok(Self(cells))
    }
}

impl From<PuzzleKey> for Vec<Cell> {
    fn from(key: PuzzleKey) -> Self {
        key.0
    }
}

/// One cached puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PuzzleRecord {
    /// Starting grid.
    pub key: PuzzleKey,
    /// Difficulty tier.
    pub difficulty: Difficulty,
}

impl PuzzleRecord {
    /// Builds a record from already-validated parts.
    pub fn new(key: PuzzleKey, difficulty: Difficulty) -> Self {
        Self { key, difficulty }
    }

    /// Decodes a record from its persisted or fed text form.
    pub fn decode(key_json: &str, difficulty: &str) -> Result<Self, DecodeError> {
        Ok(Self {
            key: PuzzleKey::from_json(key_json)?,
            difficulty: difficulty.parse()?,
        })
    }
}

/// Aggregate player statistics, stored as a single row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsRecord {
    /// Best score reached.
    pub high_score: u32,
    /// Best completion time; format is owned by the caller.
    pub best_time: String,
    /// Races won.
    pub races_won: u32,
    /// Races lost.
    pub races_lost: u32,
}

/// Sparse patch where each `Some` field overwrites the stored value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsPatch {
    /// Optional replacement for high score.
    pub high_score: Option<u32>,
    /// Optional replacement for best time.
    pub best_time: Option<String>,
    /// Optional replacement for races won.
    pub races_won: Option<u32>,
    /// Optional replacement for races lost.
    pub races_lost: Option<u32>,
}

impl StatsPatch {
    /// Returns true when no fields are set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies this patch in place to `rec`.
    pub fn apply_to(&self, rec: &mut StatsRecord) {
        if let Some(v) = self.high_score {
            rec.high_score = v;
        }
        if let Some(v) = &self.best_time {
            rec.best_time = v.clone();
        }
        if let Some(v) = self.races_won {
            rec.races_won = v;
        }
        if let Some(v) = self.races_lost {
            rec.races_lost = v;
        }
    }
}
