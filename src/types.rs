//! Shared primitive types and the difficulty enum.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::puzzle::DecodeError;

/// Number of cells in a 9x9 grid.
pub const GRID_CELLS: usize = 81;

/// A single grid cell: 0 is blank, 1..=9 is a filled digit.
pub type Cell = u8;

/// Difficulty tier of a puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Easy tier.
    Easy,
    /// Medium tier.
    Medium,
    /// Hard tier.
    Hard,
    /// Expert tier.
    Expert,
}

impl Difficulty {
    /// Every tier, in ascending order.
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    /// Lowercase tag used on disk and in feed payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| DecodeError::UnknownDifficulty(s.to_string()))
    }
}
