//! SQLite-backed puzzle catalog and stats store.

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use rand::Rng;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, warn};

use crate::{
    config::{StatsPolicy, StoreConfig},
    core::select::{self, TierCounts},
    puzzle::{PuzzleRecord, StatsPatch, StatsRecord},
    types::Difficulty,
};

use super::{
    NotFound, PuzzleSink, StoreError, StoreResult,
    schema::{SchemaManager, SchemaOutcome},
};

/// Durable store for the puzzle catalog and the stats row.
///
/// Cloning yields another handle to the same connection. Every operation
/// holds the connection lock for its duration, so a reader never sees a
/// half-applied [`SqliteStore::replace_all`].
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    stats_policy: StatsPolicy,
    manager: SchemaManager,
    schema: Arc<Mutex<SchemaOutcome>>,
}

impl SqliteStore {
    /// Opens or creates a file-backed store at `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_config(&StoreConfig::at(path.as_ref()))
    }

    /// Opens an in-memory store with default options.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open_with_config(&StoreConfig::default())
    }

    /// Opens a store as described by `config` and brings its schema up to date.
    ///
    /// Any failure here is fatal; no handle is returned for a store whose
    /// tables could not be created.
    pub fn open_with_config(config: &StoreConfig) -> StoreResult<Self> {
        let mut conn = match &config.path {
            Some(path) => {
                ensure_parent_dir(path)?;
                let conn = Connection::open(path)?;
                if config.wal {
                    conn.pragma_update(None, "journal_mode", "WAL")?;
                    conn.pragma_update(None, "synchronous", "NORMAL")?;
                }
                conn
            }
            None => Connection::open_in_memory()?,
        };
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;

        let manager = SchemaManager::new(config.schema_version, config.seed);
        let schema = manager.ensure(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            stats_policy: config.stats_policy,
            manager,
            schema: Arc::new(Mutex::new(schema)),
        })
    }

    /// What the most recent schema setup did, at open or in
    /// [`SqliteStore::recreate_tables`].
    pub fn schema_outcome(&self) -> SchemaOutcome {
        *self.schema.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Every stored puzzle in storage order.
    pub fn get_all(&self) -> StoreResult<Vec<PuzzleRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key, difficulty FROM puzzle ORDER BY rowid ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, Option<String>>(0)?, row.get::<_, Option<String>>(1)?))
        })?;
        collect_puzzles(rows)
    }

    /// Puzzles of one tier in storage order; empty when none match.
    pub fn get_by_difficulty(&self, tier: Difficulty) -> StoreResult<Vec<PuzzleRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT key, difficulty FROM puzzle WHERE difficulty = ?1 ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map([tier.as_str()], |row| {
            Ok((row.get::<_, Option<String>>(0)?, row.get::<_, Option<String>>(1)?))
        })?;
        collect_puzzles(rows)
    }

    /// One puzzle of `tier`, chosen uniformly at random.
    pub fn pick_random(&self, tier: Difficulty) -> StoreResult<PuzzleRecord> {
        self.pick_random_with(tier, &mut rand::rng())
    }

    /// Same as [`SqliteStore::pick_random`] with a caller-supplied RNG.
    pub fn pick_random_with<R: Rng + ?Sized>(
        &self,
        tier: Difficulty,
        rng: &mut R,
    ) -> StoreResult<PuzzleRecord> {
        let candidates = self.get_by_difficulty(tier)?;
        select::pick_uniform(candidates, rng).ok_or(StoreError::NotFound(NotFound::Tier(tier)))
    }

    /// Number of readable puzzles.
    pub fn puzzle_count(&self) -> StoreResult<usize> {
        Ok(self.get_all()?.len())
    }

    /// Readable puzzles per tier.
    pub fn tier_counts(&self) -> StoreResult<TierCounts> {
        Ok(select::tally(&self.get_all()?))
    }

    /// Clears the catalog and inserts `puzzles`, in one transaction.
    pub fn replace_all(&self, puzzles: &[PuzzleRecord]) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM puzzle", [])?;
        {
            let mut stmt = tx.prepare("INSERT INTO puzzle (key, difficulty) VALUES (?1, ?2)")?;
            for puzzle in puzzles {
                stmt.execute(params![puzzle.key.to_json(), puzzle.difficulty.as_str()])?;
            }
        }
        tx.commit()?;
        info!(removed, inserted = puzzles.len(), "replaced puzzle catalog");
        Ok(())
    }

    /// The stats row, or [`NotFound::Stats`] when the table is empty.
    pub fn get_stats(&self) -> StoreResult<StatsRecord> {
        let conn = self.lock()?;
        read_stats(&conn)?.ok_or(StoreError::NotFound(NotFound::Stats))
    }

    /// Sets the high score, leaving other fields untouched.
    pub fn update_high_score(&self, high_score: u32) -> StoreResult<()> {
        self.update_stats(StatsPatch {
            high_score: Some(high_score),
            ..StatsPatch::default()
        })
        .map(|_| ())
    }

    /// Sets the best time, leaving other fields untouched.
    pub fn update_best_time(&self, best_time: impl Into<String>) -> StoreResult<()> {
        self.update_stats(StatsPatch {
            best_time: Some(best_time.into()),
            ..StatsPatch::default()
        })
        .map(|_| ())
    }

    /// Sets races won, leaving other fields untouched.
    pub fn update_races_won(&self, races_won: u32) -> StoreResult<()> {
        self.update_stats(StatsPatch {
            races_won: Some(races_won),
            ..StatsPatch::default()
        })
        .map(|_| ())
    }

    /// Sets races lost, leaving other fields untouched.
    pub fn update_races_lost(&self, races_lost: u32) -> StoreResult<()> {
        self.update_stats(StatsPatch {
            races_lost: Some(races_lost),
            ..StatsPatch::default()
        })
        .map(|_| ())
    }

    /// Applies `patch` to the stats row.
    ///
    /// Returns `false` when nothing was written: either the patch is empty, or
    /// no row exists under [`StatsPolicy::RequireRow`].
    pub fn update_stats(&self, patch: StatsPatch) -> StoreResult<bool> {
        if patch.is_empty() {
            return Ok(false);
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let existing = read_stats(&tx)?;
        let written = match (existing, self.stats_policy) {
            (Some(mut rec), _) => {
                patch.apply_to(&mut rec);
                tx.execute(
                    "UPDATE stats SET highscore = ?1, besttime = ?2, raceswon = ?3, raceslost = ?4",
                    params![rec.high_score, rec.best_time, rec.races_won, rec.races_lost],
                )?;
                true
            }
            (None, StatsPolicy::CreateOnFirstUpdate) => {
                let mut rec = StatsRecord::default();
                patch.apply_to(&mut rec);
                tx.execute(
                    "INSERT INTO stats (highscore, besttime, raceswon, raceslost) VALUES (?1, ?2, ?3, ?4)",
                    params![rec.high_score, rec.best_time, rec.races_won, rec.races_lost],
                )?;
                debug!("created stats row on first update");
                true
            }
            (None, StatsPolicy::RequireRow) => {
                debug!(?patch, "no stats row; update skipped");
                false
            }
        };
        tx.commit()?;
        Ok(written)
    }

    /// Drops and recreates both tables at the version this store was opened
    /// with, discarding all puzzles and stats and rerunning the seed hook.
    pub fn recreate_tables(&self) -> StoreResult<SchemaOutcome> {
        let mut conn = self.lock()?;
        self.manager.destroy(&mut conn)?;
        let outcome = self.manager.ensure(&mut conn)?;
        *self.schema.lock().map_err(|_| StoreError::Poisoned)? = outcome;
        Ok(outcome)
    }
}

impl PuzzleSink for SqliteStore {
    fn replace_all(&self, puzzles: &[PuzzleRecord]) -> StoreResult<()> {
        SqliteStore::replace_all(self, puzzles)
    }
}

fn read_stats(conn: &Connection) -> StoreResult<Option<StatsRecord>> {
    let rec = conn
        .query_row(
            "SELECT highscore, besttime, raceswon, raceslost FROM stats ORDER BY rowid ASC LIMIT 1",
            [],
            |row| {
                Ok(StatsRecord {
                    high_score: counter(row, 0, "highscore")?,
                    best_time: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    races_won: counter(row, 2, "raceswon")?,
                    races_lost: counter(row, 3, "raceslost")?,
                })
            },
        )
        .optional()?;
    Ok(rec)
}

/// Reads a stats counter, treating NULL and out-of-range values as 0.
fn counter(row: &rusqlite::Row<'_>, idx: usize, column: &str) -> rusqlite::Result<u32> {
    let Some(raw) = row.get::<_, Option<i64>>(idx)? else {
        return Ok(0);
    };
    Ok(u32::try_from(raw).unwrap_or_else(|_| {
        warn!(column, raw, "stats counter out of range, reading as 0");
        0
    }))
}

fn collect_puzzles(
    rows: impl Iterator<Item = rusqlite::Result<(Option<String>, Option<String>)>>,
) -> StoreResult<Vec<PuzzleRecord>> {
    let mut out = Vec::new();
    for (pos, row) in rows.enumerate() {
        let (key, difficulty) = row?;
        let decoded = PuzzleRecord::decode(
            key.as_deref().unwrap_or_default(),
            difficulty.as_deref().unwrap_or_default(),
        );
        match decoded {
            Ok(rec) => out.push(rec),
            Err(err) => warn!(pos, %err, "skipping unreadable puzzle row"),
        }
    }
    Ok(out)
}

fn ensure_parent_dir(path: &Path) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
