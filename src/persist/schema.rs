use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{StoreError, StoreResult};

/// Schema version written to `PRAGMA user_version` by this build.
pub const SCHEMA_VERSION: u32 = 1;

const CREATE_PUZZLE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS puzzle (
    key TEXT,
    difficulty TEXT
)
"#;

const CREATE_STATS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS stats (
    highscore INTEGER,
    besttime TEXT,
    raceswon INTEGER,
    raceslost INTEGER
)
"#;

const DROP_TABLES: &str = "DROP TABLE IF EXISTS puzzle; DROP TABLE IF EXISTS stats;";

const SEED_DEFAULT_STATS: &str = r#"
INSERT INTO stats (highscore, besttime, raceswon, raceslost)
SELECT 0, '', 0, 0 WHERE NOT EXISTS (SELECT 1 FROM stats)
"#;

/// One-time work run right after the tables are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedHook {
    /// Leave both tables empty.
    #[default]
    None,
    /// Insert a zeroed stats row.
    DefaultStats,
}

impl SeedHook {
    fn run(self, conn: &Connection) -> rusqlite::Result<()> {
        match self {
            SeedHook::None => Ok(()),
            SeedHook::DefaultStats => conn.execute(SEED_DEFAULT_STATS, []).map(|_| ()),
        }
    }
}

/// Result of [`SchemaManager::ensure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOutcome {
    /// Fresh database; tables created.
    Created {
        /// Version now recorded.
        version: u32,
    },
    /// Tables already at the expected version.
    Ready {
        /// Version recorded.
        version: u32,
    },
    /// Older version found; tables dropped and recreated, all rows lost.
    Upgraded {
        /// Version found on disk.
        from: u32,
        /// Version now recorded.
        to: u32,
    },
}

/// Creates, recreates, and drops the puzzle and stats tables.
///
/// Upgrades are destructive: any version bump drops both tables. There is no
/// data-preserving migration path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaManager {
    version: u32,
    seed: SeedHook,
}

impl Default for SchemaManager {
    fn default() -> Self {
        Self::new(SCHEMA_VERSION, SeedHook::None)
    }
}

impl SchemaManager {
    /// Manager targeting `version` (at least 1).
    pub fn new(version: u32, seed: SeedHook) -> Self {
        Self {
            version: version.max(1),
            seed,
        }
    }

    /// Target version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Reads the version recorded in the database header.
    pub fn recorded_version(conn: &Connection) -> StoreResult<u32> {
        let v: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        Ok(v)
    }

    /// Brings the database to the target version in one transaction.
    pub fn ensure(&self, conn: &mut Connection) -> StoreResult<SchemaOutcome> {
        let found = Self::recorded_version(conn)?;
        if found > self.version {
            return Err(StoreError::SchemaTooNew {
                found,
                supported: self.version,
            });
        }

        let tx = conn.transaction()?;
        let outcome = if found == 0 {
            create_tables(&tx)?;
            self.seed.run(&tx)?;
            SchemaOutcome::Created {
                version: self.version,
            }
        } else if found == self.version {
            create_tables(&tx)?;
            SchemaOutcome::Ready {
                version: self.version,
            }
        } else {
            warn!(
                from = found,
                to = self.version,
                "schema upgrade drops puzzle and stats tables; cached puzzles and stats are lost"
            );
            tx.execute_batch(DROP_TABLES)?;
            create_tables(&tx)?;
            self.seed.run(&tx)?;
            SchemaOutcome::Upgraded {
                from: found,
                to: self.version,
            }
        };
        tx.pragma_update(None, "user_version", self.version)?;
        tx.commit()?;

        match outcome {
            SchemaOutcome::Created { version } => info!(version, "created puzzle and stats tables"),
            SchemaOutcome::Upgraded { from, to } => info!(from, to, "recreated puzzle and stats tables"),
            SchemaOutcome::Ready { .. } => {}
        }
        Ok(outcome)
    }

    /// Drops both tables and resets the recorded version to 0.
    pub fn destroy(&self, conn: &mut Connection) -> StoreResult<()> {
        let tx = conn.transaction()?;
        tx.execute_batch(DROP_TABLES)?;
        tx.pragma_update(None, "user_version", 0u32)?;
        tx.commit()?;
        warn!("dropped puzzle and stats tables");
        Ok(())
    }
}

fn create_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(CREATE_PUZZLE_TABLE, [])?;
    conn.execute(CREATE_STATS_TABLE, [])?;
    Ok(())
}
