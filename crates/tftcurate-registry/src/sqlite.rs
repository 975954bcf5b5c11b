//! `SQLite`-backed implementation of [`Registry`].
//!
//! Uses a single `Mutex<Connection>` for thread safety; cross-process
//! access is serialized by `SQLite` itself.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use tftcurate_types::error::ErrorCategory;
use tftcurate_types::ids::{CycleId, MatchId, Puuid};

use crate::backend::{ClaimOutcome, MatchStatus, Registry, StatusRow};
use crate::error::{self, RegistryError};

/// Idempotent DDL for registry tables.
const CREATE_TABLES: &str = r"
CREATE TABLE IF NOT EXISTS identifiers (
    match_id TEXT PRIMARY KEY,
    status TEXT NOT NULL,
    first_seen_cycle TEXT NOT NULL,
    completed_cycle TEXT,
    last_error_category TEXT
);

CREATE TABLE IF NOT EXISTS players (
    puuid TEXT PRIMARY KEY,
    last_seen_cycle TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_identifiers_status ON identifiers (status);
";

/// `SQLite`-backed registry.
///
/// Create with [`SqliteRegistry::open`] for file-backed persistence or
/// [`SqliteRegistry::in_memory`] for tests.
pub struct SqliteRegistry {
    conn: Mutex<Connection>,
}

impl SqliteRegistry {
    /// Open or create a registry database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] if the directory can't be created, or
    /// [`RegistryError::Sqlite`] if the database can't be opened.
    pub fn open(path: &Path) -> error::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(CREATE_TABLES)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory registry (for testing).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Sqlite`] if the in-memory database can't be
    /// initialized.
    pub fn in_memory() -> error::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(CREATE_TABLES)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the connection lock.
    fn lock_conn(&self) -> error::Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| RegistryError::LockPoisoned)
    }

    fn row_from_parts(
        status: &str,
        first_seen: Option<String>,
        completed: Option<String>,
        category: Option<String>,
    ) -> StatusRow {
        StatusRow {
            status: MatchStatus::parse(status).unwrap_or(MatchStatus::Unseen),
            first_seen_cycle: first_seen.and_then(|c| CycleId::new(c).ok()),
            completed_cycle: completed.and_then(|c| CycleId::new(c).ok()),
            last_error_category: category.as_deref().and_then(ErrorCategory::parse),
        }
    }
}

impl Registry for SqliteRegistry {
    fn status(&self, match_id: &MatchId) -> error::Result<StatusRow> {
        let conn = self.lock_conn()?;
        let result = conn.query_row(
            "SELECT status, first_seen_cycle, completed_cycle, last_error_category \
             FROM identifiers WHERE match_id = ?1",
            [match_id.as_str()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            },
        );
        match result {
            Ok((status, first_seen, completed, category)) => {
                Ok(Self::row_from_parts(&status, first_seen, completed, category))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(StatusRow::unseen()),
            Err(e) => Err(e.into()),
        }
    }

    fn claim(&self, match_id: &MatchId, cycle: &CycleId) -> error::Result<ClaimOutcome> {
        let conn = self.lock_conn()?;
        let existing = conn.query_row(
            "SELECT status, first_seen_cycle FROM identifiers WHERE match_id = ?1",
            [match_id.as_str()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        );

        match existing {
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                conn.execute(
                    "INSERT INTO identifiers (match_id, status, first_seen_cycle) \
                     VALUES (?1, ?2, ?3)",
                    rusqlite::params![
                        match_id.as_str(),
                        MatchStatus::InProgress.as_str(),
                        cycle.as_str(),
                    ],
                )?;
                Ok(ClaimOutcome::Claimed)
            }
            Ok((status, first_seen)) => match MatchStatus::parse(&status) {
                Some(MatchStatus::Complete) => Ok(ClaimOutcome::SkipComplete),
                Some(MatchStatus::InProgress) if first_seen == cycle.as_str() => {
                    Ok(ClaimOutcome::SkipInFlight)
                }
                // Incomplete, Failed, or a claim left over from an
                // interrupted earlier cycle: re-claim.
                _ => {
                    conn.execute(
                        "UPDATE identifiers SET status = ?1 WHERE match_id = ?2",
                        rusqlite::params![MatchStatus::InProgress.as_str(), match_id.as_str()],
                    )?;
                    Ok(ClaimOutcome::Claimed)
                }
            },
            Err(e) => Err(e.into()),
        }
    }

    fn complete(&self, match_id: &MatchId, cycle: &CycleId) -> error::Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO identifiers (match_id, status, first_seen_cycle, completed_cycle) \
             VALUES (?1, 'complete', ?2, ?2) \
             ON CONFLICT(match_id) DO UPDATE \
             SET status = 'complete', completed_cycle = ?2, last_error_category = NULL \
             WHERE status != 'complete'",
            rusqlite::params![match_id.as_str(), cycle.as_str()],
        )?;
        Ok(())
    }

    fn mark_incomplete(&self, match_id: &MatchId, cycle: &CycleId) -> error::Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO identifiers (match_id, status, first_seen_cycle) \
             VALUES (?1, 'incomplete', ?2) \
             ON CONFLICT(match_id) DO UPDATE SET status = 'incomplete' \
             WHERE status != 'complete'",
            rusqlite::params![match_id.as_str(), cycle.as_str()],
        )?;
        Ok(())
    }

    fn fail(&self, match_id: &MatchId, category: ErrorCategory) -> error::Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "UPDATE identifiers \
             SET status = 'failed', last_error_category = ?1 \
             WHERE match_id = ?2 AND status != 'complete'",
            rusqlite::params![category.as_str(), match_id.as_str()],
        )?;
        Ok(())
    }

    fn seen_player(&self, puuid: &Puuid, cycle: &CycleId) -> error::Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO players (puuid, last_seen_cycle) VALUES (?1, ?2) \
             ON CONFLICT(puuid) DO UPDATE SET last_seen_cycle = ?2",
            rusqlite::params![puuid.as_str(), cycle.as_str()],
        )?;
        Ok(())
    }

    fn counts_by_status(&self) -> error::Result<BTreeMap<MatchStatus, u64>> {
        let conn = self.lock_conn()?;
        let mut stmt =
            conn.prepare("SELECT status, COUNT(*) FROM identifiers GROUP BY status")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let (status, count) = row?;
            if let Some(status) = MatchStatus::parse(&status) {
                #[allow(clippy::cast_sign_loss)]
                counts.insert(status, count as u64);
            }
        }
        Ok(counts)
    }
}
