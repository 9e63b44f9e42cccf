//! SQLite-backed store for workouts, exercises and sets.
//!
//! A [`Store`] is opened once per process and handed to whoever needs it.
//! Clones share the same connection; every operation checks the connection
//! out for its own scope and releases it on return. Operations that touch
//! more than one row go through [`Store::with_transaction`].

use crate::types::from_millis;
use crate::{Exercise, Result, Set, Workout};
use rusqlite::{Connection, Row, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS workouts (
    workout_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_workouts_user_created
    ON workouts (user_id, created_at);

CREATE TABLE IF NOT EXISTS exercises (
    exercise_id INTEGER PRIMARY KEY AUTOINCREMENT,
    workout_id INTEGER NOT NULL REFERENCES workouts (workout_id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    current_weight REAL NOT NULL,
    target_sets INTEGER NOT NULL CHECK (target_sets >= 0),
    target_reps INTEGER NOT NULL CHECK (target_reps >= 0),
    weight_modifier REAL NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_exercises_workout
    ON exercises (workout_id);

CREATE TABLE IF NOT EXISTS sets (
    set_id INTEGER PRIMARY KEY AUTOINCREMENT,
    exercise_id INTEGER NOT NULL REFERENCES exercises (exercise_id) ON DELETE CASCADE,
    weight REAL NOT NULL,
    reps INTEGER NOT NULL CHECK (reps >= 0),
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sets_exercise_created
    ON sets (exercise_id, created_at);
";

/// Shared handle to the Liftlog database
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (or create) the database file at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        let store = Self::from_connection(conn)?;
        tracing::info!("Opened store at {:?}", path);
        Ok(store)
    }

    /// Open a private in-memory database (tests, dry runs)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Check out the connection for the duration of `f`
    ///
    /// A poisoned lock is recovered: a panic elsewhere cannot leave a
    /// transaction open because rusqlite rolls back on drop.
    pub(crate) fn with_conn<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Connection) -> Result<R>,
    {
        let mut guard = self
            .conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    /// Run `f` inside one write transaction
    ///
    /// Commits when `f` succeeds. On any error every statement `f` issued is
    /// rolled back explicitly before the error is returned.
    pub(crate) fn with_transaction<F, R>(&self, operation: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction<'_>) -> Result<R>,
    {
        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            match f(&tx) {
                Ok(value) => {
                    tx.commit()?;
                    Ok(value)
                }
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback() {
                        tracing::error!(
                            "Rollback of {} failed: {}",
                            operation,
                            rollback_err
                        );
                    } else {
                        tracing::warn!("Rolled back {}: {}", operation, err);
                    }
                    Err(err)
                }
            }
        })
    }
}

// ============================================================================
// Row mapping
// ============================================================================

pub(crate) fn workout_from_row(row: &Row<'_>) -> rusqlite::Result<Workout> {
    Ok(Workout {
        workout_id: row.get("workout_id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        created_at: from_millis(row.get("created_at")?),
    })
}

pub(crate) fn exercise_from_row(row: &Row<'_>) -> rusqlite::Result<Exercise> {
    Ok(Exercise {
        exercise_id: row.get("exercise_id")?,
        workout_id: row.get("workout_id")?,
        name: row.get("name")?,
        current_weight: row.get("current_weight")?,
        target_sets: row.get("target_sets")?,
        target_reps: row.get("target_reps")?,
        weight_modifier: row.get("weight_modifier")?,
    })
}

pub(crate) fn set_from_row(row: &Row<'_>) -> rusqlite::Result<Set> {
    Ok(Set {
        set_id: row.get("set_id")?,
        exercise_id: row.get("exercise_id")?,
        weight: row.get("weight")?,
        reps: row.get("reps")?,
        created_at: from_millis(row.get("created_at")?),
    })
}
