//! Set recording primitives.
//!
//! Sets are written once and never modified; they disappear only when their
//! exercise (or its workout) is deleted.

use crate::store::set_from_row;
use crate::types::to_millis;
use crate::{Error, Result, Set, Store};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

impl Store {
    /// Record a completed set performed now
    pub fn record_set(&self, exercise_id: i64, weight: f64, reps: i64) -> Result<i64> {
        self.record_set_at(exercise_id, weight, reps, Utc::now())
    }

    /// Record a completed set with an explicit timestamp
    pub fn record_set_at(
        &self,
        exercise_id: i64,
        weight: f64,
        reps: i64,
        created_at: DateTime<Utc>,
    ) -> Result<i64> {
        let set_id = self.with_transaction("record_set", |tx| {
            let exists = tx
                .query_row(
                    "SELECT exercise_id FROM exercises WHERE exercise_id = ?1",
                    [exercise_id],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
                .is_some();
            if !exists {
                return Err(Error::NotFound(format!("exercise {}", exercise_id)));
            }

            tx.execute(
                "INSERT INTO sets (exercise_id, weight, reps, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![exercise_id, weight, reps, to_millis(created_at)],
            )?;
            Ok(tx.last_insert_rowid())
        })?;

        tracing::debug!(
            "Recorded set {} for exercise {}: {} x {}",
            set_id,
            exercise_id,
            weight,
            reps
        );
        Ok(set_id)
    }

    /// Every set recorded for an exercise, oldest first
    pub fn list_sets(&self, exercise_id: i64) -> Result<Vec<Set>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT set_id, exercise_id, weight, reps, created_at
                 FROM sets
                 WHERE exercise_id = ?1
                 ORDER BY created_at, set_id",
            )?;
            let sets = stmt
                .query_map([exercise_id], set_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(sets)
        })
    }
}
