//! Windowed queries over recent performance.
//!
//! Only sets recorded within the trailing eligibility window (12 hours) of the
//! evaluation instant are visible here, however old their workout is.

use crate::store::{exercise_from_row, set_from_row};
use crate::types::{eligibility_window, to_millis};
use crate::{ProgressionCandidate, Result, Set, Store, SummaryRow};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter};
use std::collections::BTreeMap;
use std::io::Write;

/// Millisecond bounds `[now - window, now]`
fn window_bounds(now: DateTime<Utc>) -> (i64, i64) {
    (to_millis(now - eligibility_window()), to_millis(now))
}

impl Store {
    /// Recent sets of the user's newest workout
    pub fn workout_summary(&self, user_id: i64) -> Result<Vec<SummaryRow>> {
        self.workout_summary_at(user_id, Utc::now())
    }

    /// Joined (workout, exercise, set) rows for the user's most recently
    /// created workout, limited to sets inside the window ending at `now`
    ///
    /// Ordered by exercise name, then by when the set was performed. When
    /// several workouts share the newest `created_at`, the one inserted last
    /// (highest id) is used.
    pub fn workout_summary_at(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<SummaryRow>> {
        let (since, until) = window_bounds(now);

        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT w.workout_id, w.name AS workout_name,
                        e.exercise_id, e.name AS exercise_name,
                        s.weight, s.reps, s.created_at
                 FROM workouts w
                 JOIN exercises e ON e.workout_id = w.workout_id
                 JOIN sets s ON s.exercise_id = e.exercise_id
                 WHERE w.workout_id = (
                        SELECT workout_id FROM workouts
                        WHERE user_id = ?1
                        ORDER BY created_at DESC, workout_id DESC
                        LIMIT 1
                     )
                   AND s.created_at >= ?2
                   AND s.created_at <= ?3
                 ORDER BY e.name, s.created_at, s.set_id",
            )?;
            let rows = stmt
                .query_map(params![user_id, since, until], |row| {
                    Ok(SummaryRow {
                        workout_id: row.get("workout_id")?,
                        workout_name: row.get("workout_name")?,
                        exercise_id: row.get("exercise_id")?,
                        exercise_name: row.get("exercise_name")?,
                        weight: row.get("weight")?,
                        reps: row.get("reps")?,
                        performed_at: crate::types::from_millis(row.get("created_at")?),
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        tracing::debug!("Summary for user {}: {} rows", user_id, rows.len());
        Ok(rows)
    }

    /// Exercises with sets inside the current window
    pub fn progression_candidates(&self, user_id: i64) -> Result<Vec<ProgressionCandidate>> {
        self.progression_candidates_at(user_id, Utc::now())
    }

    /// Every exercise of the user that has at least one set inside the
    /// window ending at `now`, paired with exactly those in-window sets
    ///
    /// Two reads: first the in-window sets across all of the user's
    /// workouts, then the distinct exercises those sets belong to.
    pub fn progression_candidates_at(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProgressionCandidate>> {
        let (since, until) = window_bounds(now);

        let candidates = self.with_conn(|conn| {
            // Both reads see one snapshot
            let tx = conn.transaction()?;

            let sets: Vec<Set> = {
                let mut stmt = tx.prepare(
                    "SELECT s.set_id, s.exercise_id, s.weight, s.reps, s.created_at
                     FROM sets s
                     JOIN exercises e ON e.exercise_id = s.exercise_id
                     JOIN workouts w ON w.workout_id = e.workout_id
                     WHERE w.user_id = ?1
                       AND s.created_at >= ?2
                       AND s.created_at <= ?3
                     ORDER BY s.created_at, s.set_id",
                )?;
                let sets = stmt
                    .query_map(params![user_id, since, until], set_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                sets
            };

            let mut by_exercise: BTreeMap<i64, Vec<Set>> = BTreeMap::new();
            for set in sets {
                by_exercise.entry(set.exercise_id).or_default().push(set);
            }
            if by_exercise.is_empty() {
                return Ok(Vec::new());
            }

            let placeholders = vec!["?"; by_exercise.len()].join(", ");
            let mut stmt = tx.prepare(&format!(
                "SELECT exercise_id, workout_id, name, current_weight,
                        target_sets, target_reps, weight_modifier
                 FROM exercises
                 WHERE exercise_id IN ({})
                 ORDER BY exercise_id",
                placeholders
            ))?;
            let exercises = stmt
                .query_map(params_from_iter(by_exercise.keys()), exercise_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let candidates = exercises
                .into_iter()
                .map(|exercise| {
                    let sets = by_exercise
                        .remove(&exercise.exercise_id)
                        .unwrap_or_default();
                    ProgressionCandidate { exercise, sets }
                })
                .collect();
            Ok(candidates)
        })?;

        tracing::debug!(
            "User {} has {} progression candidates",
            user_id,
            candidates.len()
        );
        Ok(candidates)
    }
}

/// Write summary rows as CSV with a header line
pub fn write_summary_csv<W: Write>(rows: &[SummaryRow], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
