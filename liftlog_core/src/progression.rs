//! Progression: deciding which exercises earned a heavier weight, and
//! applying the increase.
//!
//! Evaluation is a pure function of an exercise and its in-window sets:
//! 1. At least `target_sets` sets were performed
//! 2. Every one of them reached `target_reps`
//! 3. Every one of them used at least `current_weight`
//!
//! A single substandard set disqualifies the exercise for this cycle.

use crate::store::{exercise_from_row, set_from_row};
use crate::types::{eligibility_window, to_millis};
use crate::{Error, Exercise, ProgressionCandidate, Result, Set, Store};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

/// True when `sets` satisfy every progression target of `exercise`
pub fn evaluate(exercise: &Exercise, sets: &[Set]) -> bool {
    if (sets.len() as i64) < exercise.target_sets {
        return false;
    }

    sets.iter().all(|set| {
        set.reps >= exercise.target_reps && set.weight >= exercise.current_weight
    })
}

/// The candidates whose sets qualify them for progression
pub fn evaluate_all(candidates: &[ProgressionCandidate]) -> Vec<Exercise> {
    candidates
        .iter()
        .filter(|candidate| {
            let eligible = evaluate(&candidate.exercise, &candidate.sets);
            tracing::debug!(
                "Exercise {} ({:?}): {} in-window sets, eligible = {}",
                candidate.exercise.exercise_id,
                candidate.exercise.name,
                candidate.sets.len(),
                eligible
            );
            eligible
        })
        .map(|candidate| candidate.exercise.clone())
        .collect()
}

fn load_exercise(conn: &Connection, exercise_id: i64) -> Result<Exercise> {
    conn.query_row(
        "SELECT exercise_id, workout_id, name, current_weight,
                target_sets, target_reps, weight_modifier
         FROM exercises
         WHERE exercise_id = ?1",
        [exercise_id],
        exercise_from_row,
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(format!("exercise {}", exercise_id)))
}

fn window_sets(conn: &Connection, exercise_id: i64, now: DateTime<Utc>) -> Result<Vec<Set>> {
    let mut stmt = conn.prepare(
        "SELECT set_id, exercise_id, weight, reps, created_at
         FROM sets
         WHERE exercise_id = ?1
           AND created_at >= ?2
           AND created_at <= ?3",
    )?;
    let sets = stmt
        .query_map(
            params![
                exercise_id,
                to_millis(now - eligibility_window()),
                to_millis(now)
            ],
            set_from_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(sets)
}

/// `current_weight += weight_modifier`, with the modifier read by the
/// UPDATE itself so a stale copy can never be applied
fn increment(conn: &Connection, exercise_id: i64) -> Result<Exercise> {
    let updated = conn.execute(
        "UPDATE exercises
         SET current_weight = current_weight + weight_modifier
         WHERE exercise_id = ?1",
        [exercise_id],
    )?;
    if updated == 0 {
        return Err(Error::NotFound(format!("exercise {}", exercise_id)));
    }
    load_exercise(conn, exercise_id)
}

impl Store {
    /// Exercises of `user_id` that currently qualify for progression
    pub fn eligible_exercises(&self, user_id: i64) -> Result<Vec<Exercise>> {
        self.eligible_exercises_at(user_id, Utc::now())
    }

    /// [`Store::eligible_exercises`] evaluated at an explicit instant
    pub fn eligible_exercises_at(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Exercise>> {
        let candidates = self.progression_candidates_at(user_id, now)?;
        let eligible = evaluate_all(&candidates);
        tracing::info!(
            "User {}: {} of {} candidate exercises eligible for progression",
            user_id,
            eligible.len(),
            candidates.len()
        );
        Ok(eligible)
    }

    /// Increase the working weight of each listed exercise by its modifier
    ///
    /// Each element of `exercise_ids` is applied once, so an id listed twice
    /// is incremented twice. The whole list is applied all-or-nothing: an
    /// unknown id fails the call with `Error::NotFound` and no exercise
    /// changes.
    ///
    /// Not idempotent. Calling this twice with the same id increments twice;
    /// callers must apply each progression decision at most once. Eligibility
    /// is not re-checked, so a set recorded after evaluation is not taken
    /// into account (see [`Store::apply_progression_verified`]).
    pub fn apply_progression(&self, exercise_ids: &[i64]) -> Result<Vec<Exercise>> {
        let updated = self.with_transaction("apply_progression", |tx| {
            exercise_ids
                .iter()
                .map(|id| increment(tx, *id))
                .collect::<Result<Vec<_>>>()
        })?;

        for exercise in &updated {
            tracing::info!(
                "Progressed exercise {} ({:?}) to {}",
                exercise.exercise_id,
                exercise.name,
                exercise.current_weight
            );
        }
        Ok(updated)
    }

    /// Like [`Store::apply_progression`], but re-evaluates eligibility
    /// against the sets in the window ending at `now`, inside the same
    /// transaction as the increments
    ///
    /// If any listed exercise no longer qualifies the call fails with
    /// `Error::NotEligible` and nothing is applied.
    pub fn apply_progression_verified(
        &self,
        exercise_ids: &[i64],
        now: DateTime<Utc>,
    ) -> Result<Vec<Exercise>> {
        let updated = self.with_transaction("apply_progression_verified", |tx| {
            for id in exercise_ids {
                let exercise = load_exercise(tx, *id)?;
                let sets = window_sets(tx, *id, now)?;
                if !evaluate(&exercise, &sets) {
                    return Err(Error::NotEligible(*id));
                }
            }
            exercise_ids
                .iter()
                .map(|id| increment(tx, *id))
                .collect::<Result<Vec<_>>>()
        })?;

        tracing::info!("Progressed {} verified exercises", updated.len());
        Ok(updated)
    }
}
