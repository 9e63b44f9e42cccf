//! Workout persistence: atomic create, update, and delete of a workout
//! together with its exercise list.

use crate::store::{exercise_from_row, workout_from_row};
use crate::types::to_millis;
use crate::{Error, Exercise, NewExercise, Result, Store, Workout, WorkoutUpdate};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

/// Rows per INSERT statement; keeps bound parameters far below SQLite's limit
const MAX_ROWS_PER_STATEMENT: usize = 500;

const EXERCISE_COLUMNS: [&str; 6] = [
    "workout_id",
    "name",
    "current_weight",
    "target_sets",
    "target_reps",
    "weight_modifier",
];

/// Parameterized multi-row INSERT for a workout's exercises
///
/// Every value is bound positionally; nothing from the request is ever
/// spliced into the SQL text.
struct ExerciseBatch<'a> {
    workout_id: i64,
    exercises: &'a [NewExercise],
}

impl<'a> ExerciseBatch<'a> {
    fn sql(&self) -> String {
        let width = EXERCISE_COLUMNS.len();
        let rows: Vec<String> = (0..self.exercises.len())
            .map(|row| {
                let placeholders: Vec<String> = (1..=width)
                    .map(|col| format!("?{}", row * width + col))
                    .collect();
                format!("({})", placeholders.join(", "))
            })
            .collect();

        format!(
            "INSERT INTO exercises ({}) VALUES {}",
            EXERCISE_COLUMNS.join(", "),
            rows.join(", ")
        )
    }

    fn values(&self) -> Vec<Value> {
        self.exercises
            .iter()
            .flat_map(|e| {
                [
                    Value::Integer(self.workout_id),
                    Value::Text(e.name.clone()),
                    Value::Real(e.current_weight),
                    Value::Integer(e.target_sets),
                    Value::Integer(e.target_reps),
                    Value::Real(e.weight_modifier),
                ]
            })
            .collect()
    }

    fn execute(&self, conn: &Connection) -> Result<usize> {
        if self.exercises.is_empty() {
            return Ok(0);
        }
        let inserted = conn.execute(&self.sql(), params_from_iter(self.values()))?;
        Ok(inserted)
    }
}

fn insert_exercises(
    conn: &Connection,
    workout_id: i64,
    exercises: &[NewExercise],
) -> Result<usize> {
    let mut inserted = 0;
    for chunk in exercises.chunks(MAX_ROWS_PER_STATEMENT) {
        inserted += ExerciseBatch {
            workout_id,
            exercises: chunk,
        }
        .execute(conn)?;
    }
    Ok(inserted)
}

fn workout_exists(conn: &Connection, workout_id: i64) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT workout_id FROM workouts WHERE workout_id = ?1",
            [workout_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

impl Store {
    /// Create a workout and all of its exercises as one unit
    ///
    /// Returns the new workout id. If any exercise row is rejected by the
    /// store, neither the workout nor any of its exercises persist.
    pub fn create_workout(
        &self,
        user_id: i64,
        name: &str,
        exercises: &[NewExercise],
    ) -> Result<i64> {
        self.create_workout_at(user_id, name, exercises, Utc::now())
    }

    /// [`Store::create_workout`] with an explicit creation time
    pub fn create_workout_at(
        &self,
        user_id: i64,
        name: &str,
        exercises: &[NewExercise],
        created_at: DateTime<Utc>,
    ) -> Result<i64> {
        let workout_id = self.with_transaction("create_workout", |tx| {
            tx.execute(
                "INSERT INTO workouts (user_id, name, created_at) VALUES (?1, ?2, ?3)",
                params![user_id, name, to_millis(created_at)],
            )?;
            let workout_id = tx.last_insert_rowid();
            insert_exercises(tx, workout_id, exercises)?;
            Ok(workout_id)
        })?;

        tracing::info!(
            "Created workout {} ({:?}) for user {} with {} exercises",
            workout_id,
            name,
            user_id,
            exercises.len()
        );
        Ok(workout_id)
    }

    /// All workouts owned by `user_id`, oldest first
    pub fn list_workouts(&self, user_id: i64) -> Result<Vec<Workout>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT workout_id, user_id, name, created_at
                 FROM workouts
                 WHERE user_id = ?1
                 ORDER BY workout_id",
            )?;
            let workouts = stmt
                .query_map([user_id], workout_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(workouts)
        })
    }

    /// Look up a single workout
    pub fn get_workout(&self, workout_id: i64) -> Result<Workout> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT workout_id, user_id, name, created_at
                 FROM workouts
                 WHERE workout_id = ?1",
                [workout_id],
                workout_from_row,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("workout {}", workout_id)))
        })
    }

    /// Exercises belonging to `workout_id`, in insertion order
    pub fn list_exercises(&self, workout_id: i64) -> Result<Vec<Exercise>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT exercise_id, workout_id, name, current_weight,
                        target_sets, target_reps, weight_modifier
                 FROM exercises
                 WHERE workout_id = ?1
                 ORDER BY exercise_id",
            )?;
            let exercises = stmt
                .query_map([workout_id], exercise_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(exercises)
        })
    }

    /// Rename a workout and/or replace its exercise list, atomically
    ///
    /// Fails with `Error::NotFound` when the workout does not exist, in
    /// which case nothing (not even the rename) is written. A present but
    /// empty exercise list leaves the current exercises untouched.
    pub fn update_workout(&self, workout_id: i64, update: &WorkoutUpdate) -> Result<()> {
        let replaced = self.with_transaction("update_workout", |tx| {
            if let Some(name) = &update.name {
                tx.execute(
                    "UPDATE workouts SET name = ?1 WHERE workout_id = ?2",
                    params![name, workout_id],
                )?;
            }

            if !workout_exists(tx, workout_id)? {
                return Err(Error::NotFound(format!("workout {}", workout_id)));
            }

            match update.exercises.as_deref() {
                Some(exercises) if !exercises.is_empty() => {
                    tx.execute("DELETE FROM exercises WHERE workout_id = ?1", [workout_id])?;
                    Ok(Some(insert_exercises(tx, workout_id, exercises)?))
                }
                _ => Ok(None),
            }
        })?;

        match replaced {
            Some(count) => tracing::info!(
                "Updated workout {}: replaced exercise list with {} exercises",
                workout_id,
                count
            ),
            None => tracing::info!("Updated workout {}", workout_id),
        }
        Ok(())
    }

    /// Delete a workout; its exercises and their sets go with it
    ///
    /// Deleting an id that does not exist is not an error.
    pub fn delete_workout(&self, workout_id: i64) -> Result<()> {
        let deleted = self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM workouts WHERE workout_id = ?1", [workout_id])?)
        })?;

        if deleted == 0 {
            tracing::debug!("Delete of workout {} matched no rows", workout_id);
        } else {
            tracing::info!("Deleted workout {}", workout_id);
        }
        Ok(())
    }
}
