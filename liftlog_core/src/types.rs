//! Core domain types for Liftlog.
//!
//! - Stored records (workouts, exercises, sets)
//! - Request shapes for creating and updating workouts
//! - Query results (summary rows, progression candidates)

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Trailing window of sets considered by the summary and progression queries
pub const ELIGIBILITY_WINDOW_HOURS: i64 = 12;

/// Length of the eligibility window as a chrono duration
pub fn eligibility_window() -> Duration {
    Duration::hours(ELIGIBILITY_WINDOW_HOURS)
}

// ============================================================================
// Stored records
// ============================================================================

/// A named collection of exercises owned by a user
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub workout_id: i64,
    pub user_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A movement within a workout, with its progression targets
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub exercise_id: i64,
    pub workout_id: i64,
    pub name: String,
    pub current_weight: f64,
    pub target_sets: i64,
    pub target_reps: i64,
    pub weight_modifier: f64,
}

/// One completed set of an exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Set {
    pub set_id: i64,
    pub exercise_id: i64,
    pub weight: f64,
    pub reps: i64,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Requests
// ============================================================================

/// Exercise definition supplied when creating or replacing a workout's list
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NewExercise {
    pub name: String,
    pub current_weight: f64,
    pub target_sets: i64,
    pub target_reps: i64,
    pub weight_modifier: f64,
}

/// Body of a create-workout request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewWorkout {
    pub name: String,
    pub exercises: Vec<NewExercise>,
}

/// Body of an update-workout request; absent fields are left untouched
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct WorkoutUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub exercises: Option<Vec<NewExercise>>,
}

/// Body of a record-set request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewSet {
    pub weight: f64,
    pub reps: i64,
}

/// Body of a progression request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressionRequest {
    pub exercise_ids: Vec<i64>,
    /// Re-check eligibility in the same transaction as the increment
    #[serde(default)]
    pub verify: bool,
}

// ============================================================================
// Query results
// ============================================================================

/// One joined (workout, exercise, set) row of a workout summary
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SummaryRow {
    pub workout_id: i64,
    pub workout_name: String,
    pub exercise_id: i64,
    pub exercise_name: String,
    pub weight: f64,
    pub reps: i64,
    pub performed_at: DateTime<Utc>,
}

/// An exercise together with its in-window sets, ready for evaluation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressionCandidate {
    pub exercise: Exercise,
    pub sets: Vec<Set>,
}

// ============================================================================
// Timestamp encoding
// ============================================================================

/// Timestamps are persisted as milliseconds since the Unix epoch
pub(crate) fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub(crate) fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
