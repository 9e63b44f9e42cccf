//! Request validation performed before anything reaches the store.
//!
//! The store itself only enforces what SQLite can (foreign keys, CHECK
//! constraints). Everything a caller can get wrong in a request body is
//! rejected here with `Error::Validation`.

use crate::{Error, NewExercise, NewSet, NewWorkout, ProgressionRequest, Result, WorkoutUpdate};

/// Longest accepted workout or exercise name, in characters
pub const MAX_NAME_LEN: usize = 200;

fn validate_name(what: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation(format!("{} name must not be empty", what)));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::Validation(format!(
            "{} name exceeds {} characters",
            what, MAX_NAME_LEN
        )));
    }
    Ok(())
}

fn validate_weight(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::Validation(format!("{} must be a finite number", field)));
    }
    if value < 0.0 {
        return Err(Error::Validation(format!("{} must not be negative", field)));
    }
    Ok(())
}

fn validate_count(field: &str, value: i64) -> Result<()> {
    if !(0..=u32::MAX as i64).contains(&value) {
        return Err(Error::Validation(format!(
            "{} must be between 0 and {}",
            field,
            u32::MAX
        )));
    }
    Ok(())
}

/// Validate a single exercise definition
pub fn validate_exercise(exercise: &NewExercise) -> Result<()> {
    validate_name("Exercise", &exercise.name)?;
    validate_weight("current_weight", exercise.current_weight)?;
    validate_count("target_sets", exercise.target_sets)?;
    validate_count("target_reps", exercise.target_reps)?;

    if !exercise.weight_modifier.is_finite() {
        return Err(Error::Validation(
            "weight_modifier must be a finite number".into(),
        ));
    }
    if exercise.weight_modifier < 0.0 {
        tracing::warn!(
            "Exercise {:?} has a negative weight_modifier ({}); progression will lower its weight",
            exercise.name,
            exercise.weight_modifier
        );
    }
    Ok(())
}

/// Validate a create-workout body
pub fn validate_new_workout(workout: &NewWorkout) -> Result<()> {
    validate_name("Workout", &workout.name)?;
    if workout.exercises.is_empty() {
        return Err(Error::Validation(
            "A workout needs at least one exercise".into(),
        ));
    }
    workout.exercises.iter().try_for_each(validate_exercise)
}

/// Validate an update-workout body
pub fn validate_update(update: &WorkoutUpdate) -> Result<()> {
    if let Some(name) = &update.name {
        validate_name("Workout", name)?;
    }
    if let Some(exercises) = &update.exercises {
        exercises.iter().try_for_each(validate_exercise)?;
    }
    Ok(())
}

/// Validate a record-set body
pub fn validate_new_set(set: &NewSet) -> Result<()> {
    validate_weight("weight", set.weight)?;
    validate_count("reps", set.reps)
}

/// Validate a progression body
pub fn validate_progression_request(req: &ProgressionRequest) -> Result<()> {
    if req.exercise_ids.is_empty() {
        return Err(Error::Validation("exercise_ids must not be empty".into()));
    }
    Ok(())
}
