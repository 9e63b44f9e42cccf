#![forbid(unsafe_code)]

//! HTTP surface for Liftlog.
//!
//! Thin axum handlers over [`liftlog_core::Store`]: validate the body, run the
//! store call on the blocking pool, map the outcome to a status code.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use liftlog_core::validation;
use liftlog_core::{
    Error, Exercise, NewSet, NewWorkout, ProgressionRequest, Set, Store, SummaryRow, Workout,
    WorkoutUpdate,
};
use serde::Serialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

/// Error response: a status code plus an opaque message
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Collapse everything except validation failures into a generic 500
    fn opaque(err: Error) -> Self {
        if err.is_client_error() {
            return Self::from(err);
        }
        tracing::error!("Request failed: {}", err);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", err);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, err);
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// `Json` extractor whose rejections use the `{ "error": ... }` body
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
struct ApiJson<T>(T);

#[derive(Serialize)]
struct Message {
    message: &'static str,
}

/// Run a store operation on the blocking pool
///
/// The connection is checked out inside `op` and released before the
/// result is returned.
async fn blocking<F, T>(store: &Store, op: F) -> liftlog_core::Result<T>
where
    F: FnOnce(Store) -> liftlog_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = store.clone();
    tokio::task::spawn_blocking(move || op(store))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
}

/// Build the application router around an opened store
pub fn router(store: Store) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/users/{user_id}/workouts",
            post(create_workout).get(list_workouts),
        )
        .route("/workouts/{workout_id}/exercises", get(list_exercises))
        .route(
            "/workouts/{workout_id}",
            put(update_workout).delete(delete_workout),
        )
        .route(
            "/exercises/{exercise_id}/sets",
            post(record_set).get(list_sets),
        )
        .route("/workout-summary/{user_id}", get(workout_summary))
        .route(
            "/workout-summary/progression/{user_id}",
            get(eligible_exercises),
        )
        .route("/progression", put(apply_progression))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

async fn health() -> Json<Message> {
    Json(Message { message: "ok" })
}

async fn create_workout(
    State(store): State<Store>,
    Path(user_id): Path<i64>,
    ApiJson(body): ApiJson<NewWorkout>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    validation::validate_new_workout(&body)?;

    let workout_id = blocking(&store, move |store| {
        store.create_workout(user_id, &body.name, &body.exercises)
    })
    .await
    .map_err(ApiError::opaque)?;

    Ok((StatusCode::CREATED, Json(json!({ "workout_id": workout_id }))))
}

async fn list_workouts(
    State(store): State<Store>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Vec<Workout>>> {
    let workouts = blocking(&store, move |store| store.list_workouts(user_id))
        .await
        .map_err(ApiError::opaque)?;
    Ok(Json(workouts))
}

async fn list_exercises(
    State(store): State<Store>,
    Path(workout_id): Path<i64>,
) -> ApiResult<Json<Vec<Exercise>>> {
    let exercises = blocking(&store, move |store| store.list_exercises(workout_id))
        .await
        .map_err(ApiError::opaque)?;
    Ok(Json(exercises))
}

/// The only endpoint that distinguishes a missing workout (404)
async fn update_workout(
    State(store): State<Store>,
    Path(workout_id): Path<i64>,
    ApiJson(body): ApiJson<WorkoutUpdate>,
) -> ApiResult<Json<Message>> {
    validation::validate_update(&body)?;

    blocking(&store, move |store| store.update_workout(workout_id, &body)).await?;

    Ok(Json(Message {
        message: "Workout modified successfully",
    }))
}

async fn delete_workout(
    State(store): State<Store>,
    Path(workout_id): Path<i64>,
) -> ApiResult<Json<Message>> {
    blocking(&store, move |store| store.delete_workout(workout_id))
        .await
        .map_err(ApiError::opaque)?;

    Ok(Json(Message {
        message: "Workout successfully deleted",
    }))
}

async fn record_set(
    State(store): State<Store>,
    Path(exercise_id): Path<i64>,
    ApiJson(body): ApiJson<NewSet>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    validation::validate_new_set(&body)?;

    let set_id = blocking(&store, move |store| {
        store.record_set(exercise_id, body.weight, body.reps)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "set_id": set_id }))))
}

async fn list_sets(
    State(store): State<Store>,
    Path(exercise_id): Path<i64>,
) -> ApiResult<Json<Vec<Set>>> {
    let sets = blocking(&store, move |store| store.list_sets(exercise_id))
        .await
        .map_err(ApiError::opaque)?;
    Ok(Json(sets))
}

async fn workout_summary(
    State(store): State<Store>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Vec<SummaryRow>>> {
    let rows = blocking(&store, move |store| store.workout_summary(user_id))
        .await
        .map_err(ApiError::opaque)?;
    Ok(Json(rows))
}

async fn eligible_exercises(
    State(store): State<Store>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Vec<Exercise>>> {
    let eligible = blocking(&store, move |store| store.eligible_exercises(user_id))
        .await
        .map_err(ApiError::opaque)?;
    Ok(Json(eligible))
}

async fn apply_progression(
    State(store): State<Store>,
    ApiJson(body): ApiJson<ProgressionRequest>,
) -> ApiResult<Json<Vec<Exercise>>> {
    validation::validate_progression_request(&body)?;

    let updated = blocking(&store, move |store| {
        if body.verify {
            store.apply_progression_verified(&body.exercise_ids, chrono::Utc::now())
        } else {
            store.apply_progression(&body.exercise_ids)
        }
    })
    .await
    .map_err(ApiError::opaque)?;

    Ok(Json(updated))
}
