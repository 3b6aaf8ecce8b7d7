// src/handlers/admin.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::{error::AppError, models::exercise::CreateExerciseSetRequest, state::AppState};

/// Stores a pre-generated exercise set, replacing any previous set for the
/// same resource and difficulty.
/// Admin only.
pub async fn create_exercise_set(
    State(state): State<AppState>,
    Json(payload): Json<CreateExerciseSetRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let inserted = state
        .repository
        .replace_set(&payload.resource_id, &payload.difficulty, payload.exercises)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store exercise set: {}", e);
            e
        })?;

    tracing::info!(
        "Stored {} exercises for {} ({})",
        inserted,
        payload.resource_id,
        payload.difficulty
    );

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "inserted": inserted })),
    ))
}
