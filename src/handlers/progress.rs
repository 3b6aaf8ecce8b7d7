// src/handlers/progress.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::progress::{DifficultyParams, ProgressKey, ProgressSnapshot},
    state::AppState,
    utils::jwt::Claims,
};

fn progress_key(claims: Claims, resource_id: String, params: DifficultyParams) -> ProgressKey {
    ProgressKey::new(claims.sub, resource_id, params.difficulty)
}

/// Returns the caller's saved progress for a resource.
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(resource_id): Path<String>,
    Query(params): Query<DifficultyParams>,
) -> Result<impl IntoResponse, AppError> {
    let key = progress_key(claims, resource_id, params);

    let snapshot = state
        .progress
        .load(&key)
        .await?
        .ok_or(AppError::NotFound("No saved progress".to_string()))?;

    Ok(Json(snapshot))
}

/// Upserts the caller's in-progress row.
pub async fn save_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(resource_id): Path<String>,
    Query(params): Query<DifficultyParams>,
    Json(snapshot): Json<ProgressSnapshot>,
) -> Result<impl IntoResponse, AppError> {
    if snapshot.current_index > snapshot.total_questions {
        return Err(AppError::BadRequest(
            "currentIndex cannot exceed totalQuestions".to_string(),
        ));
    }

    let key = progress_key(claims, resource_id, params);
    state.progress.save(&key, &snapshot).await.map_err(|e| {
        tracing::error!("Failed to save progress: {}", e);
        e
    })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Removes the caller's in-progress row. Deleting nothing is not an error.
pub async fn delete_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(resource_id): Path<String>,
    Query(params): Query<DifficultyParams>,
) -> Result<impl IntoResponse, AppError> {
    let key = progress_key(claims, resource_id, params);
    state.progress.delete(&key).await?;

    Ok(StatusCode::NO_CONTENT)
}
