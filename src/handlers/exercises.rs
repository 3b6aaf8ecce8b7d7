// src/handlers/exercises.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    exercises::{
        capture::CapturedAnswer,
        effects::EffectRunner,
        results,
        session::Effect,
        source::{fetch_required, parse_records},
    },
    models::progress::{DifficultyParams, ProgressKey},
    state::AppState,
    utils::jwt::Claims,
};

/// DTO for grading a whole set at once.
#[derive(Debug, Deserialize)]
pub struct GradeRequest {
    /// Exercise id to captured answer in wire form.
    pub answers: HashMap<String, String>,
}

/// Returns the exercise set for a resource and difficulty.
///
/// Responds 404 with a retry instruction when nothing has been generated yet.
pub async fn list_exercises(
    State(state): State<AppState>,
    Path(resource_id): Path<String>,
    Query(params): Query<DifficultyParams>,
) -> Result<impl IntoResponse, AppError> {
    let records = fetch_required(state.exercises.as_ref(), &resource_id, &params.difficulty).await?;

    Ok(Json(records))
}

/// Grades a submitted answer map and returns the results summary.
///
/// * Uses the same evaluator and aggregator as a client-side session.
/// * Answers for unknown ids are ignored; missing answers grade as incorrect.
/// * Clears the caller's saved progress for this set, best-effort.
pub async fn grade_exercises(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(resource_id): Path<String>,
    Query(params): Query<DifficultyParams>,
    Json(req): Json<GradeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.answers.is_empty() {
        return Err(AppError::BadRequest("No answers submitted".to_string()));
    }

    let records = fetch_required(state.exercises.as_ref(), &resource_id, &params.difficulty).await?;
    let exercises = parse_records(records);

    let answers: HashMap<String, CapturedAnswer> = exercises
        .iter()
        .filter_map(|exercise| {
            req.answers.get(&exercise.id).map(|wire| {
                (
                    exercise.id.clone(),
                    CapturedAnswer::from_wire(&exercise.kind, wire),
                )
            })
        })
        .collect();

    let summary = results::grade_all(&exercises, &answers);

    tracing::info!(
        "Graded {} for user {}: {}/{}",
        resource_id,
        claims.sub,
        summary.total_score,
        summary.max_score
    );

    let key = ProgressKey::new(claims.sub, resource_id, params.difficulty);
    EffectRunner::new(state.progress.clone()).run(vec![Effect::DeleteProgress { key }]);

    Ok(Json(summary))
}
