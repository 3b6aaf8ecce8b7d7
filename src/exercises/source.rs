// src/exercises/source.rs

use std::collections::HashSet;

use async_trait::async_trait;

use super::{
    kind::{Exercise, ExerciseError},
    session::{Command, ExerciseSession},
};
use crate::{
    config::NO_EXERCISES_MESSAGE,
    error::AppError,
    models::{exercise::ExerciseRecord, progress::ProgressKey},
};

/// Supplies the exercise list for a (resource, difficulty) pair.
#[async_trait]
pub trait ExerciseSource: Send + Sync {
    async fn fetch(&self, resource_id: &str, difficulty: &str)
    -> Result<Vec<ExerciseRecord>, AppError>;
}

/// Fetches and refuses an empty list with the user-facing retry hint.
pub async fn fetch_required(
    source: &dyn ExerciseSource,
    resource_id: &str,
    difficulty: &str,
) -> Result<Vec<ExerciseRecord>, AppError> {
    let records = source.fetch(resource_id, difficulty).await?;
    if records.is_empty() {
        return Err(AppError::NotFound(NO_EXERCISES_MESSAGE.to_string()));
    }
    Ok(records)
}

/// Turns records into exercises, dropping the ones that cannot be used.
pub fn parse_records(records: Vec<ExerciseRecord>) -> Vec<Exercise> {
    let mut seen = HashSet::new();
    let mut exercises = Vec::with_capacity(records.len());

    for record in records {
        let exercise = match Exercise::from_record(record) {
            Ok(exercise) => exercise,
            Err(e) => {
                tracing::warn!("Skipping exercise record: {}", e);
                continue;
            }
        };
        if !seen.insert(exercise.id.clone()) {
            tracing::warn!("Skipping exercise record: {}", ExerciseError::DuplicateId(exercise.id));
            continue;
        }
        exercises.push(exercise);
    }
    exercises
}

/// Builds a session for `key` from the source.
///
/// A failed or empty fetch yields a session in the `Empty` phase; the caller
/// shows the retry instruction from `load_error`.
pub async fn load_session(
    source: &dyn ExerciseSource,
    key: ProgressKey,
) -> ExerciseSession<Exercise> {
    let mut session = ExerciseSession::new(key);
    let command = match fetch_required(source, &session.key().resource_id, &session.key().difficulty).await
    {
        Ok(records) => Command::Loaded(parse_records(records)),
        Err(AppError::NotFound(msg)) => Command::LoadFailed(msg),
        Err(e) => Command::LoadFailed(e.to_string()),
    };
    session.handle(command);
    session
}
