// src/storage/postgres.rs

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json};

use super::ExerciseRepository;
use crate::{
    error::AppError,
    exercises::{effects::ProgressStore, source::ExerciseSource},
    models::{
        exercise::{ExerciseRecord, NewExercise},
        progress::{ProgressKey, ProgressSnapshot},
    },
};

/// Postgres-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row of the 'exercises' table.
#[derive(sqlx::FromRow)]
struct ExerciseRow {
    id: i64,
    exercise_type: String,
    prompt: String,
    options: Json<serde_json::Value>,
    correct_answer: Json<serde_json::Value>,
    explanation: Option<String>,
    points: i32,
}

impl From<ExerciseRow> for ExerciseRecord {
    fn from(row: ExerciseRow) -> Self {
        ExerciseRecord {
            id: row.id.to_string(),
            exercise_type: row.exercise_type,
            prompt: row.prompt,
            options: row.options.0,
            correct_answer: row.correct_answer.0,
            explanation: row.explanation,
            points: i64::from(row.points),
        }
    }
}

/// Row of the 'exercise_progress' table.
#[derive(sqlx::FromRow)]
struct ProgressRow {
    current_index: i32,
    answers: Json<BTreeMap<String, String>>,
    total_questions: i32,
}

fn to_i32(value: usize, field: &str) -> Result<i32, AppError> {
    i32::try_from(value).map_err(|_| AppError::BadRequest(format!("{} is out of range", field)))
}

#[async_trait]
impl ExerciseSource for PgStore {
    async fn fetch(
        &self,
        resource_id: &str,
        difficulty: &str,
    ) -> Result<Vec<ExerciseRecord>, AppError> {
        let rows = sqlx::query_as::<_, ExerciseRow>(
            r#"
            SELECT id, exercise_type, prompt, options, correct_answer, explanation, points
            FROM exercises
            WHERE resource_id = $1 AND difficulty = $2
            ORDER BY position, id
            "#,
        )
        .bind(resource_id)
        .bind(difficulty)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch exercises: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(rows.into_iter().map(ExerciseRecord::from).collect())
    }
}

#[async_trait]
impl ExerciseRepository for PgStore {
    async fn replace_set(
        &self,
        resource_id: &str,
        difficulty: &str,
        exercises: Vec<NewExercise>,
    ) -> Result<usize, AppError> {
        let count = exercises.len();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM exercises WHERE resource_id = $1 AND difficulty = $2")
            .bind(resource_id)
            .bind(difficulty)
            .execute(&mut *tx)
            .await?;

        if count > 0 {
            let mut query_builder = QueryBuilder::<Postgres>::new(
                "INSERT INTO exercises
                    (resource_id, difficulty, position, exercise_type, prompt,
                     options, correct_answer, explanation, points) ",
            );
            query_builder.push_values(exercises.into_iter().enumerate(), |mut b, (pos, ex)| {
                b.push_bind(resource_id.to_string())
                    .push_bind(difficulty.to_string())
                    .push_bind(pos as i32)
                    .push_bind(ex.exercise_type)
                    .push_bind(ex.prompt)
                    .push_bind(Json(ex.options))
                    .push_bind(Json(ex.correct_answer))
                    .push_bind(ex.explanation)
                    .push_bind(ex.points);
            });
            query_builder.build().execute(&mut *tx).await.map_err(|e| {
                tracing::error!("Failed to insert exercise set: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;
        }

        tx.commit().await?;
        Ok(count)
    }
}

#[async_trait]
impl ProgressStore for PgStore {
    async fn save(&self, key: &ProgressKey, snapshot: &ProgressSnapshot) -> Result<(), AppError> {
        // Upsert: one in-progress row per (user, resource, difficulty)
        sqlx::query(
            r#"
            INSERT INTO exercise_progress
                (user_id, resource_id, difficulty, current_index, answers, total_questions)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, resource_id, difficulty) DO UPDATE SET
                current_index = EXCLUDED.current_index,
                answers = EXCLUDED.answers,
                total_questions = EXCLUDED.total_questions,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(&key.user_id)
        .bind(&key.resource_id)
        .bind(&key.difficulty)
        .bind(to_i32(snapshot.current_index, "current_index")?)
        .bind(Json(&snapshot.answers))
        .bind(to_i32(snapshot.total_questions, "total_questions")?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load(&self, key: &ProgressKey) -> Result<Option<ProgressSnapshot>, AppError> {
        let row = sqlx::query_as::<_, ProgressRow>(
            r#"
            SELECT current_index, answers, total_questions
            FROM exercise_progress
            WHERE user_id = $1 AND resource_id = $2 AND difficulty = $3
            "#,
        )
        .bind(&key.user_id)
        .bind(&key.resource_id)
        .bind(&key.difficulty)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| ProgressSnapshot {
            current_index: row.current_index.max(0) as usize,
            answers: row.answers.0,
            total_questions: row.total_questions.max(0) as usize,
        }))
    }

    async fn delete(&self, key: &ProgressKey) -> Result<(), AppError> {
        sqlx::query(
            "DELETE FROM exercise_progress WHERE user_id = $1 AND resource_id = $2 AND difficulty = $3",
        )
        .bind(&key.user_id)
        .bind(&key.resource_id)
        .bind(&key.difficulty)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
