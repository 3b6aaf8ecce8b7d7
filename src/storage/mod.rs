// src/storage/mod.rs

use async_trait::async_trait;

use crate::{error::AppError, models::exercise::NewExercise};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Write side for pre-generated exercise sets.
#[async_trait]
pub trait ExerciseRepository: Send + Sync {
    /// Replaces the set stored for (resource, difficulty). Returns how many were stored.
    async fn replace_set(
        &self,
        resource_id: &str,
        difficulty: &str,
        exercises: Vec<NewExercise>,
    ) -> Result<usize, AppError>;
}
