// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{
    config::Config,
    exercises::{effects::ProgressStore, source::ExerciseSource},
    storage::{ExerciseRepository, MemoryStore, PgStore},
};

#[derive(Clone)]
pub struct AppState {
    pub exercises: Arc<dyn ExerciseSource>,
    pub repository: Arc<dyn ExerciseRepository>,
    pub progress: Arc<dyn ProgressStore>,
    pub config: Config,
}

impl AppState {
    pub fn postgres(pool: PgPool, config: Config) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self {
            exercises: store.clone(),
            repository: store.clone(),
            progress: store,
            config,
        }
    }

    pub fn in_memory(store: Arc<MemoryStore>, config: Config) -> Self {
        Self {
            exercises: store.clone(),
            repository: store.clone(),
            progress: store,
            config,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
