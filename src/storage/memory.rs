// src/storage/memory.rs

use std::{
    collections::HashMap,
    sync::{
        RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use async_trait::async_trait;

use super::ExerciseRepository;
use crate::{
    error::AppError,
    exercises::{effects::ProgressStore, source::ExerciseSource},
    models::{
        exercise::{ExerciseRecord, NewExercise},
        progress::{ProgressKey, ProgressSnapshot},
    },
};

type SetKey = (String, String);

/// In-process store for local runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    sets: RwLock<HashMap<SetKey, Vec<ExerciseRecord>>>,
    progress: RwLock<HashMap<ProgressKey, ProgressSnapshot>>,
    next_id: AtomicU64,
}

fn poisoned<T>(_: T) -> AppError {
    AppError::InternalServerError("memory store lock poisoned".to_string())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a set of records as-is, bypassing upload validation.
    pub fn insert_records(
        &self,
        resource_id: &str,
        difficulty: &str,
        records: Vec<ExerciseRecord>,
    ) -> Result<(), AppError> {
        self.sets
            .write()
            .map_err(poisoned)?
            .insert((resource_id.to_string(), difficulty.to_string()), records);
        Ok(())
    }
}

#[async_trait]
impl ExerciseSource for MemoryStore {
    async fn fetch(
        &self,
        resource_id: &str,
        difficulty: &str,
    ) -> Result<Vec<ExerciseRecord>, AppError> {
        let sets = self.sets.read().map_err(poisoned)?;
        Ok(sets
            .get(&(resource_id.to_string(), difficulty.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ExerciseRepository for MemoryStore {
    async fn replace_set(
        &self,
        resource_id: &str,
        difficulty: &str,
        exercises: Vec<NewExercise>,
    ) -> Result<usize, AppError> {
        let records: Vec<ExerciseRecord> = exercises
            .into_iter()
            .map(|exercise| {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                exercise.into_record(id.to_string())
            })
            .collect();
        let count = records.len();
        self.insert_records(resource_id, difficulty, records)?;
        Ok(count)
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn save(&self, key: &ProgressKey, snapshot: &ProgressSnapshot) -> Result<(), AppError> {
        self.progress
            .write()
            .map_err(poisoned)?
            .insert(key.clone(), snapshot.clone());
        Ok(())
    }

    async fn load(&self, key: &ProgressKey) -> Result<Option<ProgressSnapshot>, AppError> {
        Ok(self.progress.read().map_err(poisoned)?.get(key).cloned())
    }

    async fn delete(&self, key: &ProgressKey) -> Result<(), AppError> {
        self.progress.write().map_err(poisoned)?.remove(key);
        Ok(())
    }
}
