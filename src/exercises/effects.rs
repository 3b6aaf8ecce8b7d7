// src/exercises/effects.rs

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use tokio::task::JoinHandle;

use super::session::Effect;
use crate::{
    error::AppError,
    models::progress::{ProgressKey, ProgressSnapshot},
};

/// Remote store for advisory, resumable session progress.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn save(&self, key: &ProgressKey, snapshot: &ProgressSnapshot) -> Result<(), AppError>;
    async fn load(&self, key: &ProgressKey) -> Result<Option<ProgressSnapshot>, AppError>;
    async fn delete(&self, key: &ProgressKey) -> Result<(), AppError>;
}

/// Executes session effects in the background.
///
/// Zero retries. Failures are logged and dropped; nothing is reported back to
/// the session, so a late or failed write can never alter grading.
#[derive(Clone)]
pub struct EffectRunner {
    store: Arc<dyn ProgressStore>,
    mounted: Arc<AtomicBool>,
}

impl EffectRunner {
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self {
            store,
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Stops issuing remote calls. In-flight calls are left to finish on their own.
    pub fn detach(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Spawns one task per effect. Must be called inside a Tokio runtime.
    ///
    /// The handles are returned for callers that want to wait (tests, shutdown);
    /// the session itself never awaits them.
    pub fn run(&self, effects: Vec<Effect>) -> Vec<JoinHandle<()>> {
        if !self.is_mounted() {
            if !effects.is_empty() {
                tracing::debug!("Dropping {} effects after detach", effects.len());
            }
            return Vec::new();
        }

        effects
            .into_iter()
            .map(|effect| {
                let store = Arc::clone(&self.store);
                tokio::spawn(async move { execute(store.as_ref(), effect).await })
            })
            .collect()
    }
}

async fn execute(store: &dyn ProgressStore, effect: Effect) {
    match effect {
        Effect::SaveProgress { key, snapshot } => {
            if let Err(e) = store.save(&key, &snapshot).await {
                tracing::warn!(
                    "Failed to save progress for {}/{}: {}",
                    key.resource_id,
                    key.difficulty,
                    e
                );
            }
        }
        Effect::DeleteProgress { key } => {
            if let Err(e) = store.delete(&key).await {
                tracing::warn!(
                    "Failed to delete progress for {}/{}: {}",
                    key.resource_id,
                    key.difficulty,
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;
    use std::collections::BTreeMap;

    struct FailingStore;

    #[async_trait]
    impl ProgressStore for FailingStore {
        async fn save(&self, _: &ProgressKey, _: &ProgressSnapshot) -> Result<(), AppError> {
            Err(AppError::InternalServerError("store offline".to_string()))
        }

        async fn load(&self, _: &ProgressKey) -> Result<Option<ProgressSnapshot>, AppError> {
            Err(AppError::InternalServerError("store offline".to_string()))
        }

        async fn delete(&self, _: &ProgressKey) -> Result<(), AppError> {
            Err(AppError::InternalServerError("store offline".to_string()))
        }
    }

    fn snapshot(index: usize) -> ProgressSnapshot {
        ProgressSnapshot {
            current_index: index,
            answers: BTreeMap::from([("q1".to_string(), "B".to_string())]),
            total_questions: 3,
        }
    }

    #[tokio::test]
    async fn runs_save_and_delete() {
        let store = Arc::new(MemoryStore::new());
        let runner = EffectRunner::new(store.clone());
        let key = ProgressKey::new("u1", "video-1", "beginner");

        for handle in runner.run(vec![Effect::SaveProgress {
            key: key.clone(),
            snapshot: snapshot(1),
        }]) {
            handle.await.unwrap();
        }
        assert_eq!(store.load(&key).await.unwrap(), Some(snapshot(1)));

        for handle in runner.run(vec![Effect::DeleteProgress { key: key.clone() }]) {
            handle.await.unwrap();
        }
        assert_eq!(store.load(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let runner = EffectRunner::new(Arc::new(FailingStore));
        let key = ProgressKey::new("u1", "video-1", "beginner");
        let handles = runner.run(vec![
            Effect::SaveProgress {
                key: key.clone(),
                snapshot: snapshot(0),
            },
            Effect::DeleteProgress { key },
        ]);
        assert_eq!(handles.len(), 2);
        for handle in handles {
            assert!(handle.await.is_ok());
        }
    }

    #[tokio::test]
    async fn detached_runner_issues_nothing() {
        let store = Arc::new(MemoryStore::new());
        let runner = EffectRunner::new(store.clone());
        let key = ProgressKey::new("u1", "video-1", "beginner");

        runner.detach();
        let handles = runner.run(vec![Effect::SaveProgress {
            key: key.clone(),
            snapshot: snapshot(2),
        }]);
        assert!(handles.is_empty());
        assert_eq!(store.load(&key).await.unwrap(), None);
    }
}
