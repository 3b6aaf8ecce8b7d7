// src/models/progress.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifies one in-progress row: (user, resource, difficulty).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressKey {
    pub user_id: String,
    pub resource_id: String,
    pub difficulty: String,
}

impl ProgressKey {
    pub fn new(
        user_id: impl Into<String>,
        resource_id: impl Into<String>,
        difficulty: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            resource_id: resource_id.into(),
            difficulty: difficulty.into(),
        }
    }
}

/// Advisory resume state. Never the source of truth for a running session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub current_index: usize,
    /// Exercise id to captured answer in wire form.
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
    pub total_questions: usize,
}

/// Query parameters shared by exercise and progress routes.
#[derive(Debug, Deserialize)]
pub struct DifficultyParams {
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

pub const DEFAULT_DIFFICULTY: &str = "beginner";

fn default_difficulty() -> String {
    DEFAULT_DIFFICULTY.to_string()
}
