// src/exercises/capture.rs

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::kind::{Exercise, ExerciseKind};
use crate::models::exercise::coerce_string_list;

/// What the learner has currently selected or entered for one exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CapturedAnswer {
    /// Selected option or typed text.
    Text(String),
    /// Statement indices in click order.
    Indices(Vec<usize>),
    /// `label:source` tokens in click order.
    Pairs(Vec<String>),
    /// Current permutation of a reorderable list.
    Items(Vec<String>),
    /// Label to bucket placement, kept in option order.
    Buckets(Vec<(String, usize)>),
}

/// A completed UI gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CaptureEvent {
    SelectOption { option: String },
    Input { text: String },
    TogglePair { label: String, source: usize },
    ToggleStatement { index: usize },
    Move { from: usize, to: usize },
    Assign { label: String, bucket: usize },
    Unassign { label: String },
    Shuffle,
}

impl CapturedAnswer {
    /// Starting answer for list-based drag exercises; other types start empty.
    pub fn initial(exercise: &Exercise) -> Option<Self> {
        match exercise.kind {
            ExerciseKind::DragSequencing | ExerciseKind::DragWordOrder => {
                Some(Self::Items(exercise.options.clone()))
            }
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Indices(v) => v.is_empty(),
            Self::Pairs(v) | Self::Items(v) => v.is_empty(),
            Self::Buckets(v) => v.is_empty(),
        }
    }

    /// Answer as an ordered token list, for positional comparison.
    pub fn tokens(&self) -> Vec<String> {
        match self {
            Self::Text(s) => coerce_string_list(&Value::String(s.clone())),
            Self::Indices(v) => v.iter().map(usize::to_string).collect(),
            Self::Pairs(v) | Self::Items(v) => v.clone(),
            Self::Buckets(v) => v
                .iter()
                .map(|(label, bucket)| format!("{}:{}", label, bucket))
                .collect(),
        }
    }

    /// String form used for persistence and the grading endpoint. Lists are
    /// JSON arrays so labels may contain commas.
    pub fn to_wire(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Indices(v) => Value::from(v.clone()).to_string(),
            Self::Pairs(_) | Self::Items(_) | Self::Buckets(_) => Value::from(self.tokens()).to_string(),
        }
    }

    /// Rebuilds a captured answer from its wire string. Comma-joined lists
    /// from older snapshots are still accepted.
    pub fn from_wire(kind: &ExerciseKind, wire: &str) -> Self {
        match kind {
            ExerciseKind::MultipleChoice
            | ExerciseKind::TrueFalse
            | ExerciseKind::Cloze
            | ExerciseKind::SpotTheError
            | ExerciseKind::Other(_) => Self::Text(wire.to_string()),
            ExerciseKind::Sequencing => {
                let tokens = coerce_string_list(&Value::String(wire.to_string()));
                match tokens.iter().map(|t| t.parse::<usize>()).collect() {
                    Ok(indices) => Self::Indices(indices),
                    Err(_) => Self::Items(tokens),
                }
            }
            ExerciseKind::DragSequencing | ExerciseKind::DragWordOrder => {
                Self::Items(coerce_string_list(&Value::String(wire.to_string())))
            }
            ExerciseKind::Matching
            | ExerciseKind::DragMatching
            | ExerciseKind::DragCategorization => {
                Self::Pairs(coerce_string_list(&Value::String(wire.to_string())))
            }
        }
    }
}

/// Applies one gesture to the current answer.
///
/// Returns `None` when the gesture does not apply to this exercise type or is
/// out of range; the current answer is then left as it was.
pub fn apply<R: Rng + ?Sized>(
    exercise: &Exercise,
    current: Option<&CapturedAnswer>,
    event: CaptureEvent,
    rng: &mut R,
) -> Option<CapturedAnswer> {
    match exercise.kind {
        ExerciseKind::MultipleChoice
        | ExerciseKind::TrueFalse
        | ExerciseKind::SpotTheError
        | ExerciseKind::Cloze
        | ExerciseKind::Other(_) => match event {
            CaptureEvent::SelectOption { option } => Some(CapturedAnswer::Text(option)),
            CaptureEvent::Input { text } => Some(CapturedAnswer::Text(text)),
            _ => None,
        },
        ExerciseKind::Matching => match event {
            CaptureEvent::TogglePair { label, source } => {
                let mut tokens = match current {
                    Some(CapturedAnswer::Pairs(tokens)) => tokens.clone(),
                    _ => Vec::new(),
                };
                let token = format!("{}:{}", label, source);
                if let Some(pos) = tokens.iter().position(|t| *t == token) {
                    tokens.remove(pos);
                } else {
                    tokens.push(token);
                }
                Some(CapturedAnswer::Pairs(tokens))
            }
            _ => None,
        },
        ExerciseKind::Sequencing => match event {
            CaptureEvent::ToggleStatement { index } => {
                if index >= exercise.options.len() {
                    return None;
                }
                let mut order = match current {
                    Some(CapturedAnswer::Indices(order)) => order.clone(),
                    _ => Vec::new(),
                };
                if order.contains(&index) {
                    order.retain(|i| *i != index);
                } else {
                    order.push(index);
                }
                Some(CapturedAnswer::Indices(order))
            }
            _ => None,
        },
        ExerciseKind::DragSequencing | ExerciseKind::DragWordOrder => {
            let mut items = match current {
                Some(CapturedAnswer::Items(items)) => items.clone(),
                _ => exercise.options.clone(),
            };
            match event {
                CaptureEvent::Move { from, to } => {
                    if from >= items.len() || to >= items.len() {
                        return None;
                    }
                    let item = items.remove(from);
                    items.insert(to, item);
                    Some(CapturedAnswer::Items(items))
                }
                CaptureEvent::Shuffle => {
                    items.shuffle(rng);
                    Some(CapturedAnswer::Items(items))
                }
                _ => None,
            }
        }
        ExerciseKind::DragMatching | ExerciseKind::DragCategorization => {
            let mut placed = match current {
                Some(CapturedAnswer::Buckets(placed)) => placed.clone(),
                _ => Vec::new(),
            };
            match event {
                CaptureEvent::Assign { label, bucket } => {
                    placed.retain(|(l, _)| *l != label);
                    placed.push((label, bucket));
                    sort_by_option_order(&mut placed, &exercise.options);
                    Some(CapturedAnswer::Buckets(placed))
                }
                CaptureEvent::Unassign { label } => {
                    let before = placed.len();
                    placed.retain(|(l, _)| *l != label);
                    (placed.len() != before).then_some(CapturedAnswer::Buckets(placed))
                }
                _ => None,
            }
        }
    }
}

fn sort_by_option_order(placed: &mut [(String, usize)], options: &[String]) {
    placed.sort_by_key(|(label, _)| {
        options
            .iter()
            .position(|opt| opt == label)
            .unwrap_or(usize::MAX)
    });
}
