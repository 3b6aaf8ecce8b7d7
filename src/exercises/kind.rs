// src/exercises/kind.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::exercise::{ExerciseRecord, coerce_string_list, scalar_text};

/// Closed set of exercise types.
///
/// Unrecognised tags are kept as `Other` and graded with plain string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExerciseKind {
    MultipleChoice,
    TrueFalse,
    Cloze,
    Matching,
    Sequencing,
    SpotTheError,
    DragMatching,
    DragSequencing,
    DragCategorization,
    DragWordOrder,
    Other(String),
}

/// When a captured answer gets graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackMode {
    /// Graded the moment an option is picked.
    Immediate,
    /// Graded on an explicit check.
    Deferred,
}

impl ExerciseKind {
    pub fn from_tag(tag: &str) -> Self {
        let normalized = tag.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "multiple_choice" | "multiplechoice" | "choice" => Self::MultipleChoice,
            "true_false" | "truefalse" => Self::TrueFalse,
            "cloze" | "fill_blank" | "fill_in_blank" | "fill_in_the_blank" => Self::Cloze,
            "matching" => Self::Matching,
            "sequencing" | "ordering" => Self::Sequencing,
            "spot_error" | "spot_the_error" => Self::SpotTheError,
            "drag_matching" => Self::DragMatching,
            "drag_sequencing" => Self::DragSequencing,
            "drag_categorization" | "drag_categorisation" | "categorization" => {
                Self::DragCategorization
            }
            "drag_word_order" | "word_order" => Self::DragWordOrder,
            _ => Self::Other(tag.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::MultipleChoice => "multiple_choice",
            Self::TrueFalse => "true_false",
            Self::Cloze => "cloze",
            Self::Matching => "matching",
            Self::Sequencing => "sequencing",
            Self::SpotTheError => "spot_error",
            Self::DragMatching => "drag_matching",
            Self::DragSequencing => "drag_sequencing",
            Self::DragCategorization => "drag_categorization",
            Self::DragWordOrder => "drag_word_order",
            Self::Other(tag) => tag,
        }
    }

    pub fn feedback_mode(&self) -> FeedbackMode {
        match self {
            Self::MultipleChoice | Self::TrueFalse | Self::SpotTheError => FeedbackMode::Immediate,
            Self::Cloze
            | Self::Matching
            | Self::Sequencing
            | Self::DragMatching
            | Self::DragSequencing
            | Self::DragCategorization
            | Self::DragWordOrder
            | Self::Other(_) => FeedbackMode::Deferred,
        }
    }

    /// Drag-and-drop exercises run as a second batch after the standard ones.
    pub fn is_drag_drop(&self) -> bool {
        matches!(
            self,
            Self::DragMatching | Self::DragSequencing | Self::DragCategorization | Self::DragWordOrder
        )
    }
}

impl From<String> for ExerciseKind {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<ExerciseKind> for String {
    fn from(kind: ExerciseKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correct answer, parsed once when the exercise is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "value", rename_all = "snake_case")]
pub enum AnswerKey {
    Text(String),
    /// Expected positional order (indices or words, in string form).
    Order(Vec<String>),
    /// Expected `term:index` tokens, compared positionally.
    Pairs(Vec<String>),
    /// The stored answer could not be parsed; nothing matches it.
    Malformed,
}

impl AnswerKey {
    pub fn parse(kind: &ExerciseKind, raw: &Value) -> Self {
        match kind {
            ExerciseKind::MultipleChoice
            | ExerciseKind::TrueFalse
            | ExerciseKind::Cloze
            | ExerciseKind::SpotTheError
            | ExerciseKind::Other(_) => match raw {
                Value::Null => Self::Malformed,
                other => Self::Text(scalar_text(other).unwrap_or_else(|| other.to_string())),
            },
            ExerciseKind::Sequencing | ExerciseKind::DragSequencing | ExerciseKind::DragWordOrder => {
                parse_json_list(raw).map_or(Self::Malformed, Self::Order)
            }
            ExerciseKind::Matching
            | ExerciseKind::DragMatching
            | ExerciseKind::DragCategorization => {
                parse_json_list(raw).map_or(Self::Malformed, Self::Pairs)
            }
        }
    }
}

/// Parses a JSON list (given directly or serialized in a string) of scalars.
fn parse_json_list(raw: &Value) -> Option<Vec<String>> {
    let parsed;
    let list = match raw {
        Value::Array(items) => items,
        Value::String(s) => {
            parsed = serde_json::from_str::<Value>(s.trim()).ok()?;
            parsed.as_array()?
        }
        _ => return None,
    };
    list.iter().map(scalar_text).collect()
}

/// Error raised when a record cannot become an exercise at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExerciseError {
    MissingId,
    DuplicateId(String),
}

impl fmt::Display for ExerciseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseError::MissingId => write!(f, "exercise record has an empty id"),
            ExerciseError::DuplicateId(id) => write!(f, "duplicate exercise id: {}", id),
        }
    }
}

impl std::error::Error for ExerciseError {}

/// A loaded, immutable exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub kind: ExerciseKind,
    pub prompt: String,
    pub options: Vec<String>,
    pub answer_key: AnswerKey,
    /// Correct answer as originally stored, for review display.
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub points: u32,
}

impl Exercise {
    pub fn from_record(record: ExerciseRecord) -> Result<Self, ExerciseError> {
        let id = record.id.trim().to_string();
        if id.is_empty() {
            return Err(ExerciseError::MissingId);
        }

        let kind = ExerciseKind::from_tag(&record.exercise_type);
        let answer_key = AnswerKey::parse(&kind, &record.correct_answer);
        let correct_answer = match &record.correct_answer {
            Value::Null => String::new(),
            other => scalar_text(other).unwrap_or_else(|| other.to_string()),
        };
        let points = u32::try_from(record.points.max(0)).unwrap_or(u32::MAX);

        Ok(Self {
            id,
            kind,
            prompt: record.prompt,
            options: coerce_string_list(&record.options),
            answer_key,
            correct_answer,
            explanation: record.explanation,
            points,
        })
    }

    pub fn is_drag_drop(&self) -> bool {
        self.kind.is_drag_drop()
    }
}
