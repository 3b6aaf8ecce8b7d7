// src/models/exercise.rs

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::exercises::kind::ExerciseKind;

/// Raw exercise as delivered by an exercise source.
///
/// `options` and `correct_answer` are kept as loose JSON because generated
/// sets deliver them either as parsed structures or as serialized strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    /// Type tag, e.g. `multiple_choice` or `drag_word_order`.
    #[serde(rename = "type", alias = "exerciseType", alias = "exercise_type")]
    pub exercise_type: String,

    #[serde(default, alias = "question")]
    pub prompt: String,

    #[serde(default)]
    pub options: Value,

    #[serde(default, alias = "correct_answer")]
    pub correct_answer: Value,

    #[serde(default)]
    pub explanation: Option<String>,

    #[serde(default = "default_points")]
    pub points: i64,
}

fn default_points() -> i64 {
    1
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// String form of a scalar JSON value. Arrays and objects have none.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Coerces a loosely-typed list field into a list of strings.
///
/// Accepts a JSON array, a string holding a JSON array, a comma-joined string,
/// a lone scalar, or null.
pub fn coerce_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .map(|item| scalar_text(item).unwrap_or_else(|| item.to_string()))
            .collect(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Vec::new();
            }
            if trimmed.starts_with('[') {
                if let Ok(parsed @ Value::Array(_)) = serde_json::from_str::<Value>(trimmed) {
                    return coerce_string_list(&parsed);
                }
            }
            trimmed
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        }
        other => scalar_text(other).into_iter().collect(),
    }
}

/// DTO for one exercise inside an admin upload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewExercise {
    #[validate(length(min = 1, max = 40), custom(function = validate_exercise_type))]
    #[serde(rename = "type")]
    pub exercise_type: String,
    #[validate(length(min = 1, max = 2000))]
    pub prompt: String,
    #[validate(custom(function = validate_options))]
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(alias = "correct_answer")]
    pub correct_answer: Value,
    #[validate(length(max = 2000))]
    pub explanation: Option<String>,
    #[validate(range(min = 0, max = 1000))]
    pub points: i32,
}

/// DTO for storing a pre-generated exercise set for one (resource, difficulty).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExerciseSetRequest {
    #[validate(length(min = 1, max = 200))]
    #[serde(alias = "resource_id")]
    pub resource_id: String,
    #[validate(length(min = 1, max = 20))]
    pub difficulty: String,
    #[validate(length(min = 1, max = 200), nested)]
    pub exercises: Vec<NewExercise>,
}

fn validate_exercise_type(tag: &str) -> Result<(), validator::ValidationError> {
    match ExerciseKind::from_tag(tag) {
        ExerciseKind::Other(_) => Err(validator::ValidationError::new("unknown_exercise_type")),
        _ => Ok(()),
    }
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    for opt in options {
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

impl NewExercise {
    /// Converts the upload DTO into the record shape served to clients.
    pub fn into_record(self, id: String) -> ExerciseRecord {
        ExerciseRecord {
            id,
            exercise_type: self.exercise_type,
            prompt: self.prompt,
            options: Value::from(self.options),
            correct_answer: self.correct_answer,
            explanation: self.explanation,
            points: i64::from(self.points),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_parsed_and_serialized_lists() {
        assert_eq!(coerce_string_list(&json!(["a", "b"])), vec!["a", "b"]);
        assert_eq!(coerce_string_list(&json!("[\"a\",\"b\"]")), vec!["a", "b"]);
        assert_eq!(coerce_string_list(&json!("[0, 1, 2]")), vec!["0", "1", "2"]);
        assert_eq!(coerce_string_list(&json!("1, 0 ,2")), vec!["1", "0", "2"]);
        assert!(coerce_string_list(&Value::Null).is_empty());
        assert!(coerce_string_list(&json!("  ")).is_empty());
    }

    #[test]
    fn record_accepts_camel_and_snake_case() {
        let camel: ExerciseRecord = serde_json::from_value(json!({
            "id": 7,
            "type": "cloze",
            "prompt": "Je bois un ___",
            "correctAnswer": "café",
            "points": 5
        }))
        .unwrap();
        assert_eq!(camel.id, "7");
        assert_eq!(camel.correct_answer, json!("café"));
        assert_eq!(camel.options, Value::Null);

        let snake: ExerciseRecord = serde_json::from_value(json!({
            "id": "q1",
            "exercise_type": "matching",
            "question": "Match",
            "correct_answer": ["chat:0"],
        }))
        .unwrap();
        assert_eq!(snake.prompt, "Match");
        assert_eq!(snake.points, 1);
    }

    #[test]
    fn rejects_unknown_exercise_type_on_upload() {
        let req = CreateExerciseSetRequest {
            resource_id: "video-1".to_string(),
            difficulty: "beginner".to_string(),
            exercises: vec![NewExercise {
                exercise_type: "crossword".to_string(),
                prompt: "?".to_string(),
                options: vec![],
                correct_answer: json!("x"),
                explanation: None,
                points: 1,
            }],
        };
        assert!(req.validate().is_err());
    }
}
