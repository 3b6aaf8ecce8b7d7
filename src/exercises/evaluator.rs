// src/exercises/evaluator.rs

use super::{
    capture::CapturedAnswer,
    kind::{AnswerKey, Exercise, ExerciseKind},
};

/// Decides whether `answer` is correct for `exercise`.
///
/// Pure and total: a missing, empty or unparseable answer is simply incorrect.
pub fn evaluate(exercise: &Exercise, answer: Option<&CapturedAnswer>) -> bool {
    let Some(answer) = answer else {
        return false;
    };
    if answer.is_empty() {
        return false;
    }

    match exercise.kind {
        ExerciseKind::MultipleChoice
        | ExerciseKind::TrueFalse
        | ExerciseKind::Cloze
        | ExerciseKind::SpotTheError => text_matches(&exercise.answer_key, answer, normalize),
        // Unknown types get plain string equality.
        ExerciseKind::Other(_) => text_matches(&exercise.answer_key, answer, |s| s.to_string()),
        // Pairs are compared position by position, not as a set.
        ExerciseKind::Matching | ExerciseKind::DragMatching | ExerciseKind::DragCategorization => {
            match &exercise.answer_key {
                AnswerKey::Pairs(expected) => positional_match(expected, &answer.tokens()),
                _ => false,
            }
        }
        ExerciseKind::Sequencing | ExerciseKind::DragSequencing | ExerciseKind::DragWordOrder => {
            match &exercise.answer_key {
                AnswerKey::Order(expected) => positional_match(expected, &answer.tokens()),
                _ => false,
            }
        }
    }
}

/// All-or-nothing reward.
pub fn points_awarded(exercise: &Exercise, is_correct: bool) -> u32 {
    if is_correct { exercise.points } else { 0 }
}

fn text_matches(key: &AnswerKey, answer: &CapturedAnswer, canonical: fn(&str) -> String) -> bool {
    let AnswerKey::Text(expected) = key else {
        return false;
    };
    let given = match answer {
        CapturedAnswer::Text(s) => s.clone(),
        other => other.to_wire(),
    };
    canonical(&given) == canonical(expected)
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn positional_match(expected: &[String], given: &[String]) -> bool {
    expected.len() == given.len()
        && expected
            .iter()
            .zip(given)
            .all(|(e, g)| e.trim() == g.trim())
}
