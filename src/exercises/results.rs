// src/exercises/results.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{
    capture::CapturedAnswer,
    session::{Batch, Gradable, ResultEntry},
};

/// One row of the post-session review list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub exercise_id: String,
    pub prompt: String,
    pub your_answer: Option<String>,
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub is_correct: bool,
    pub points_awarded: u32,
    pub max_points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_score: u64,
    pub max_score: u64,
    /// `None` when there is nothing to score.
    pub percentage: Option<u32>,
    pub correct_count: usize,
    pub total_questions: usize,
    pub review: Vec<ReviewItem>,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.total_questions == 0
    }
}

/// `round(100 * total / max)`, or `None` when `max` is zero.
pub fn percentage(total: u64, max: u64) -> Option<u32> {
    (max > 0).then(|| (total as f64 * 100.0 / max as f64).round() as u32)
}

/// Builds the results screen.
///
/// Scores come from the recorded results (latest entry per exercise); the
/// review list re-runs the evaluator on the captured answers. An exercise
/// without a result is reviewed as unanswered, whatever is captured for it.
pub fn summarize<'a, E, I>(
    exercises: I,
    answers: &HashMap<String, CapturedAnswer>,
    results: &[ResultEntry],
) -> Summary
where
    E: Gradable + 'a,
    I: IntoIterator<Item = &'a E>,
{
    let mut latest: HashMap<&str, &ResultEntry> = HashMap::new();
    for entry in results {
        latest.insert(entry.exercise_id.as_str(), entry);
    }

    let mut total_score: u64 = 0;
    let mut max_score: u64 = 0;
    let mut correct_count = 0;
    let mut review = Vec::new();

    for exercise in exercises {
        max_score += u64::from(exercise.points());
        let entry = latest.get(exercise.id());
        if let Some(entry) = entry {
            total_score += u64::from(entry.points_awarded);
            if entry.is_correct {
                correct_count += 1;
            }
        }

        let answer = answers.get(exercise.id());
        let is_correct = entry.is_some() && exercise.evaluate(answer);
        review.push(ReviewItem {
            exercise_id: exercise.id().to_string(),
            prompt: exercise.prompt().to_string(),
            your_answer: answer.map(CapturedAnswer::to_wire),
            correct_answer: exercise.correct_answer().to_string(),
            explanation: exercise.explanation().map(str::to_string),
            is_correct,
            points_awarded: if is_correct { exercise.points() } else { 0 },
            max_points: exercise.points(),
        });
    }

    Summary {
        total_score,
        max_score,
        percentage: percentage(total_score, max_score),
        correct_count,
        total_questions: review.len(),
        review,
    }
}

/// Grades a complete answer map in one pass, as a batch submission would.
pub fn grade_all<E: Gradable>(exercises: &[E], answers: &HashMap<String, CapturedAnswer>) -> Summary {
    let results: Vec<ResultEntry> = exercises
        .iter()
        .map(|exercise| {
            let is_correct = exercise.evaluate(answers.get(exercise.id()));
            ResultEntry {
                exercise_id: exercise.id().to_string(),
                batch: if exercise.is_drag_drop() {
                    Batch::DragDrop
                } else {
                    Batch::Standard
                },
                is_correct,
                points_awarded: if is_correct { exercise.points() } else { 0 },
            }
        })
        .collect();

    summarize(exercises, answers, &results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercises::kind::Exercise;
    use crate::models::exercise::ExerciseRecord;
    use serde_json::json;

    fn choice(id: &str, answer: &str, points: i64) -> Exercise {
        Exercise::from_record(ExerciseRecord {
            id: id.to_string(),
            exercise_type: "multiple_choice".to_string(),
            prompt: id.to_string(),
            options: json!(["A", "B", "C", "D"]),
            correct_answer: json!(answer),
            explanation: None,
            points,
        })
        .unwrap()
    }

    #[test]
    fn percentage_rounds_and_guards_zero() {
        assert_eq!(percentage(2, 3), Some(67));
        assert_eq!(percentage(1, 8), Some(13));
        assert_eq!(percentage(0, 5), Some(0));
        assert_eq!(percentage(0, 0), None);
    }

    #[test]
    fn grade_all_matches_end_to_end_scenario() {
        let exercises = vec![choice("q1", "B", 10), choice("q2", "A", 10), choice("q3", "D", 10)];
        let answers: HashMap<String, CapturedAnswer> = [("q1", "B"), ("q2", "A"), ("q3", "C")]
            .into_iter()
            .map(|(id, a)| (id.to_string(), CapturedAnswer::Text(a.to_string())))
            .collect();

        let summary = grade_all(&exercises, &answers);
        assert_eq!(summary.total_score, 20);
        assert_eq!(summary.max_score, 30);
        assert_eq!(summary.percentage, Some(67));
        assert_eq!(summary.correct_count, 2);
        assert_eq!(summary.review[2].your_answer.as_deref(), Some("C"));
        assert_eq!(summary.review[2].correct_answer, "D");
    }

    #[test]
    fn zero_point_sets_have_no_percentage() {
        let exercises = vec![choice("q1", "A", 0)];
        let summary = grade_all(&exercises, &HashMap::new());
        assert_eq!(summary.percentage, None);
        assert!(!summary.is_empty());

        let none: Vec<Exercise> = Vec::new();
        assert!(grade_all(&none, &HashMap::new()).is_empty());
    }

    #[test]
    fn later_results_supersede_earlier_ones() {
        let exercises = vec![choice("q1", "A", 4)];
        let answers: HashMap<String, CapturedAnswer> =
            [("q1".to_string(), CapturedAnswer::Text("A".to_string()))].into();
        let results = vec![
            ResultEntry {
                exercise_id: "q1".to_string(),
                batch: Batch::Standard,
                is_correct: false,
                points_awarded: 0,
            },
            ResultEntry {
                exercise_id: "q1".to_string(),
                batch: Batch::Standard,
                is_correct: true,
                points_awarded: 4,
            },
        ];
        let summary = summarize(&exercises, &answers, &results);
        assert_eq!(summary.total_score, 4);
        assert_eq!(summary.percentage, Some(100));
    }

    #[test]
    fn large_point_values_do_not_overflow() {
        let exercises = vec![
            choice("q1", "A", 3_000_000_000),
            choice("q2", "B", 3_000_000_000),
        ];
        let answers: HashMap<String, CapturedAnswer> = [
            ("q1".to_string(), CapturedAnswer::Text("A".to_string())),
            ("q2".to_string(), CapturedAnswer::Text("C".to_string())),
        ]
        .into();

        let summary = grade_all(&exercises, &answers);
        assert_eq!(summary.max_score, 6_000_000_000);
        assert_eq!(summary.total_score, 3_000_000_000);
        assert_eq!(summary.percentage, Some(50));
    }

    #[test]
    fn ungraded_answers_are_reviewed_as_unanswered() {
        let exercises = vec![choice("q1", "A", 4)];
        let answers: HashMap<String, CapturedAnswer> =
            [("q1".to_string(), CapturedAnswer::Text("A".to_string()))].into();

        let summary = summarize(&exercises, &answers, &[]);
        assert_eq!(summary.total_score, 0);
        assert!(!summary.review[0].is_correct);
        assert_eq!(summary.review[0].points_awarded, 0);
    }

    #[test]
    fn summary_uses_camel_case_on_the_wire() {
        let summary = grade_all(&[choice("q1", "A", 1)], &HashMap::new());
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["totalScore"], 0);
        assert_eq!(value["review"][0]["correctAnswer"], "A");
    }
}
