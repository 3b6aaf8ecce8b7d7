// src/exercises/session.rs

use std::collections::{BTreeMap, HashMap, HashSet};

use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use super::{
    capture::{self, CaptureEvent, CapturedAnswer},
    evaluator,
    kind::{Exercise, FeedbackMode},
    results::{self, Summary},
};
use crate::models::progress::{ProgressKey, ProgressSnapshot};

/// What a session needs to know about an exercise to sequence and grade it.
pub trait Gradable {
    fn id(&self) -> &str;
    fn points(&self) -> u32;
    fn feedback_mode(&self) -> FeedbackMode;
    fn is_drag_drop(&self) -> bool;
    fn prompt(&self) -> &str;
    fn correct_answer(&self) -> &str;
    fn explanation(&self) -> Option<&str>;
    fn initial_answer(&self) -> Option<CapturedAnswer>;
    fn capture(
        &self,
        current: Option<&CapturedAnswer>,
        event: CaptureEvent,
        rng: &mut dyn RngCore,
    ) -> Option<CapturedAnswer>;
    fn evaluate(&self, answer: Option<&CapturedAnswer>) -> bool;
}

impl Gradable for Exercise {
    fn id(&self) -> &str {
        &self.id
    }

    fn points(&self) -> u32 {
        self.points
    }

    fn feedback_mode(&self) -> FeedbackMode {
        self.kind.feedback_mode()
    }

    fn is_drag_drop(&self) -> bool {
        self.kind.is_drag_drop()
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    fn initial_answer(&self) -> Option<CapturedAnswer> {
        CapturedAnswer::initial(self)
    }

    fn capture(
        &self,
        current: Option<&CapturedAnswer>,
        event: CaptureEvent,
        rng: &mut dyn RngCore,
    ) -> Option<CapturedAnswer> {
        capture::apply(self, current, event, rng)
    }

    fn evaluate(&self, answer: Option<&CapturedAnswer>) -> bool {
        evaluator::evaluate(self, answer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "index", rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for the exercise list.
    Loading,
    /// Nothing to practise, either because the list was empty or the fetch failed.
    Empty,
    Answering(usize),
    Feedback(usize),
    /// Standard batch finished, drag-and-drop batch not yet started.
    Transitioning,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Batch {
    Standard,
    DragDrop,
}

/// One grading outcome. Appended, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub exercise_id: String,
    pub batch: Batch,
    pub is_correct: bool,
    pub points_awarded: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command<E> {
    Loaded(Vec<E>),
    LoadFailed(String),
    Capture(CaptureEvent),
    Submit,
    Next,
    Previous,
    TryAgain,
    BeginDragDrop,
}

/// Side effect requested by a transition. Executed elsewhere, never awaited here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SaveProgress {
        key: ProgressKey,
        snapshot: ProgressSnapshot,
    },
    DeleteProgress {
        key: ProgressKey,
    },
}

/// Linear walk through an exercise list, from first question to results.
///
/// Every transition is synchronous and returns the effects it wants run.
/// Commands that do not apply to the current phase are ignored.
pub struct ExerciseSession<E> {
    key: ProgressKey,
    standard: Vec<E>,
    drag_drop: Vec<E>,
    batch: Batch,
    phase: Phase,
    answers: HashMap<String, CapturedAnswer>,
    frozen: HashSet<String>,
    results: Vec<ResultEntry>,
    load_error: Option<String>,
    progress_cleared: bool,
    rng: StdRng,
}

impl<E: Gradable> ExerciseSession<E> {
    pub fn new(key: ProgressKey) -> Self {
        Self::with_rng(key, StdRng::from_rng(&mut rand::rng()))
    }

    /// Deterministic shuffles, for tests and replays.
    pub fn with_seed(key: ProgressKey, seed: u64) -> Self {
        Self::with_rng(key, StdRng::seed_from_u64(seed))
    }

    fn with_rng(key: ProgressKey, rng: StdRng) -> Self {
        Self {
            key,
            standard: Vec::new(),
            drag_drop: Vec::new(),
            batch: Batch::Standard,
            phase: Phase::Loading,
            answers: HashMap::new(),
            frozen: HashSet::new(),
            results: Vec::new(),
            load_error: None,
            progress_cleared: false,
            rng,
        }
    }

    pub fn handle(&mut self, command: Command<E>) -> Vec<Effect> {
        match command {
            Command::Loaded(exercises) => self.load(exercises),
            Command::LoadFailed(reason) => self.load_failed(reason),
            Command::Capture(event) => self.capture(event),
            Command::Submit => self.submit(),
            Command::Next => self.next(),
            Command::Previous => self.previous(),
            Command::TryAgain => self.try_again(),
            Command::BeginDragDrop => self.begin_drag_drop(),
        }
    }

    pub fn key(&self) -> &ProgressKey {
        &self.key
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn batch(&self) -> Batch {
        self.batch
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Exercise on screen while answering or reviewing feedback.
    pub fn current(&self) -> Option<&E> {
        match self.phase {
            Phase::Answering(i) | Phase::Feedback(i) => self.batch_exercises().get(i),
            _ => None,
        }
    }

    pub fn answer(&self, exercise_id: &str) -> Option<&CapturedAnswer> {
        self.answers.get(exercise_id)
    }

    pub fn is_frozen(&self, exercise_id: &str) -> bool {
        self.frozen.contains(exercise_id)
    }

    pub fn can_go_back(&self) -> bool {
        matches!(self.phase, Phase::Answering(i) if i > 0)
    }

    pub fn results(&self) -> &[ResultEntry] {
        &self.results
    }

    /// Latest outcome for an exercise; later submissions supersede earlier ones.
    pub fn latest_result(&self, exercise_id: &str) -> Option<&ResultEntry> {
        self.results
            .iter()
            .rev()
            .find(|r| r.exercise_id == exercise_id)
    }

    /// Standard batch followed by the drag-and-drop batch.
    pub fn exercises(&self) -> impl Iterator<Item = &E> {
        self.standard.iter().chain(self.drag_drop.iter())
    }

    pub fn total_questions(&self) -> usize {
        self.standard.len() + self.drag_drop.len()
    }

    /// Results screen. Exercises reopened with TryAgain count as ungraded
    /// until they are submitted again.
    pub fn summary(&self) -> Summary {
        let graded: Vec<ResultEntry> = self
            .results
            .iter()
            .filter(|entry| self.frozen.contains(&entry.exercise_id))
            .cloned()
            .collect();
        results::summarize(self.exercises(), &self.answers, &graded)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let offset = match self.batch {
            Batch::Standard => 0,
            Batch::DragDrop => self.standard.len(),
        };
        let current_index = match self.phase {
            Phase::Loading | Phase::Empty => 0,
            Phase::Answering(i) | Phase::Feedback(i) => offset + i,
            Phase::Transitioning => self.standard.len(),
            Phase::Complete => self.total_questions(),
        };
        let answers: BTreeMap<String, String> = self
            .answers
            .iter()
            .map(|(id, answer)| (id.clone(), answer.to_wire()))
            .collect();

        ProgressSnapshot {
            current_index,
            answers,
            total_questions: self.total_questions(),
        }
    }

    fn batch_exercises(&self) -> &[E] {
        match self.batch {
            Batch::Standard => &self.standard,
            Batch::DragDrop => &self.drag_drop,
        }
    }

    fn save_effect(&self) -> Effect {
        Effect::SaveProgress {
            key: self.key.clone(),
            snapshot: self.snapshot(),
        }
    }

    fn load(&mut self, exercises: Vec<E>) -> Vec<Effect> {
        if self.phase != Phase::Loading {
            tracing::warn!("Ignoring exercise list delivered outside of loading");
            return Vec::new();
        }

        let mut seen = HashSet::new();
        for exercise in exercises {
            if !seen.insert(exercise.id().to_string()) {
                tracing::warn!("Skipping duplicate exercise id {}", exercise.id());
                continue;
            }
            if exercise.is_drag_drop() {
                self.drag_drop.push(exercise);
            } else {
                self.standard.push(exercise);
            }
        }

        if self.standard.is_empty() && self.drag_drop.is_empty() {
            self.phase = Phase::Empty;
        } else {
            if self.standard.is_empty() {
                self.batch = Batch::DragDrop;
            }
            self.enter(0);
        }
        Vec::new()
    }

    fn load_failed(&mut self, reason: String) -> Vec<Effect> {
        if self.phase == Phase::Loading {
            tracing::warn!("Exercise list unavailable: {}", reason);
            self.load_error = Some(reason);
            self.phase = Phase::Empty;
        }
        Vec::new()
    }

    /// Enters `Answering(index)`, seeding list answers that start from the options.
    fn enter(&mut self, index: usize) {
        self.phase = Phase::Answering(index);
        let exercises = match self.batch {
            Batch::Standard => &self.standard,
            Batch::DragDrop => &self.drag_drop,
        };
        if let Some(exercise) = exercises.get(index) {
            if !self.answers.contains_key(exercise.id()) {
                if let Some(initial) = exercise.initial_answer() {
                    self.answers.insert(exercise.id().to_string(), initial);
                }
            }
        }
    }

    fn capture(&mut self, event: CaptureEvent) -> Vec<Effect> {
        let Phase::Answering(index) = self.phase else {
            return Vec::new();
        };
        let exercises = match self.batch {
            Batch::Standard => &self.standard,
            Batch::DragDrop => &self.drag_drop,
        };
        let Some(exercise) = exercises.get(index) else {
            return Vec::new();
        };
        if self.frozen.contains(exercise.id()) {
            return Vec::new();
        }

        let Some(updated) = exercise.capture(self.answers.get(exercise.id()), event, &mut self.rng)
        else {
            return Vec::new();
        };
        let immediate = exercise.feedback_mode() == FeedbackMode::Immediate;
        self.answers.insert(exercise.id().to_string(), updated);

        if immediate {
            self.grade(index);
        }
        vec![self.save_effect()]
    }

    fn submit(&mut self) -> Vec<Effect> {
        let Phase::Answering(index) = self.phase else {
            return Vec::new();
        };
        let Some(id) = self.batch_exercises().get(index).map(|e| e.id().to_string()) else {
            return Vec::new();
        };
        if self.frozen.contains(&id) {
            // Already graded and untouched since: show the stored outcome again.
            self.phase = Phase::Feedback(index);
            return Vec::new();
        }
        self.grade(index);
        vec![self.save_effect()]
    }

    fn grade(&mut self, index: usize) {
        let exercises = match self.batch {
            Batch::Standard => &self.standard,
            Batch::DragDrop => &self.drag_drop,
        };
        let Some(exercise) = exercises.get(index) else {
            return;
        };
        let id = exercise.id().to_string();
        let is_correct = exercise.evaluate(self.answers.get(&id));
        let points_awarded = if is_correct { exercise.points() } else { 0 };

        tracing::debug!(
            "Graded exercise {}: correct={}, points={}",
            id,
            is_correct,
            points_awarded
        );

        self.results.push(ResultEntry {
            exercise_id: id.clone(),
            batch: self.batch,
            is_correct,
            points_awarded,
        });
        self.frozen.insert(id);
        self.phase = Phase::Feedback(index);
    }

    fn next(&mut self) -> Vec<Effect> {
        let Phase::Feedback(index) = self.phase else {
            return Vec::new();
        };
        if index + 1 < self.batch_exercises().len() {
            self.enter(index + 1);
            return vec![self.save_effect()];
        }
        if self.batch == Batch::Standard && !self.drag_drop.is_empty() {
            self.phase = Phase::Transitioning;
            return vec![self.save_effect()];
        }
        self.complete()
    }

    fn complete(&mut self) -> Vec<Effect> {
        self.phase = Phase::Complete;
        if self.progress_cleared {
            return Vec::new();
        }
        self.progress_cleared = true;
        tracing::info!(
            "Session complete for resource {} ({})",
            self.key.resource_id,
            self.key.difficulty
        );
        vec![Effect::DeleteProgress {
            key: self.key.clone(),
        }]
    }

    fn begin_drag_drop(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Transitioning {
            return Vec::new();
        }
        self.batch = Batch::DragDrop;
        self.enter(0);
        vec![self.save_effect()]
    }

    fn previous(&mut self) -> Vec<Effect> {
        match self.phase {
            Phase::Answering(index) if index > 0 => {
                self.enter(index - 1);
                vec![self.save_effect()]
            }
            _ => Vec::new(),
        }
    }

    fn try_again(&mut self) -> Vec<Effect> {
        let index = match self.phase {
            Phase::Answering(i) | Phase::Feedback(i) => i,
            _ => return Vec::new(),
        };
        let Some(id) = self.batch_exercises().get(index).map(|e| e.id().to_string()) else {
            return Vec::new();
        };
        if !self.frozen.remove(&id) {
            return Vec::new();
        }
        self.answers.remove(&id);
        self.enter(index);
        vec![self.save_effect()]
    }
}
