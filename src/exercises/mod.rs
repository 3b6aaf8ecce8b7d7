// src/exercises/mod.rs
//
// Exercise model, answer capture, grading and session sequencing.
// Everything here except `effects` and `source` is synchronous and pure.

pub mod capture;
pub mod effects;
pub mod evaluator;
pub mod kind;
pub mod results;
pub mod session;
pub mod source;

pub use capture::{CaptureEvent, CapturedAnswer};
pub use kind::{AnswerKey, Exercise, ExerciseKind, FeedbackMode};
pub use session::{Batch, Command, Effect, ExerciseSession, Gradable, Phase};
