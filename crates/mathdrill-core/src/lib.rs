//! mathdrill-core — Session controller, scoring and provider traits.
//!
//! This crate holds the problem-cycle state machine and everything it needs
//! except the concrete language-model client and the front end.

pub mod controller;
pub mod error;
pub mod evaluation;
pub mod model;
pub mod prompts;
pub mod score;
pub mod traits;
pub mod transcript;
pub mod view;

pub use controller::{
    ControllerConfig, EvaluationOutcome, FailureKind, ProblemOutcome, SessionController,
};
pub use model::{Difficulty, Evaluation, SessionPhase, SessionState};
pub use score::ScoreBoard;
pub use view::{Feedback, FeedbackKind, SessionView};
