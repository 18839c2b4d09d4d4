//! The UI adapter boundary.
//!
//! The session controller never touches a terminal or a widget directly. It
//! calls into a [`SessionView`] that the front end supplies.

use serde::{Deserialize, Serialize};

use crate::model::{Difficulty, Evaluation};
use crate::score::ScoreBoard;

/// Whether a feedback card reports a correct or incorrect result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Correct,
    Incorrect,
}

/// A feedback card shown after a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub explanation: String,
}

impl Feedback {
    /// A card styled as incorrect, used for verdicts and for failures alike.
    pub fn incorrect(explanation: impl Into<String>) -> Self {
        Self {
            kind: FeedbackKind::Incorrect,
            explanation: explanation.into(),
        }
    }

    pub fn is_correct(&self) -> bool {
        self.kind == FeedbackKind::Correct
    }
}

impl From<&Evaluation> for Feedback {
    fn from(evaluation: &Evaluation) -> Self {
        Self {
            kind: if evaluation.is_correct {
                FeedbackKind::Correct
            } else {
                FeedbackKind::Incorrect
            },
            explanation: evaluation.explanation.clone(),
        }
    }
}

/// Rendering surface driven by the session controller.
pub trait SessionView {
    /// Toggle the loading indicator; while on, request triggers are disabled.
    fn set_loading(&mut self, loading: bool);

    /// Mark `difficulty` as the single active selector entry.
    fn highlight_difficulty(&mut self, difficulty: Difficulty);

    /// Replace the problem area with `text` (a problem or a placeholder).
    fn show_problem(&mut self, text: &str);

    /// Show or hide the answer input.
    fn set_answer_entry_visible(&mut self, visible: bool);

    fn clear_answer_input(&mut self);

    fn show_feedback(&mut self, feedback: &Feedback);

    fn clear_feedback(&mut self);

    /// Non-blocking notice, e.g. a rejected request.
    fn show_notice(&mut self, notice: &str);

    fn show_score(&mut self, score: &ScoreBoard);
}
