//! Core data model types for mathdrill.
//!
//! These are the types the session controller and its collaborators share:
//! the difficulty tier, the grader's verdict, and the in-memory session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::score::ScoreBoard;

/// Problem-complexity tier selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Every tier, in selector order.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// The grader's verdict on one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Whether the answer was judged correct.
    #[serde(rename = "isCorrect")]
    pub is_correct: bool,
    /// Short explanation; for wrong answers it carries the correct answer.
    #[serde(default)]
    pub explanation: String,
}

/// One graded generate → answer → evaluate round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleRecord {
    pub difficulty: Difficulty,
    pub problem: String,
    pub answer: String,
    pub is_correct: bool,
    pub explanation: String,
    pub graded_at: DateTime<Utc>,
}

/// Token accounting reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Where the session is in its problem cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No active problem.
    Idle,
    /// A problem is shown and has not been graded yet.
    AwaitingAnswer,
}

/// In-memory state of one practice session.
///
/// Fields are only mutated by the session controller, which keeps the
/// invariants: `awaiting_answer` implies a non-empty `current_problem`, and
/// `score.correct <= score.total`.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    difficulty: Difficulty,
    current_problem: String,
    problem_difficulty: Difficulty,
    awaiting_answer: bool,
    score: ScoreBoard,
    history: Vec<CycleRecord>,
}

impl SessionState {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// The problem currently shown, or `""` before the first success.
    pub fn current_problem(&self) -> &str {
        &self.current_problem
    }

    pub fn awaiting_answer(&self) -> bool {
        self.awaiting_answer
    }

    pub fn score(&self) -> &ScoreBoard {
        &self.score
    }

    pub fn history(&self) -> &[CycleRecord] {
        &self.history
    }

    pub fn phase(&self) -> SessionPhase {
        if self.awaiting_answer {
            SessionPhase::AwaitingAnswer
        } else {
            SessionPhase::Idle
        }
    }

    pub(crate) fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// IDLE → AWAITING_ANSWER. The problem is tagged with the tier it was
    /// generated at, so later selector changes don't affect its record.
    pub(crate) fn begin_cycle(&mut self, problem: String) {
        debug_assert!(!problem.is_empty());
        self.current_problem = problem;
        self.problem_difficulty = self.difficulty;
        self.awaiting_answer = true;
    }

    /// AWAITING_ANSWER → IDLE, recording the verdict.
    pub(crate) fn complete_cycle(&mut self, answer: &str, evaluation: &Evaluation) {
        self.score.record(evaluation.is_correct);
        self.history.push(CycleRecord {
            difficulty: self.problem_difficulty,
            problem: self.current_problem.clone(),
            answer: answer.to_string(),
            is_correct: evaluation.is_correct,
            explanation: evaluation.explanation.clone(),
            graded_at: Utc::now(),
        });
        self.awaiting_answer = false;
    }
}
