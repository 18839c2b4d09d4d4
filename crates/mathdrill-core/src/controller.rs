//! The session controller.
//!
//! Drives one practice session through its problem cycle:
//!
//! ```text
//! IDLE --request_problem(ok)--> AWAITING_ANSWER --evaluate_answer(ok)--> IDLE
//! ```
//!
//! `request_problem` while awaiting an answer is rejected without a network
//! call, and a failed evaluation leaves the session awaiting an answer so the
//! user can resubmit. Operations take `&mut self`, so at most one request is
//! ever in flight per session.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ProviderError;
use crate::evaluation::parse_evaluation;
use crate::model::{CycleRecord, Difficulty, Evaluation, SessionState};
use crate::prompts::{evaluation_prompt, problem_prompt};
use crate::score::ScoreBoard;
use crate::traits::{GenerateRequest, LlmProvider};
use crate::view::{Feedback, SessionView};

pub const PENDING_PROBLEM_NOTICE: &str = "Please submit an answer for the current problem first.";
pub const NO_PROBLEM_NOTICE: &str = "Request a new problem first.";
pub const EMPTY_ANSWER_TEXT: &str = "Please enter an answer before submitting.";
pub const GENERATE_MALFORMED_TEXT: &str = "Could not generate a problem. Please try again.";
pub const GENERATE_FAILED_TEXT: &str = "Failed to fetch problem. Check the logs for details.";
pub const EVALUATE_MALFORMED_TEXT: &str = "Could not evaluate the answer. Please try again.";
pub const EVALUATE_FAILED_TEXT: &str = "Failed to evaluate answer. Check the logs for details.";

/// Settings the controller passes through to every request.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Model identifier sent with each request.
    pub model: String,
    /// Sampling temperature; the service default when `None`.
    pub temperature: Option<f64>,
    /// Output token cap; the service default when `None`.
    pub max_tokens: Option<u32>,
    /// Difficulty the session starts with.
    pub initial_difficulty: Difficulty,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            temperature: None,
            max_tokens: None,
            initial_difficulty: Difficulty::default(),
        }
    }
}

/// Why a request to the service did not produce a usable result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network or HTTP-level failure.
    Transport,
    /// A reply arrived but lacked the expected shape or payload.
    Malformed,
}

/// Result of [`SessionController::request_problem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProblemOutcome {
    /// A problem is already awaiting an answer; nothing was sent.
    Rejected,
    /// A new problem is shown and awaits an answer.
    Generated(String),
    /// A placeholder is shown; the session stays idle.
    Failed(FailureKind),
}

/// Result of [`SessionController::evaluate_answer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationOutcome {
    /// The trimmed answer was empty; nothing was sent.
    EmptyAnswer,
    /// There is no problem to answer; nothing was sent.
    NoProblem,
    /// The answer was graded and scored.
    Graded(Evaluation),
    /// Grading failed; score untouched, the problem still awaits an answer.
    Failed(FailureKind),
}

/// Owns the session state and runs the two request flows against a provider.
pub struct SessionController {
    provider: Arc<dyn LlmProvider>,
    config: ControllerConfig,
    state: SessionState,
    session_id: Uuid,
    started_at: DateTime<Utc>,
}

impl SessionController {
    pub fn new(provider: Arc<dyn LlmProvider>, config: ControllerConfig) -> Self {
        let state = SessionState::new(config.initial_difficulty);
        Self {
            provider,
            config,
            state,
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn score(&self) -> &ScoreBoard {
        self.state.score()
    }

    pub fn history(&self) -> &[CycleRecord] {
        self.state.history()
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Push the full current state to a freshly attached view.
    pub fn render(&self, view: &mut dyn SessionView) {
        view.set_loading(false);
        view.highlight_difficulty(self.state.difficulty());
        view.show_score(self.state.score());
        if self.state.awaiting_answer() {
            view.show_problem(self.state.current_problem());
        }
        view.set_answer_entry_visible(self.state.awaiting_answer());
    }

    /// Switch the difficulty used by the next problem request.
    pub fn select_difficulty(&mut self, difficulty: Difficulty, view: &mut dyn SessionView) {
        self.state.set_difficulty(difficulty);
        view.highlight_difficulty(difficulty);
        tracing::debug!(%difficulty, "difficulty selected");
    }

    /// Ask the service for a new problem at the selected difficulty.
    #[instrument(skip_all, fields(session = %self.session_id, difficulty = %self.state.difficulty()))]
    pub async fn request_problem(&mut self, view: &mut dyn SessionView) -> ProblemOutcome {
        if self.state.awaiting_answer() {
            tracing::debug!("problem requested while one is pending");
            view.show_notice(PENDING_PROBLEM_NOTICE);
            return ProblemOutcome::Rejected;
        }

        view.clear_feedback();
        view.clear_answer_input();
        view.set_loading(true);

        let request = GenerateRequest::new(
            self.config.model.clone(),
            problem_prompt(self.state.difficulty()),
        )
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens);
        let result = self.provider.generate(&request).await;

        view.set_loading(false);

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                let kind = classify(&e);
                log_rate_limit(&e);
                tracing::error!("error generating problem: {e:#}");
                view.show_problem(match kind {
                    FailureKind::Malformed => GENERATE_MALFORMED_TEXT,
                    FailureKind::Transport => GENERATE_FAILED_TEXT,
                });
                return ProblemOutcome::Failed(kind);
            }
        };

        let problem = response.content.trim();
        if problem.is_empty() {
            tracing::warn!("service returned an empty problem statement");
            view.show_problem(GENERATE_MALFORMED_TEXT);
            return ProblemOutcome::Failed(FailureKind::Malformed);
        }

        tracing::info!(
            latency_ms = response.latency_ms,
            tokens = response.token_usage.total_tokens,
            "problem generated"
        );
        self.state.begin_cycle(problem.to_string());
        view.show_problem(self.state.current_problem());
        view.set_answer_entry_visible(true);
        ProblemOutcome::Generated(problem.to_string())
    }

    /// Send the current problem and `raw_answer` to the service for grading.
    #[instrument(skip_all, fields(session = %self.session_id))]
    pub async fn evaluate_answer(
        &mut self,
        raw_answer: &str,
        view: &mut dyn SessionView,
    ) -> EvaluationOutcome {
        let answer = raw_answer.trim();
        if answer.is_empty() {
            view.show_feedback(&Feedback::incorrect(EMPTY_ANSWER_TEXT));
            return EvaluationOutcome::EmptyAnswer;
        }
        if !self.state.awaiting_answer() {
            view.show_notice(NO_PROBLEM_NOTICE);
            return EvaluationOutcome::NoProblem;
        }

        view.set_loading(true);
        view.clear_feedback();

        let request = GenerateRequest::new(
            self.config.model.clone(),
            evaluation_prompt(self.state.current_problem(), answer),
        )
        .json()
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens);
        let result = self.provider.generate(&request).await;

        view.set_loading(false);

        let verdict = match result {
            Ok(response) => parse_evaluation(&response.content).map_err(|e| {
                tracing::warn!(payload = %response.content, "unparseable evaluation: {e}");
                FailureKind::Malformed
            }),
            Err(e) => {
                log_rate_limit(&e);
                tracing::error!("error evaluating answer: {e:#}");
                Err(classify(&e))
            }
        };

        match verdict {
            Ok(evaluation) => {
                view.show_feedback(&Feedback::from(&evaluation));
                self.state.complete_cycle(answer, &evaluation);
                view.show_score(self.state.score());
                view.set_answer_entry_visible(false);
                tracing::info!(
                    correct = evaluation.is_correct,
                    score = %self.state.score().display(),
                    "answer graded"
                );
                EvaluationOutcome::Graded(evaluation)
            }
            Err(kind) => {
                view.show_feedback(&Feedback::incorrect(match kind {
                    FailureKind::Malformed => EVALUATE_MALFORMED_TEXT,
                    FailureKind::Transport => EVALUATE_FAILED_TEXT,
                }));
                view.set_answer_entry_visible(true);
                EvaluationOutcome::Failed(kind)
            }
        }
    }
}

fn log_rate_limit(err: &anyhow::Error) {
    if let Some(ms) = err
        .downcast_ref::<ProviderError>()
        .and_then(ProviderError::retry_after_ms)
    {
        tracing::warn!(retry_after_ms = ms, "rate limited by the service");
    }
}

/// Errors that are not a [`ProviderError`] count as transport failures.
fn classify(err: &anyhow::Error) -> FailureKind {
    match err.downcast_ref::<ProviderError>() {
        Some(e) if !e.is_transport() => FailureKind::Malformed,
        _ => FailureKind::Transport,
    }
}
