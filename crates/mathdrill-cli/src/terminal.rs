//! Line-oriented terminal rendering of a practice session.

use std::io::Write;

use mathdrill_core::{Difficulty, Feedback, FeedbackKind, ScoreBoard, SessionView};

/// Render the difficulty selector with exactly one entry marked active.
pub fn difficulty_bar(active: Difficulty) -> String {
    Difficulty::ALL
        .iter()
        .map(|d| {
            if *d == active {
                format!("[{d}]")
            } else {
                format!(" {d} ")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `SessionView` that prints to any writer, normally stdout.
pub struct TerminalView<W: Write> {
    out: W,
    loading: bool,
    answer_entry: bool,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            loading: false,
            answer_entry: false,
        }
    }

    /// Whether typed text is currently treated as an answer.
    pub fn answer_entry_visible(&self) -> bool {
        self.answer_entry
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print an arbitrary line (help text, summaries).
    pub fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}").and_then(|_| self.out.flush()) {
            tracing::warn!("failed to write to terminal: {e}");
        }
    }

    /// Print the input prompt without a trailing newline.
    pub fn prompt(&mut self) {
        let marker = if self.answer_entry { "answer> " } else { "> " };
        if let Err(e) = write!(self.out, "{marker}").and_then(|_| self.out.flush()) {
            tracing::warn!("failed to write to terminal: {e}");
        }
    }
}

impl<W: Write> SessionView for TerminalView<W> {
    fn set_loading(&mut self, loading: bool) {
        if loading && !self.loading {
            self.line("Thinking...");
        }
        self.loading = loading;
    }

    fn highlight_difficulty(&mut self, difficulty: Difficulty) {
        self.line(&format!("Difficulty: {}", difficulty_bar(difficulty)));
    }

    fn show_problem(&mut self, text: &str) {
        self.line("");
        self.line(&format!("Problem: {text}"));
        self.line("");
    }

    fn set_answer_entry_visible(&mut self, visible: bool) {
        if visible && !self.answer_entry {
            self.line("Type your answer and press Enter.");
        }
        self.answer_entry = visible;
    }

    // The submitted line is already consumed from stdin.
    fn clear_answer_input(&mut self) {}

    fn show_feedback(&mut self, feedback: &Feedback) {
        let heading = match feedback.kind {
            FeedbackKind::Correct => "Correct! ✅",
            FeedbackKind::Incorrect => "Incorrect ❌",
        };
        self.line(heading);
        if !feedback.explanation.is_empty() {
            self.line(&format!("  {}", feedback.explanation));
        }
    }

    fn clear_feedback(&mut self) {}

    fn show_notice(&mut self, notice: &str) {
        self.line(&format!("Note: {notice}"));
    }

    fn show_score(&mut self, score: &ScoreBoard) {
        self.line(&format!(
            "Score: {}   Accuracy: {}",
            score.display(),
            score.accuracy_display()
        ));
    }
}
