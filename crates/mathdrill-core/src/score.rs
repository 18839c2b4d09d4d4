//! Running correctness score.

use serde::{Deserialize, Serialize};

/// Cumulative correct/total counters for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBoard {
    pub correct: u32,
    pub total: u32,
}

impl ScoreBoard {
    /// Count one graded answer.
    pub fn record(&mut self, is_correct: bool) {
        self.total += 1;
        if is_correct {
            self.correct += 1;
        }
    }

    /// Fraction of correct answers in percent, `None` before the first grade.
    pub fn accuracy(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.correct as f64 / self.total as f64 * 100.0)
        }
    }

    /// `"{correct} / {total}"`.
    pub fn display(&self) -> String {
        format!("{} / {}", self.correct, self.total)
    }

    /// Accuracy with one decimal and a `%` suffix, or `"N/A"`.
    pub fn accuracy_display(&self) -> String {
        match self.accuracy() {
            Some(pct) => format!("{pct:.1}%"),
            None => "N/A".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_three_of_four() {
        let score = ScoreBoard {
            correct: 3,
            total: 4,
        };
        assert_eq!(score.accuracy_display(), "75.0%");
    }

    #[test]
    fn accuracy_without_answers() {
        assert_eq!(ScoreBoard::default().accuracy_display(), "N/A");
        assert_eq!(ScoreBoard::default().accuracy(), None);
    }

    #[test]
    fn score_two_of_five() {
        let score = ScoreBoard {
            correct: 2,
            total: 5,
        };
        assert_eq!(score.display(), "2 / 5");
        assert_eq!(score.accuracy_display(), "40.0%");
    }

    #[test]
    fn accuracy_rounds_to_one_decimal() {
        let score = ScoreBoard {
            correct: 1,
            total: 3,
        };
        assert_eq!(score.accuracy_display(), "33.3%");
        let score = ScoreBoard {
            correct: 2,
            total: 3,
        };
        assert_eq!(score.accuracy_display(), "66.7%");
    }

    #[test]
    fn record_keeps_correct_at_most_total() {
        let mut score = ScoreBoard::default();
        for correct in [true, false, true, true, false] {
            score.record(correct);
            assert!(score.correct <= score.total);
        }
        assert_eq!(score.display(), "3 / 5");
        assert_eq!(score.accuracy_display(), "60.0%");
    }
}
