//! Natural-language instructions sent to the service.

use crate::model::Difficulty;

/// Instruction asking for exactly one word problem at `difficulty`.
pub fn problem_prompt(difficulty: Difficulty) -> String {
    format!(
        "Generate a single math word problem appropriate for a '{difficulty}' difficulty level. \
         The problem should have a clear, definitive numerical or simple algebraic answer. \
         Do not include the answer in your response. Just provide the problem statement."
    )
}

/// Instruction asking the service to grade `answer` against `problem`.
///
/// The reply must be a single `{"isCorrect": bool, "explanation": string}`
/// object.
pub fn evaluation_prompt(problem: &str, answer: &str) -> String {
    format!(
        r#"Math Problem: "{problem}"
User's Answer: "{answer}"

Is the user's answer correct?
Please respond with ONLY a JSON object in the format:
{{
  "isCorrect": boolean,
  "explanation": "A brief explanation of why the answer is correct or incorrect. If incorrect, provide the correct answer and the steps to get it."
}}"#
    )
}
