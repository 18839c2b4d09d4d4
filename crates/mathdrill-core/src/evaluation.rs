//! Decoding of the grader's verdict.

use crate::error::EvaluationParseError;
use crate::model::Evaluation;

/// Parse the grader's reply into an [`Evaluation`].
///
/// Accepts a bare JSON object, or one wrapped in a Markdown code block
/// (` ```json ` or a generic fence). `isCorrect` is required; a missing
/// `explanation` becomes the empty string.
pub fn parse_evaluation(text: &str) -> Result<Evaluation, EvaluationParseError> {
    let payload = strip_code_fence(text);
    if payload.trim().is_empty() {
        return Err(EvaluationParseError::Empty);
    }
    Ok(serde_json::from_str(payload.trim())?)
}

/// Return the body of the first ```json or generic ``` block, or the input
/// unchanged when there is none. An unclosed block still yields its body.
fn strip_code_fence(response: &str) -> &str {
    let Some(open) = response.find("```") else {
        return response;
    };
    let after_ticks = &response[open + 3..];
    let Some(line_end) = after_ticks.find('\n') else {
        return response;
    };
    let lang = after_ticks[..line_end].trim().to_lowercase();
    if !(lang.is_empty() || lang == "json") {
        return response;
    }

    let body = &after_ticks[line_end + 1..];
    match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    }
}
