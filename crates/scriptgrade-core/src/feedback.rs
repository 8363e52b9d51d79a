//! Student-facing feedback text.
//!
//! Names the missing key concepts, characterizes how well the answer
//! covers the rubric, and remarks on answer length relative to the
//! model answer.

use crate::matcher::token_count;
use crate::model::MatchResult;

const NO_ANSWER: &str = "No answer provided.";

/// Generate feedback for a scored answer.
pub fn generate(student_text: &str, model_answer: &str, match_result: &MatchResult) -> String {
    if token_count(student_text) == 0 {
        return NO_ANSWER.to_string();
    }

    let mut parts = Vec::new();

    if !match_result.unmatched.is_empty() {
        parts.push(format!(
            "Your answer is missing key concepts: {}.",
            match_result.unmatched.join(", ")
        ));
    }

    let coverage = match_result.coverage();
    if coverage < 0.3 {
        parts.push("Your answer differs significantly from the expected response.".to_string());
    } else if coverage < 0.6 {
        parts.push("Your answer partially addresses the question.".to_string());
    } else {
        parts.push("Your answer aligns well with the expected response.".to_string());
    }

    let student_len = token_count(student_text) as f64;
    let model_len = token_count(model_answer) as f64;
    if model_len > 0.0 {
        if student_len < model_len * 0.5 {
            parts.push("Your answer is too brief. Consider providing more details.".to_string());
        } else if student_len > model_len * 2.0 {
            parts.push("Your answer is unnecessarily long. Try to be more concise.".to_string());
        }
    }

    parts.join(" ")
}
