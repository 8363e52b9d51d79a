//! Confidence estimation and score computation.
//!
//! Both formulas are deterministic and reproduced exactly in tests.
//! Confidence never scales the score: the score reflects the evidence
//! matched, confidence reflects how much to trust it. The weights below
//! are a reconstruction from observed grading relationships and should
//! be recalibrated against real grading data before being treated as
//! ground truth.

use crate::error::EvalError;
use crate::model::MatchResult;

/// Weight of keyword coverage in the confidence formula.
pub const COVERAGE_WEIGHT: f64 = 0.7;
/// Weight of the answer-length ratio in the confidence formula.
pub const LENGTH_RATIO_WEIGHT: f64 = 0.3;

/// Similarity of answer lengths in normalized tokens: `min / max`,
/// defined as 0 when either answer is empty.
pub fn length_ratio(student_tokens: usize, model_tokens: usize) -> f64 {
    if student_tokens == 0 || model_tokens == 0 {
        return 0.0;
    }
    let min = student_tokens.min(model_tokens) as f64;
    let max = student_tokens.max(model_tokens) as f64;
    min / max
}

/// Confidence in the automated score, in `[0, 1]`.
///
/// `0.7 * coverage + 0.3 * length_ratio`, clamped. The clamp is the one
/// intentional bound in the engine; everywhere else an out-of-range
/// value is an error, not something to silently fix.
pub fn confidence(coverage: f64, student_tokens: usize, model_tokens: usize) -> f64 {
    let raw = COVERAGE_WEIGHT * coverage
        + LENGTH_RATIO_WEIGHT * length_ratio(student_tokens, model_tokens);
    raw.clamp(0.0, 1.0)
}

/// Round to the nearest 0.5 mark, half away from zero.
pub fn round_to_half(value: f64) -> f64 {
    (value * 2.0).round() / 2.0
}

/// The automated score: keyword coverage scaled to `max_marks`, rounded
/// to the nearest half mark.
///
/// Fails with [`EvalError::Ungradable`] when the rubric has no usable
/// keywords or a non-positive max mark; those questions must be routed
/// to manual grading.
pub fn ai_score(
    match_result: &MatchResult,
    max_marks: f64,
    question_id: &str,
) -> Result<f64, EvalError> {
    if match_result.total() == 0 || max_marks.is_nan() || max_marks <= 0.0 {
        return Err(EvalError::Ungradable {
            question_id: question_id.to_string(),
        });
    }
    // Rounding can overshoot a max that is not a multiple of 0.5.
    Ok(round_to_half(match_result.coverage() * max_marks).min(max_marks))
}
