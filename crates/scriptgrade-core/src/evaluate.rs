//! The single-answer evaluation pipeline.
//!
//! Match keywords, estimate confidence, compute the score, run triage,
//! and generate feedback, producing one [`EvaluationRecord`]. Pure and
//! deterministic: identical inputs yield an identical record.

use crate::error::EvalError;
use crate::matcher::{self, token_count};
use crate::model::{EvaluationRecord, MatchResult, RubricItem, StudentAnswer};
use crate::{feedback, scoring, triage};

/// Evaluate a student answer against its rubric item.
///
/// Fails with [`EvalError::QuestionMismatch`] if the answer and rubric
/// belong to different questions, and with [`EvalError::Ungradable`]
/// if the rubric carries no usable keywords.
pub fn evaluate(rubric: &RubricItem, answer: &StudentAnswer) -> Result<EvaluationRecord, EvalError> {
    if rubric.question_id != answer.question_id {
        return Err(EvalError::QuestionMismatch {
            rubric_question_id: rubric.question_id.clone(),
            answer_question_id: answer.question_id.clone(),
        });
    }
    let match_result = matcher::match_keywords(&answer.raw_text, &rubric.keywords);
    score_from_match(rubric, answer, match_result)
}

/// Build an evaluation record from an already-computed match result.
///
/// This is the second half of [`evaluate`], split out so alternative
/// match strategies feed the same scoring, triage, and feedback path.
pub fn score_from_match(
    rubric: &RubricItem,
    answer: &StudentAnswer,
    match_result: MatchResult,
) -> Result<EvaluationRecord, EvalError> {
    let ai_score = scoring::ai_score(&match_result, rubric.max_marks, &rubric.question_id)?;
    let coverage = match_result.coverage();
    let ai_confidence = scoring::confidence(
        coverage,
        token_count(&answer.raw_text),
        token_count(&rubric.model_answer),
    );
    let needs_review = triage::needs_review(ai_confidence, coverage);
    let feedback = feedback::generate(&answer.raw_text, &rubric.model_answer, &match_result);

    Ok(EvaluationRecord {
        question_id: rubric.question_id.clone(),
        max_marks: rubric.max_marks,
        ai_score,
        ai_confidence,
        match_result,
        feedback,
        teacher_score: None,
        needs_review,
    })
}
