//! Scoring engine error types.
//!
//! Typed so callers can branch on the failure class (route to manual
//! grading, reject an override, block a submission) without string
//! matching.

use thiserror::Error;

use crate::model::SheetStatus;

/// Errors produced by the scoring and aggregation engine.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The rubric has no usable keywords; automated scoring cannot run
    /// and the question must be graded manually.
    #[error("question {question_id} cannot be graded automatically")]
    Ungradable { question_id: String },

    /// An override score fell outside `[0, max_marks]`. The record is
    /// unchanged.
    #[error("score {score} is outside the allowed range [0, {max_marks}]")]
    OutOfRange { score: f64, max_marks: f64 },

    /// The sheet's total max marks are zero, so percentage and letter
    /// grade are undefined.
    #[error("sheet has zero total marks; percentage is undefined")]
    DivisionUndefined,

    /// Submission was attempted while records still need review.
    #[error("cannot submit: {} question(s) still need review", question_ids.len())]
    UnresolvedReviews { question_ids: Vec<String> },

    /// A mutation was attempted after the sheet was submitted. This is a
    /// protocol violation by the caller, not a recoverable condition.
    #[error("sheet {sheet_id} is submitted and can no longer be modified")]
    SheetLocked { sheet_id: String },

    /// A status transition that would regress or skip the lifecycle.
    #[error("invalid sheet status transition: {from} -> {to}")]
    InvalidTransition { from: SheetStatus, to: SheetStatus },

    /// An answer was evaluated against the wrong rubric item.
    #[error("answer is for question {answer_question_id}, rubric is for {rubric_question_id}")]
    QuestionMismatch {
        rubric_question_id: String,
        answer_question_id: String,
    },

    /// The sheet has no record for the named question.
    #[error("no record for question {question_id} in this sheet")]
    UnknownQuestion { question_id: String },

    /// The sheet does not cover every rubric question exactly once.
    #[error("sheet is missing records for {} question(s)", question_ids.len())]
    MissingRecords { question_ids: Vec<String> },

    /// A question id appeared more than once in a rubric or record set.
    #[error("question {question_id} appears more than once")]
    DuplicateQuestion { question_id: String },
}

impl EvalError {
    /// Returns `true` if the caller can recover by changing its input.
    /// `SheetLocked` signals a caller bug and should be surfaced, not
    /// retried.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EvalError::SheetLocked { .. })
    }

    /// The question ids blocking a submission, if applicable.
    pub fn blocking_questions(&self) -> Option<&[String]> {
        match self {
            EvalError::UnresolvedReviews { question_ids } => Some(question_ids),
            _ => None,
        }
    }
}
