//! Sheet aggregation: totals, percentage, letter grade, review status.
//!
//! Aggregation is a pure read over the sheet's records, recomputed on
//! every call so an intervening override is always reflected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scriptgrade_core::error::EvalError;
use scriptgrade_core::model::{EvaluationRecord, SheetStatus};

/// Letter grade with fixed inclusive lower breakpoints, evaluated
/// top-down: ≥90 A+, ≥80 A, ≥70 B, ≥60 C, ≥50 D, else F.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LetterGrade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl LetterGrade {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            LetterGrade::APlus
        } else if percentage >= 80.0 {
            LetterGrade::A
        } else if percentage >= 70.0 {
            LetterGrade::B
        } else if percentage >= 60.0 {
            LetterGrade::C
        } else if percentage >= 50.0 {
            LetterGrade::D
        } else {
            LetterGrade::F
        }
    }
}

impl std::fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LetterGrade::APlus => "A+",
            LetterGrade::A => "A",
            LetterGrade::B => "B",
            LetterGrade::C => "C",
            LetterGrade::D => "D",
            LetterGrade::F => "F",
        };
        write!(f, "{s}")
    }
}

/// Per-question line of a sheet summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub question_id: String,
    /// The authoritative score (teacher override when present).
    pub score: f64,
    pub max_marks: f64,
    pub needs_review: bool,
    /// Whether a human overrode the automated score.
    pub overridden: bool,
}

/// The rolled-up result of one answer sheet's evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetSummary {
    pub sheet_id: String,
    pub student_id: String,
    pub status: SheetStatus,
    /// Sum of authoritative scores.
    pub total_score: f64,
    /// Sum of max marks.
    pub max_score: f64,
    pub percentage: f64,
    pub letter_grade: LetterGrade,
    /// Question ids still awaiting review, in sheet order.
    pub review_pending: Vec<String>,
    pub questions: Vec<QuestionSummary>,
    pub generated_at: DateTime<Utc>,
}

impl SheetSummary {
    pub fn review_pending_count(&self) -> usize {
        self.review_pending.len()
    }
}

/// Compute a fresh summary over the sheet's records.
///
/// Fails with [`EvalError::DivisionUndefined`] when the sheet's total
/// max marks are zero.
pub fn summarize(
    sheet_id: &str,
    student_id: &str,
    status: SheetStatus,
    records: &[EvaluationRecord],
) -> Result<SheetSummary, EvalError> {
    let total_score: f64 = records.iter().map(|r| r.authoritative_score()).sum();
    let max_score: f64 = records.iter().map(|r| r.max_marks).sum();

    if max_score.is_nan() || max_score <= 0.0 {
        return Err(EvalError::DivisionUndefined);
    }

    let percentage = total_score / max_score * 100.0;
    let review_pending: Vec<String> = records
        .iter()
        .filter(|r| r.needs_review)
        .map(|r| r.question_id.clone())
        .collect();

    let questions = records
        .iter()
        .map(|r| QuestionSummary {
            question_id: r.question_id.clone(),
            score: r.authoritative_score(),
            max_marks: r.max_marks,
            needs_review: r.needs_review,
            overridden: r.is_overridden(),
        })
        .collect();

    Ok(SheetSummary {
        sheet_id: sheet_id.to_string(),
        student_id: student_id.to_string(),
        status,
        total_score,
        max_score,
        percentage,
        letter_grade: LetterGrade::from_percentage(percentage),
        review_pending,
        questions,
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptgrade_core::model::MatchResult;

    fn record(
        question_id: &str,
        ai_score: f64,
        max_marks: f64,
        teacher_score: Option<f64>,
        needs_review: bool,
    ) -> EvaluationRecord {
        EvaluationRecord {
            question_id: question_id.into(),
            max_marks,
            ai_score,
            ai_confidence: 0.9,
            match_result: MatchResult {
                matched: vec![],
                unmatched: vec![],
            },
            feedback: String::new(),
            teacher_score,
            needs_review,
        }
    }

    #[test]
    fn totals_use_authoritative_scores() {
        let records = vec![
            record("q1", 6.5, 10.0, None, false),
            record("q2", 2.0, 5.0, Some(4.5), false),
        ];
        let summary = summarize("s1", "stu1", SheetStatus::InReview, &records).unwrap();
        assert!((summary.total_score - 11.0).abs() < 1e-12);
        assert!((summary.max_score - 15.0).abs() < 1e-12);
        assert!((summary.percentage - 11.0 / 15.0 * 100.0).abs() < 1e-9);
        assert!(summary.questions[1].overridden);
    }

    #[test]
    fn zero_max_score_is_undefined() {
        let err = summarize("s1", "stu1", SheetStatus::InReview, &[]).unwrap_err();
        assert!(matches!(err, EvalError::DivisionUndefined));
    }

    #[test]
    fn review_pending_lists_ids_in_order() {
        let records = vec![
            record("q1", 5.0, 10.0, None, true),
            record("q2", 5.0, 10.0, None, false),
            record("q3", 5.0, 10.0, None, true),
        ];
        let summary = summarize("s1", "stu1", SheetStatus::InReview, &records).unwrap();
        assert_eq!(summary.review_pending, vec!["q1", "q3"]);
        assert_eq!(summary.review_pending_count(), 2);
    }

    #[test]
    fn letter_grade_breakpoints() {
        assert_eq!(LetterGrade::from_percentage(100.0), LetterGrade::APlus);
        assert_eq!(LetterGrade::from_percentage(90.0), LetterGrade::APlus);
        assert_eq!(LetterGrade::from_percentage(89.9), LetterGrade::A);
        assert_eq!(LetterGrade::from_percentage(80.0), LetterGrade::A);
        assert_eq!(LetterGrade::from_percentage(70.0), LetterGrade::B);
        assert_eq!(LetterGrade::from_percentage(60.0), LetterGrade::C);
        assert_eq!(LetterGrade::from_percentage(50.0), LetterGrade::D);
        assert_eq!(LetterGrade::from_percentage(49.9), LetterGrade::F);
        assert_eq!(LetterGrade::from_percentage(0.0), LetterGrade::F);
    }

    #[test]
    fn letter_grade_display_and_serde() {
        assert_eq!(LetterGrade::APlus.to_string(), "A+");
        assert_eq!(LetterGrade::F.to_string(), "F");
        let json = serde_json::to_string(&LetterGrade::APlus).unwrap();
        assert_eq!(json, "\"A+\"");
    }

    #[test]
    fn summary_serde_roundtrip() {
        let records = vec![record("q1", 9.0, 10.0, None, false)];
        let summary = summarize("s1", "stu1", SheetStatus::Submitted, &records).unwrap();
        let json = serde_json::to_string(&summary).unwrap();
        let back: SheetSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sheet_id, "s1");
        assert_eq!(back.status, SheetStatus::Submitted);
        assert_eq!(back.letter_grade, LetterGrade::APlus);
    }
}
