//! Core data model types for scriptgrade.
//!
//! These are the fundamental types the entire scriptgrade system uses to
//! represent rubrics, student answers, match results, and per-question
//! evaluation records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::matcher;

/// A question together with its model answer, keyword set, and maximum
/// marks. Read-only to the scoring engine once an evaluation starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RubricItem {
    /// Unique identifier for this question within its exam.
    pub question_id: String,
    /// The question as shown to the student.
    pub question_text: String,
    /// The reference answer the student answer is scored against.
    pub model_answer: String,
    /// Expected keywords, normalized and de-duplicated, in rubric order.
    /// Built by [`RubricItem::new`]; keywords that normalize to nothing
    /// are dropped.
    pub keywords: Vec<String>,
    /// Maximum marks awardable for this question.
    pub max_marks: f64,
}

impl RubricItem {
    /// Build a rubric item, normalizing the keyword set: each keyword is
    /// case/punctuation folded, duplicates (after folding) are dropped,
    /// and rubric order is preserved.
    pub fn new(
        question_id: impl Into<String>,
        question_text: impl Into<String>,
        model_answer: impl Into<String>,
        keywords: Vec<String>,
        max_marks: f64,
    ) -> Self {
        let mut normalized = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            let folded = matcher::normalize(&keyword);
            if !folded.is_empty() && !normalized.contains(&folded) {
                normalized.push(folded);
            }
        }
        Self {
            question_id: question_id.into(),
            question_text: question_text.into(),
            model_answer: model_answer.into(),
            keywords: normalized,
            max_marks,
        }
    }
}

/// An exam: a named, ordered collection of rubric items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    /// Unique identifier for this exam.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Subject the exam belongs to.
    #[serde(default)]
    pub subject: String,
    /// Description of the exam.
    #[serde(default)]
    pub description: String,
    /// The questions in exam order.
    #[serde(default)]
    pub questions: Vec<RubricItem>,
}

impl Exam {
    /// Sum of max marks over all questions.
    pub fn total_marks(&self) -> f64 {
        self.questions.iter().map(|q| q.max_marks).sum()
    }
}

/// A student's raw extracted answer to one question. Immutable input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentAnswer {
    /// The question this answer belongs to.
    pub question_id: String,
    /// Extracted answer text, as delivered by the upstream pipeline.
    pub raw_text: String,
}

impl StudentAnswer {
    pub fn new(question_id: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            raw_text: raw_text.into(),
        }
    }

    /// An empty answer for a question the student did not attempt.
    pub fn blank(question_id: impl Into<String>) -> Self {
        Self::new(question_id, "")
    }
}

/// Which rubric keywords were found in a student answer.
///
/// Both lists preserve rubric order; `matched` and `unmatched` together
/// cover the rubric's keyword set exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Keywords found in the answer.
    pub matched: Vec<String>,
    /// Keywords absent from the answer.
    pub unmatched: Vec<String>,
}

impl MatchResult {
    /// Total number of rubric keywords considered.
    pub fn total(&self) -> usize {
        self.matched.len() + self.unmatched.len()
    }

    /// Fraction of rubric keywords found in the answer. Defined as 1.0
    /// for an empty keyword set (no evidence was required).
    pub fn coverage(&self) -> f64 {
        if self.total() == 0 {
            1.0
        } else {
            self.matched.len() as f64 / self.total() as f64
        }
    }
}

/// One scored answer: the automated result plus an optional human
/// override. Owned by the evaluation session for its sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// The question this record scores.
    pub question_id: String,
    /// Maximum marks for the question, copied from the rubric.
    pub max_marks: f64,
    /// Automated score in `[0, max_marks]`.
    pub ai_score: f64,
    /// Trust in the automated score, in `[0, 1]`.
    pub ai_confidence: f64,
    /// Keyword evidence behind the automated score.
    pub match_result: MatchResult,
    /// Feedback text for the student.
    pub feedback: String,
    /// Human-entered score, if a teacher has overridden the automated one.
    #[serde(default)]
    pub teacher_score: Option<f64>,
    /// Whether this record still needs human sign-off.
    pub needs_review: bool,
}

impl EvaluationRecord {
    /// The score of record: the teacher's override when present,
    /// otherwise the automated score. Derived, never stored.
    pub fn authoritative_score(&self) -> f64 {
        self.teacher_score.unwrap_or(self.ai_score)
    }

    /// Whether a human has overridden the automated score.
    pub fn is_overridden(&self) -> bool {
        self.teacher_score.is_some()
    }

    /// A record for a question automated scoring cannot handle (no usable
    /// keywords). Routes the question to the human-review path.
    pub fn manual_review(rubric: &RubricItem) -> Self {
        Self {
            question_id: rubric.question_id.clone(),
            max_marks: rubric.max_marks,
            ai_score: 0.0,
            ai_confidence: 0.0,
            match_result: MatchResult {
                matched: Vec::new(),
                unmatched: rubric.keywords.clone(),
            },
            feedback: "This answer could not be graded automatically and requires manual review."
                .to_string(),
            teacher_score: None,
            needs_review: true,
        }
    }
}

/// Lifecycle of one answer sheet's evaluation. Transitions are monotonic:
/// `Pending` → `InReview` → `Submitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetStatus {
    /// Records exist but automated scoring has not yet run.
    Pending,
    /// Automated scoring is complete; records may still need review.
    InReview,
    /// Terminal: all reviews resolved, totals frozen.
    Submitted,
}

impl fmt::Display for SheetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetStatus::Pending => write!(f, "pending"),
            SheetStatus::InReview => write!(f, "in_review"),
            SheetStatus::Submitted => write!(f, "submitted"),
        }
    }
}

impl FromStr for SheetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(SheetStatus::Pending),
            "in_review" | "inreview" => Ok(SheetStatus::InReview),
            "submitted" => Ok(SheetStatus::Submitted),
            other => Err(format!("unknown sheet status: {other}")),
        }
    }
}
