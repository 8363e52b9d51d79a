//! One answer sheet's evaluation session.
//!
//! The session owns the sheet's records and enforces the lifecycle:
//! `Pending` (records not yet scored) → `InReview` (automated scoring
//! complete) → `Submitted` (terminal, totals frozen). All mutation goes
//! through `&mut self`, so the compiler guarantees a single writer and
//! consistent reads; callers sharing a session across threads wrap it in
//! their own lock.

use std::collections::{HashMap, HashSet};

use scriptgrade_core::error::EvalError;
use scriptgrade_core::model::{EvaluationRecord, RubricItem, SheetStatus, StudentAnswer};

use crate::aggregate::{self, SheetSummary};

/// The evaluation of one student's answer sheet against one exam.
#[derive(Debug, Clone)]
pub struct EvaluationSession {
    sheet_id: String,
    student_id: String,
    rubric: Vec<RubricItem>,
    answers: HashMap<String, StudentAnswer>,
    records: Vec<EvaluationRecord>,
    status: SheetStatus,
}

impl EvaluationSession {
    /// Open a session for a sheet. Answers must belong to rubric
    /// questions; a question without an answer is treated as blank.
    /// If the same question was extracted twice, the later answer wins.
    pub fn new(
        sheet_id: impl Into<String>,
        student_id: impl Into<String>,
        rubric: Vec<RubricItem>,
        answers: Vec<StudentAnswer>,
    ) -> Result<Self, EvalError> {
        let mut ids = HashSet::new();
        for item in &rubric {
            if !ids.insert(item.question_id.clone()) {
                return Err(EvalError::DuplicateQuestion {
                    question_id: item.question_id.clone(),
                });
            }
        }

        let mut by_question = HashMap::new();
        for answer in answers {
            if !ids.contains(&answer.question_id) {
                return Err(EvalError::UnknownQuestion {
                    question_id: answer.question_id,
                });
            }
            by_question.insert(answer.question_id.clone(), answer);
        }

        Ok(Self {
            sheet_id: sheet_id.into(),
            student_id: student_id.into(),
            rubric,
            answers: by_question,
            records: Vec::new(),
            status: SheetStatus::Pending,
        })
    }

    pub fn sheet_id(&self) -> &str {
        &self.sheet_id
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    pub fn status(&self) -> SheetStatus {
        self.status
    }

    pub fn rubric(&self) -> &[RubricItem] {
        &self.rubric
    }

    pub fn records(&self) -> &[EvaluationRecord] {
        &self.records
    }

    /// The record for a question, if scoring has produced one.
    pub fn record(&self, question_id: &str) -> Option<&EvaluationRecord> {
        self.records.iter().find(|r| r.question_id == question_id)
    }

    /// The student's answer for a question, blank if not attempted.
    pub fn answer_for(&self, question_id: &str) -> StudentAnswer {
        self.answers
            .get(question_id)
            .cloned()
            .unwrap_or_else(|| StudentAnswer::blank(question_id))
    }

    /// Install the automated scoring results for every question,
    /// transitioning the sheet to `InReview`.
    ///
    /// The record set must cover the rubric exactly once; records are
    /// stored in rubric order. Re-installing while `InReview` replaces
    /// the previous automated results (a re-score); a human override on
    /// a record survives, only the automated fields are refreshed. Once
    /// submitted the sheet is locked.
    pub fn install_records(&mut self, records: Vec<EvaluationRecord>) -> Result<(), EvalError> {
        if self.status == SheetStatus::Submitted {
            return Err(EvalError::SheetLocked {
                sheet_id: self.sheet_id.clone(),
            });
        }

        let mut by_question: HashMap<String, EvaluationRecord> = HashMap::new();
        for record in records {
            if !self.rubric.iter().any(|q| q.question_id == record.question_id) {
                return Err(EvalError::UnknownQuestion {
                    question_id: record.question_id,
                });
            }
            if by_question.contains_key(&record.question_id) {
                return Err(EvalError::DuplicateQuestion {
                    question_id: record.question_id,
                });
            }
            by_question.insert(record.question_id.clone(), record);
        }

        let missing: Vec<String> = self
            .rubric
            .iter()
            .filter(|q| !by_question.contains_key(&q.question_id))
            .map(|q| q.question_id.clone())
            .collect();
        if !missing.is_empty() {
            return Err(EvalError::MissingRecords {
                question_ids: missing,
            });
        }

        let mut ordered = Vec::with_capacity(self.rubric.len());
        for question in &self.rubric {
            if let Some(mut record) = by_question.remove(&question.question_id) {
                // The automated path owns only the automated fields: a
                // teacher override carries over a re-score intact.
                if let Some(previous) = self
                    .records
                    .iter()
                    .find(|r| r.question_id == question.question_id)
                {
                    if previous.is_overridden() {
                        record.teacher_score = previous.teacher_score;
                        record.feedback = previous.feedback.clone();
                        record.needs_review = false;
                    }
                }
                ordered.push(record);
            }
        }

        self.records = ordered;
        self.status = SheetStatus::InReview;
        Ok(())
    }

    /// Apply a human override to one record.
    ///
    /// The teacher's score and feedback replace the automated ones as
    /// the authoritative result, and the review flag is cleared
    /// unconditionally. Fails with `OutOfRange` (record unchanged) when
    /// the score falls outside `[0, max_marks]`, and with `SheetLocked`
    /// after submission.
    pub fn override_score(
        &mut self,
        question_id: &str,
        new_score: f64,
        new_feedback: impl Into<String>,
    ) -> Result<&EvaluationRecord, EvalError> {
        if self.status == SheetStatus::Submitted {
            return Err(EvalError::SheetLocked {
                sheet_id: self.sheet_id.clone(),
            });
        }

        let record = self
            .records
            .iter_mut()
            .find(|r| r.question_id == question_id)
            .ok_or_else(|| EvalError::UnknownQuestion {
                question_id: question_id.to_string(),
            })?;

        if !(0.0..=record.max_marks).contains(&new_score) {
            return Err(EvalError::OutOfRange {
                score: new_score,
                max_marks: record.max_marks,
            });
        }

        record.teacher_score = Some(new_score);
        record.feedback = new_feedback.into();
        record.needs_review = false;
        Ok(record)
    }

    /// A fresh summary of the sheet as it stands. Always recomputed;
    /// an override is reflected on the next call.
    pub fn summary(&self) -> Result<SheetSummary, EvalError> {
        aggregate::summarize(&self.sheet_id, &self.student_id, self.status, &self.records)
    }

    /// Submit the sheet, freezing its totals.
    ///
    /// Succeeds only from `InReview` with zero records pending review;
    /// otherwise fails with `UnresolvedReviews` naming the blocking
    /// question ids and changes nothing. Submitting an already-submitted
    /// sheet returns the frozen summary.
    pub fn submit(&mut self) -> Result<SheetSummary, EvalError> {
        match self.status {
            SheetStatus::Pending => Err(EvalError::InvalidTransition {
                from: SheetStatus::Pending,
                to: SheetStatus::Submitted,
            }),
            SheetStatus::Submitted => self.summary(),
            SheetStatus::InReview => {
                let pending: Vec<String> = self
                    .records
                    .iter()
                    .filter(|r| r.needs_review)
                    .map(|r| r.question_id.clone())
                    .collect();
                if !pending.is_empty() {
                    return Err(EvalError::UnresolvedReviews {
                        question_ids: pending,
                    });
                }

                // Compute the summary before flipping status so a failed
                // aggregation leaves the sheet untouched.
                let summary = aggregate::summarize(
                    &self.sheet_id,
                    &self.student_id,
                    SheetStatus::Submitted,
                    &self.records,
                )?;
                self.status = SheetStatus::Submitted;
                Ok(summary)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptgrade_core::evaluate::evaluate;
    use scriptgrade_core::model::RubricItem;

    fn rubric() -> Vec<RubricItem> {
        vec![
            RubricItem::new(
                "q1",
                "Explain photosynthesis.",
                "Photosynthesis is the process by which plants use sunlight and chlorophyll to make glucose.",
                vec!["photosynthesis".into(), "chlorophyll".into(), "sunlight".into()],
                10.0,
            ),
            RubricItem::new(
                "q2",
                "Define osmosis.",
                "Osmosis is the movement of water across a semipermeable membrane.",
                vec!["osmosis".into(), "water".into(), "membrane".into()],
                5.0,
            ),
        ]
    }

    fn scored_session() -> EvaluationSession {
        let mut session = EvaluationSession::new(
            "sheet-1",
            "stu-1",
            rubric(),
            vec![
                StudentAnswer::new("q1", "Photosynthesis uses sunlight."),
                StudentAnswer::new(
                    "q2",
                    "Osmosis is the movement of water across a semipermeable membrane.",
                ),
            ],
        )
        .unwrap();

        let records: Vec<_> = session
            .rubric()
            .to_vec()
            .iter()
            .map(|q| evaluate(q, &session.answer_for(&q.question_id)).unwrap())
            .collect();
        session.install_records(records).unwrap();
        session
    }

    #[test]
    fn new_session_is_pending() {
        let session =
            EvaluationSession::new("s", "stu", rubric(), vec![]).unwrap();
        assert_eq!(session.status(), SheetStatus::Pending);
        assert!(session.records().is_empty());
        // Unattempted questions come back blank.
        assert_eq!(session.answer_for("q1").raw_text, "");
    }

    #[test]
    fn stray_answer_rejected() {
        let err = EvaluationSession::new(
            "s",
            "stu",
            rubric(),
            vec![StudentAnswer::new("q99", "hello")],
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::UnknownQuestion { question_id } if question_id == "q99"));
    }

    #[test]
    fn duplicate_rubric_question_rejected() {
        let mut items = rubric();
        items.push(items[0].clone());
        let err = EvaluationSession::new("s", "stu", items, vec![]).unwrap_err();
        assert!(matches!(err, EvalError::DuplicateQuestion { .. }));
    }

    #[test]
    fn install_records_moves_to_in_review() {
        let session = scored_session();
        assert_eq!(session.status(), SheetStatus::InReview);
        assert_eq!(session.records().len(), 2);
        // Records come back in rubric order
        assert_eq!(session.records()[0].question_id, "q1");
        assert_eq!(session.records()[1].question_id, "q2");
    }

    #[test]
    fn install_requires_full_coverage() {
        let mut session =
            EvaluationSession::new("s", "stu", rubric(), vec![]).unwrap();
        let one = evaluate(&session.rubric()[0].clone(), &session.answer_for("q1")).unwrap();
        let err = session.install_records(vec![one]).unwrap_err();
        assert!(
            matches!(err, EvalError::MissingRecords { ref question_ids } if question_ids == &["q2".to_string()])
        );
        assert_eq!(session.status(), SheetStatus::Pending);
    }

    #[test]
    fn override_sets_score_feedback_and_clears_review() {
        let mut session = scored_session();
        let record = session.override_score("q1", 9.5, "Great").unwrap();
        assert_eq!(record.teacher_score, Some(9.5));
        assert_eq!(record.feedback, "Great");
        assert!(!record.needs_review);
        assert!((record.authoritative_score() - 9.5).abs() < f64::EPSILON);
    }

    #[test]
    fn override_out_of_range_leaves_record_unchanged() {
        let mut session = scored_session();
        let before = session.record("q1").unwrap().clone();
        let err = session.override_score("q1", 12.0, "Too generous").unwrap_err();
        assert!(matches!(err, EvalError::OutOfRange { .. }));

        let err = session.override_score("q1", -1.0, "Below zero").unwrap_err();
        assert!(matches!(err, EvalError::OutOfRange { .. }));

        let after = session.record("q1").unwrap();
        assert_eq!(after.teacher_score, before.teacher_score);
        assert_eq!(after.feedback, before.feedback);
        assert_eq!(after.needs_review, before.needs_review);
    }

    #[test]
    fn reinstall_preserves_teacher_override() {
        let mut session = scored_session();
        session.override_score("q1", 9.5, "Great").unwrap();

        let fresh: Vec<_> = session
            .rubric()
            .to_vec()
            .iter()
            .map(|q| evaluate(q, &session.answer_for(&q.question_id)).unwrap())
            .collect();
        session.install_records(fresh).unwrap();

        let q1 = session.record("q1").unwrap();
        assert_eq!(q1.teacher_score, Some(9.5));
        assert_eq!(q1.feedback, "Great");
        assert!(!q1.needs_review);
        assert!((q1.authoritative_score() - 9.5).abs() < f64::EPSILON);

        // Records without an override are fully replaced.
        let q2 = session.record("q2").unwrap();
        assert!(q2.teacher_score.is_none());
    }

    #[test]
    fn submit_blocked_by_pending_reviews_then_succeeds() {
        let mut session = scored_session();
        // q1 was a partial answer and is flagged for review.
        assert!(session.record("q1").unwrap().needs_review);

        let err = session.submit().unwrap_err();
        let blocking = err.blocking_questions().unwrap().to_vec();
        assert_eq!(blocking, vec!["q1"]);
        assert_eq!(session.status(), SheetStatus::InReview);

        session.override_score("q1", 7.0, "Partially correct").unwrap();
        let summary = session.submit().unwrap();
        assert_eq!(summary.status, SheetStatus::Submitted);
        assert_eq!(session.status(), SheetStatus::Submitted);
        assert_eq!(summary.review_pending_count(), 0);
    }

    #[test]
    fn submitted_sheet_is_locked() {
        let mut session = scored_session();
        session.override_score("q1", 7.0, "ok").unwrap();
        if session.record("q2").unwrap().needs_review {
            session.override_score("q2", 5.0, "ok").unwrap();
        }
        session.submit().unwrap();

        let err = session.override_score("q1", 3.0, "changed my mind").unwrap_err();
        assert!(matches!(err, EvalError::SheetLocked { .. }));
        assert!(!err.is_recoverable());

        let err = session.install_records(vec![]).unwrap_err();
        assert!(matches!(err, EvalError::SheetLocked { .. }));

        // Submitting again returns the frozen summary.
        let summary = session.submit().unwrap();
        assert_eq!(summary.status, SheetStatus::Submitted);
    }

    #[test]
    fn submit_from_pending_is_invalid() {
        let mut session =
            EvaluationSession::new("s", "stu", rubric(), vec![]).unwrap();
        let err = session.submit().unwrap_err();
        assert!(matches!(err, EvalError::InvalidTransition { .. }));
        assert_eq!(session.status(), SheetStatus::Pending);
    }

    #[test]
    fn summary_reflects_override_without_caching() {
        let mut session = scored_session();
        let before = session.summary().unwrap();

        session.override_score("q1", 10.0, "Full marks").unwrap();
        let after = session.summary().unwrap();

        let delta = 10.0 - session.record("q1").unwrap().ai_score;
        assert!((after.total_score - (before.total_score + delta)).abs() < 1e-9);
    }
}
