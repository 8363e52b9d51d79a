//! Concurrent sheet scoring.
//!
//! Questions within a sheet are independent, so their automated scoring
//! runs concurrently, bounded by a semaphore. Results are collected and
//! installed into the session in one step, so a partial failure leaves
//! the session untouched.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use scriptgrade_core::error::EvalError;
use scriptgrade_core::evaluate::score_from_match;
use scriptgrade_core::model::{EvaluationRecord, SheetStatus};
use scriptgrade_core::traits::{LexicalMatcher, MatchStrategy};

use crate::session::EvaluationSession;

/// Configuration for the scoring engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum questions scored concurrently.
    pub parallelism: usize,
    /// Retries on transient match-strategy errors (not grading outcomes).
    pub max_retries: u32,
    /// Initial delay between retries; doubles per attempt.
    pub retry_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            max_retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_question_scored(&self, question_id: &str, record: &EvaluationRecord);
    fn on_question_failed(&self, question_id: &str, error: &str);
    fn on_sheet_complete(&self, outcome: &ScoreOutcome);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_question_scored(&self, _: &str, _: &EvaluationRecord) {}
    fn on_question_failed(&self, _: &str, _: &str) {}
    fn on_sheet_complete(&self, _: &ScoreOutcome) {}
}

/// What one scoring run did.
#[derive(Debug, Clone)]
pub struct ScoreOutcome {
    /// Unique identifier of this run.
    pub run_id: Uuid,
    /// The sheet that was scored.
    pub sheet_id: String,
    /// Number of questions scored automatically.
    pub scored: usize,
    /// Questions routed to manual review because automated scoring
    /// could not handle them.
    pub ungradable: Vec<String>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Scores every question of a sheet through a match strategy.
pub struct ScoringEngine {
    strategy: Arc<dyn MatchStrategy>,
    config: EngineConfig,
}

impl ScoringEngine {
    pub fn new(strategy: Arc<dyn MatchStrategy>, config: EngineConfig) -> Self {
        Self { strategy, config }
    }

    /// An engine using the default lexical strategy.
    pub fn lexical(config: EngineConfig) -> Self {
        Self::new(Arc::new(LexicalMatcher), config)
    }

    /// Run automated scoring for every question of the sheet and install
    /// the results, moving the session to `InReview`.
    ///
    /// A question whose rubric cannot be auto-graded becomes a
    /// manual-review record and is listed in the outcome; any other
    /// per-question failure aborts the run with the session unchanged.
    pub async fn score_sheet(
        &self,
        session: &mut EvaluationSession,
        progress: &dyn ProgressReporter,
    ) -> Result<ScoreOutcome> {
        if session.status() == SheetStatus::Submitted {
            return Err(EvalError::SheetLocked {
                sheet_id: session.sheet_id().to_string(),
            }
            .into());
        }

        let started_at = Utc::now();
        let start = Instant::now();
        let run_id = Uuid::new_v4();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));

        let work: Vec<_> = session
            .rubric()
            .iter()
            .map(|item| (item.clone(), session.answer_for(&item.question_id)))
            .collect();

        tracing::info!(
            run_id = %run_id,
            sheet_id = session.sheet_id(),
            questions = work.len(),
            strategy = self.strategy.name(),
            "scoring sheet"
        );

        let mut futures = FuturesUnordered::new();
        for (rubric, answer) in work {
            let strategy = Arc::clone(&self.strategy);
            let semaphore = Arc::clone(&semaphore);
            let config = self.config.clone();

            futures.push(async move {
                let question_id = rubric.question_id.clone();
                let result = async {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;

                    // Retry transient strategy errors with exponential backoff
                    let mut retry_delay = config.retry_delay;
                    let mut last_error = None;
                    for attempt in 0..=config.max_retries {
                        if attempt > 0 {
                            tokio::time::sleep(retry_delay).await;
                            retry_delay = (retry_delay * 2).min(Duration::from_secs(60));
                        }
                        match strategy
                            .match_keywords(&answer.raw_text, &rubric.keywords)
                            .await
                        {
                            Ok(match_result) => {
                                return match score_from_match(&rubric, &answer, match_result) {
                                    Ok(record) => Ok((record, false)),
                                    Err(EvalError::Ungradable { .. }) => {
                                        Ok((EvaluationRecord::manual_review(&rubric), true))
                                    }
                                    Err(e) => Err(anyhow::Error::from(e)),
                                };
                            }
                            Err(e) => last_error = Some(e),
                        }
                    }
                    Err(last_error
                        .unwrap_or_else(|| anyhow::anyhow!("match strategy failed")))
                }
                .await;
                (question_id, result)
            });
        }

        let mut records = Vec::new();
        let mut ungradable = Vec::new();
        let mut scored = 0usize;

        while let Some((question_id, result)) = futures.next().await {
            match result {
                Ok((record, was_ungradable)) => {
                    progress.on_question_scored(&question_id, &record);
                    if was_ungradable {
                        tracing::warn!(
                            question_id = %question_id,
                            "question routed to manual review"
                        );
                        ungradable.push(question_id);
                    } else {
                        scored += 1;
                    }
                    records.push(record);
                }
                Err(e) => {
                    tracing::error!(question_id = %question_id, "scoring failed: {e:#}");
                    progress.on_question_failed(&question_id, &e.to_string());
                    return Err(e.context(format!("scoring question {question_id}")));
                }
            }
        }

        session.install_records(records)?;

        // Keep the outcome's ungradable list in rubric order for stable
        // reporting; concurrent completion order is arbitrary.
        ungradable.sort_by_key(|id| {
            session
                .rubric()
                .iter()
                .position(|q| q.question_id == *id)
                .unwrap_or(usize::MAX)
        });

        let outcome = ScoreOutcome {
            run_id,
            sheet_id: session.sheet_id().to_string(),
            scored,
            ungradable,
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            run_id = %run_id,
            scored = outcome.scored,
            ungradable = outcome.ungradable.len(),
            duration_ms = outcome.duration_ms,
            "sheet scoring complete"
        );
        progress.on_sheet_complete(&outcome);

        Ok(outcome)
    }
}
