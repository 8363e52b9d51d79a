//! The pluggable matching seam.
//!
//! Scoring and confidence consume a [`MatchResult`], not a matching
//! algorithm, so alternative strategies (e.g. an embedding-backed
//! matcher calling a remote service) can replace lexical matching
//! without touching score computation. The trait is async for that
//! reason; the default lexical strategy never suspends.

use async_trait::async_trait;

use crate::matcher;
use crate::model::MatchResult;

/// A strategy for deciding which rubric keywords a student answer covers.
#[async_trait]
pub trait MatchStrategy: Send + Sync {
    /// Human-readable strategy name (e.g. "lexical").
    fn name(&self) -> &str;

    /// Match `keywords` against `student_text`. The returned lists must
    /// preserve rubric order and together cover the keyword set exactly
    /// once.
    async fn match_keywords(
        &self,
        student_text: &str,
        keywords: &[String],
    ) -> anyhow::Result<MatchResult>;
}

/// The default strategy: contiguous-substring matching on normalized
/// text. Pure and infallible.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalMatcher;

#[async_trait]
impl MatchStrategy for LexicalMatcher {
    fn name(&self) -> &str {
        "lexical"
    }

    async fn match_keywords(
        &self,
        student_text: &str,
        keywords: &[String],
    ) -> anyhow::Result<MatchResult> {
        Ok(matcher::match_keywords(student_text, keywords))
    }
}
