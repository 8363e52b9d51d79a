//! Review triage policy.
//!
//! Decides whether an automated score is trustworthy enough to stand
//! without human sign-off.

/// Confidence below this flags the record for review.
pub const CONFIDENCE_THRESHOLD: f64 = 0.8;
/// Non-zero coverage below this flags the record regardless of
/// confidence; a short off-topic answer can drag confidence up through
/// the length-ratio term while matching almost nothing.
pub const LOW_COVERAGE_FLOOR: f64 = 0.3;

/// Whether a scored answer needs human review.
pub fn needs_review(confidence: f64, coverage: f64) -> bool {
    confidence < CONFIDENCE_THRESHOLD || (coverage > 0.0 && coverage < LOW_COVERAGE_FLOOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_confidence_flags() {
        assert!(needs_review(0.79, 1.0));
        assert!(needs_review(0.0, 0.0));
    }

    #[test]
    fn threshold_is_exclusive() {
        assert!(!needs_review(0.8, 1.0));
        assert!(!needs_review(0.95, 0.3));
    }

    #[test]
    fn marginal_coverage_flags_despite_high_confidence() {
        assert!(needs_review(0.9, 0.1));
        assert!(needs_review(0.99, 0.29));
    }

    #[test]
    fn zero_coverage_does_not_trip_the_coverage_clause() {
        // Zero coverage already yields a zero score; only the confidence
        // clause applies.
        assert!(!needs_review(0.85, 0.0));
    }
}
