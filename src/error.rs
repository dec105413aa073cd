//! Error types for the scoring and consensus engine.

use thiserror::Error;

/// Errors reported synchronously to the caller.
///
/// Every error is terminal for the single call that raised it: results are
/// returned fully formed or not at all, so a failed call never leaves a
/// partially built report behind.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed rubric configuration (weights not summing to 100,
    /// overlapping or gapped thresholds, bad critical priority).
    #[error("configuration error: {0}")]
    Config(String),

    /// A raw dimension score outside the allowed `[1,5]` range.
    #[error("invalid raw score {raw} for dimension '{dimension}' (allowed 1..=5)")]
    InvalidScore { dimension: String, raw: i32 },

    /// A rubric dimension with no matching evidence entry.
    #[error("missing evidence for dimension '{dimension}'")]
    MissingEvidence { dimension: String },

    /// Fewer candidates than a comparison requires.
    #[error("comparison requires at least 2 candidates, got {got}")]
    InsufficientCandidates { got: usize },

    /// Fewer reviews than a meta-review requires.
    #[error("meta-review requires at least 2 reviews, got {got}")]
    InsufficientReviews { got: usize },

    /// Score reports produced under different rubric configurations.
    #[error("rubric mismatch: expected {expected} but '{candidate_id}' was scored as {found}")]
    RubricMismatch {
        candidate_id: String,
        expected: String,
        found: String,
    },

    /// Two reviews sharing one review id; id-keyed aggregation would
    /// silently merge them.
    #[error("duplicate review id '{review_id}'")]
    DuplicateReview { review_id: String },

    /// Reviews that do not refer to the same artifact.
    #[error("artifact mismatch: review '{review_id}' is about '{found}', expected '{expected}'")]
    ArtifactMismatch {
        review_id: String,
        expected: String,
        found: String,
    },

    /// A date string that is not a valid `YYYY-MM-DD` calendar date.
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
}

impl EngineError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Short error code for logging.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::InvalidScore { .. } => "invalid_score",
            Self::MissingEvidence { .. } => "missing_evidence",
            Self::InsufficientCandidates { .. } => "insufficient_candidates",
            Self::InsufficientReviews { .. } => "insufficient_reviews",
            Self::DuplicateReview { .. } => "duplicate_review",
            Self::RubricMismatch { .. } => "rubric_mismatch",
            Self::ArtifactMismatch { .. } => "artifact_mismatch",
            Self::InvalidDate(_) => "invalid_date",
        }
    }
}
