#![forbid(unsafe_code)]

//! # verdict-engine
//!
//! Deterministic review scoring and consensus engine.
//!
//! Given per-dimension evidence about a reviewed artifact (a document or a
//! plan), the engine computes weighted scores with rule-based caps, resolves
//! a verdict with a critical-dimension override, and in multi-candidate or
//! multi-review modes ranks candidates or assesses agreement and calibration
//! across independent reviews. It also owns the collision-safe output-path
//! naming scheme shared by every mode.
//!
//! Everything here is a pure function from immutable inputs to an immutable
//! result: no I/O, no hidden state, identical inputs always produce
//! identical outputs. Reading artifacts and producing raw scores is the
//! external evaluator's job; writing files is the caller's.

pub mod compare;
pub mod error;
pub mod evidence;
pub mod meta_review;
pub mod output_path;
pub mod report;
pub mod rubric;
pub mod scoring;
pub mod verdict;

pub use compare::{compare_candidates, ComparisonResult, DimensionWinner, RankedCandidate};
pub use error::EngineError;
pub use evidence::{
    document_impact_rules, plan_impact_rules, Evidence, Issue, RuleTrigger, ScoringImpactRule,
};
pub use meta_review::{
    meta_review, CalibrationAssessment, IssueStatus, MetaReviewResult, ReliabilityScore,
    ReviewRecord,
};
pub use output_path::{
    normalize_model_slug, resolve_output_path, ModeTag, OutputPath, OutputPathRequest,
};
pub use report::{
    fingerprint, render_comparison_markdown, render_meta_review_markdown,
    render_score_report_markdown,
};
pub use rubric::{DimensionSpec, ReviewKind, RubricConfig, VerdictThreshold};
pub use scoring::{score_candidate, ScoreReport, ScoredDimension};
pub use verdict::{resolve_verdict, VerdictResolution};
