//! Dimension scorer: raw evidence in, immutable `ScoreReport` out.
//!
//! Pure and deterministic. The same rubric, evidence, and rules always
//! produce byte-identical reports, which is what makes review runs
//! reproducible and testable.

use serde::Serialize;
use tracing::debug;

use crate::error::EngineError;
use crate::evidence::{effective_cap, Evidence, ScoringImpactRule};
use crate::rubric::{DimensionSpec, ReviewKind, RubricConfig};
use crate::verdict::resolve_verdict;

/// One dimension after capping and weighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredDimension {
    /// The rubric entry this score belongs to.
    pub spec: DimensionSpec,
    /// Raw score after the tightest applicable cap.
    pub raw_score_effective: u32,
    /// `raw_score_effective * spec.weight`.
    pub points: u32,
}

/// Complete scored assessment of one candidate.
///
/// Built once by [`score_candidate`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreReport {
    pub candidate_id: String,
    pub rubric_kind: ReviewKind,
    /// Scored dimensions in rubric order.
    pub dimensions: Vec<ScoredDimension>,
    /// Weighted total, always in `[0,100]`.
    pub total: u32,
    /// Resolved verdict label.
    pub verdict: String,
    /// Whether the critical-floor override demoted the verdict.
    pub critical_floor_breached: bool,
}

impl ScoreReport {
    /// Look up a scored dimension by name.
    pub fn dimension(&self, name: &str) -> Option<&ScoredDimension> {
        self.dimensions.iter().find(|d| d.spec.name == name)
    }

    /// Sum of points over dimensions flagged critical.
    pub fn critical_points_sum(&self) -> u32 {
        self.dimensions
            .iter()
            .filter(|d| d.spec.is_critical)
            .map(|d| d.points)
            .sum()
    }
}

/// Score one candidate against a rubric.
///
/// Every rubric dimension must have a matching [`Evidence`] entry with a raw
/// score in `[1,5]`; the tightest triggered impact rule caps the raw score
/// before weighting. The verdict comes from the rubric's threshold table with
/// the critical-floor override applied.
pub fn score_candidate(
    candidate_id: &str,
    rubric: &RubricConfig,
    evidence: &[Evidence],
    rules: &[ScoringImpactRule],
) -> Result<ScoreReport, EngineError> {
    rubric.validate()?;

    let mut dimensions = Vec::with_capacity(rubric.dimensions.len());
    let mut total = 0u32;
    let mut critical_effective = Vec::new();

    for spec in &rubric.dimensions {
        let ev = evidence
            .iter()
            .find(|e| e.dimension == spec.name)
            .ok_or_else(|| EngineError::MissingEvidence {
                dimension: spec.name.clone(),
            })?;

        if !(1..=5).contains(&ev.raw_score) {
            return Err(EngineError::InvalidScore {
                dimension: spec.name.clone(),
                raw: ev.raw_score,
            });
        }

        let cap = effective_cap(&spec.name, &ev.issues, rules);
        let effective = (ev.raw_score as u32).min(cap);
        let points = effective * spec.weight;
        debug!(
            candidate = candidate_id,
            dimension = %spec.name,
            raw = ev.raw_score,
            cap,
            effective,
            points,
            "scored dimension"
        );

        if spec.is_critical {
            critical_effective.push((spec.name.clone(), effective));
        }
        total += points;
        dimensions.push(ScoredDimension {
            spec: spec.clone(),
            raw_score_effective: effective,
            points,
        });
    }

    let resolution = resolve_verdict(rubric, total, &critical_effective)?;

    Ok(ScoreReport {
        candidate_id: candidate_id.to_string(),
        rubric_kind: rubric.kind,
        dimensions,
        total,
        verdict: resolution.label,
        critical_floor_breached: resolution.critical_floor_breached,
    })
}
