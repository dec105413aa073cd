//! Comparison engine: rank N scored candidates for the same task.
//!
//! The tie-break chain is deterministic and never fabricates a winner: equal
//! totals fall back to the critical-dimension points sum, then to the top
//! priority critical dimension, and candidates still equal after that share
//! a rank.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::error::EngineError;
use crate::rubric::RubricConfig;
use crate::scoring::ScoreReport;

/// Winner of a single dimension across candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionWinner {
    /// The candidate with strictly higher points.
    Candidate(String),
    /// The maximum points are shared.
    Tie,
}

/// One entry of the final ranking. Tied candidates share a `rank`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedCandidate {
    pub candidate_id: String,
    /// 1-based competition rank; equal on every tie-break key means equal rank.
    pub rank: usize,
    pub total: u32,
}

/// Result of comparing two or more candidates under one rubric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonResult {
    /// Candidate ids in input order.
    pub candidate_ids: Vec<String>,
    /// Per-dimension winner table, keyed by dimension name.
    pub per_dimension_winner: BTreeMap<String, DimensionWinner>,
    /// Final ranking, best first.
    pub ranking: Vec<RankedCandidate>,
}

/// Sort key for the tie-break chain: total, then critical points sum, then
/// points on the first dimension in the rubric's critical priority order.
fn tie_break_key(report: &ScoreReport, priority_dimension: Option<&str>) -> (u32, u32, u32) {
    let priority_points = priority_dimension
        .and_then(|name| report.dimension(name))
        .map(|d| d.points)
        .unwrap_or(0);
    (report.total, report.critical_points_sum(), priority_points)
}

/// Compare candidate score reports produced under `rubric`.
///
/// Fails with `InsufficientCandidates` below two reports and
/// `RubricMismatch` when a report was scored under a different rubric.
/// Candidates scoped to different tasks are a caller-level concern; the
/// engine only warns on the one symptom it can see, duplicate ids.
pub fn compare_candidates(
    rubric: &RubricConfig,
    reports: &[ScoreReport],
) -> Result<ComparisonResult, EngineError> {
    if reports.len() < 2 {
        return Err(EngineError::InsufficientCandidates { got: reports.len() });
    }
    rubric.validate()?;

    for report in reports {
        if report.rubric_kind != rubric.kind {
            return Err(EngineError::RubricMismatch {
                candidate_id: report.candidate_id.clone(),
                expected: rubric.kind.as_str().to_string(),
                found: report.rubric_kind.as_str().to_string(),
            });
        }
        for spec in &rubric.dimensions {
            if report.dimension(&spec.name).is_none() {
                return Err(EngineError::RubricMismatch {
                    candidate_id: report.candidate_id.clone(),
                    expected: rubric.kind.as_str().to_string(),
                    found: format!("report without dimension '{}'", spec.name),
                });
            }
        }
    }

    let candidate_ids: Vec<String> = reports.iter().map(|r| r.candidate_id.clone()).collect();
    for (i, id) in candidate_ids.iter().enumerate() {
        if candidate_ids[..i].contains(id) {
            warn!(candidate_id = %id, "duplicate candidate id in comparison");
        }
    }

    // Per-dimension winner table.
    let mut per_dimension_winner = BTreeMap::new();
    for spec in &rubric.dimensions {
        let points: Vec<(&str, u32)> = reports
            .iter()
            .map(|r| {
                let scored = r
                    .dimension(&spec.name)
                    .map(|d| d.points)
                    .unwrap_or_default();
                (r.candidate_id.as_str(), scored)
            })
            .collect();
        let max = points.iter().map(|(_, p)| *p).max().unwrap_or(0);
        let mut leaders = points.iter().filter(|(_, p)| *p == max);
        let winner = match (leaders.next(), leaders.next()) {
            (Some((id, _)), None) => DimensionWinner::Candidate((*id).to_string()),
            _ => DimensionWinner::Tie,
        };
        per_dimension_winner.insert(spec.name.clone(), winner);
    }

    // Ranking: sort by the tie-break chain, then assign competition ranks so
    // candidates equal on every key share a rank.
    let priority_dimension = rubric.critical_priority.first().map(String::as_str);
    let mut ordered: Vec<&ScoreReport> = reports.iter().collect();
    ordered.sort_by(|a, b| {
        tie_break_key(b, priority_dimension).cmp(&tie_break_key(a, priority_dimension))
    });

    let mut ranking = Vec::with_capacity(ordered.len());
    let mut current_rank = 0usize;
    let mut previous_key = None;
    for (index, report) in ordered.iter().enumerate() {
        let key = tie_break_key(report, priority_dimension);
        if previous_key != Some(key) {
            current_rank = index + 1;
            previous_key = Some(key);
        }
        ranking.push(RankedCandidate {
            candidate_id: report.candidate_id.clone(),
            rank: current_rank,
            total: report.total,
        });
    }

    Ok(ComparisonResult {
        candidate_ids,
        per_dimension_winner,
        ranking,
    })
}
