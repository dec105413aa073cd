//! Meta-review engine: agreement and calibration analysis over several
//! independent reviews of one artifact.
//!
//! Disagreement between reviewers and self-contradiction within a reviewer
//! are different faults. Disagreement shows up as score variance and split
//! issue detection; self-contradiction (scoring a dimension above the cap
//! that the reviewer's own reported issues trigger) is a calibration fault
//! and costs that reviewer weight in the consensus total. Both the weights
//! and the contradiction counts behind them are part of the result, so a
//! consumer can audit the consensus rather than trust it.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::EngineError;
use crate::evidence::{effective_cap, Evidence, ScoringImpactRule};
use crate::rubric::RubricConfig;
use crate::scoring::ScoreReport;

/// Total-score spread above which the review set is flagged high variance
/// (roughly 10% of the 100-point scale).
pub const HIGH_VARIANCE_THRESHOLD: u32 = 10;

/// Calibration weight deduction per self-contradicted dimension.
pub const CALIBRATION_PENALTY: f64 = 0.05;

/// One reviewer's complete assessment: the scored report plus the evidence
/// (and issues) that reviewer itself produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRecord {
    /// Stable identifier for this review.
    pub review_id: String,
    /// Identifier of the artifact under review.
    pub artifact: String,
    /// The reviewer's scored report.
    pub report: ScoreReport,
    /// The evidence the reviewer's evaluator produced, one entry per rubric
    /// dimension.
    pub evidence: Vec<Evidence>,
}

impl ReviewRecord {
    pub fn new(
        review_id: impl Into<String>,
        artifact: impl Into<String>,
        report: ScoreReport,
        evidence: Vec<Evidence>,
    ) -> Self {
        Self {
            review_id: review_id.into(),
            artifact: artifact.into(),
            report,
            evidence,
        }
    }

    fn evidence_for(&self, dimension: &str) -> Option<&Evidence> {
        self.evidence.iter().find(|e| e.dimension == dimension)
    }
}

/// Spread of effective scores for one dimension across reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionConsensus {
    /// Effective score per review id.
    pub values: BTreeMap<String, u32>,
    /// `max - min` over the values.
    pub variance: u32,
    /// True when every review agrees exactly.
    pub agreement: bool,
}

/// How widely an issue was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    /// Found by every reviewer.
    Confirmed,
    /// Found by more than one reviewer but not all.
    Majority,
    /// Found by exactly one reviewer; surfaced for manual check.
    Disputed,
}

/// Which reviewers detected one issue key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueConsensus {
    /// Review ids that reported the issue, sorted.
    pub found_by: Vec<String>,
    pub status: IssueStatus,
}

/// Per-reviewer calibration: contradiction count and resulting weight.
///
/// A contradiction is a dimension whose recorded effective score exceeds the
/// cap the reviewer's own reported issues trigger under the impact rules.
/// `weight = max(0, 1 - 0.05 * contradictions)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationAssessment {
    pub contradictions: u32,
    pub weight: f64,
}

/// Reliability meta-score over four axes, each on a 0-5 scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReliabilityScore {
    /// Share of corroborated issues (found by more than one reviewer) this
    /// reviewer individually found.
    ///
    /// Confirmed issues alone cannot discriminate — an issue found by every
    /// reviewer was found by each of them — so majority issues count in the
    /// denominator too. Disputed issues do not: a single finder is not yet
    /// corroboration.
    pub thoroughness: f64,
    /// Share of this reviewer's findings carrying a location citation.
    pub evidence_quality: f64,
    /// `(1 - contradiction rate) * 5`, rate over the rubric's dimensions.
    pub calibration: f64,
    /// Share of this reviewer's findings paired with a concrete fix.
    pub actionability: f64,
    /// Sum of the four axes, 0-20.
    pub total: f64,
}

/// Full meta-review over N reviews of one artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetaReviewResult {
    /// Review ids in input order.
    pub review_ids: Vec<String>,
    /// The artifact every review refers to.
    pub artifact: String,
    /// Total score per review id.
    pub totals: BTreeMap<String, u32>,
    /// `max(total) - min(total)`.
    pub variance: u32,
    /// True when `variance` exceeds [`HIGH_VARIANCE_THRESHOLD`].
    pub high_variance: bool,
    /// Per-dimension agreement, keyed by dimension name.
    pub per_dimension_consensus: BTreeMap<String, DimensionConsensus>,
    /// Issue-detection agreement, keyed by issue key.
    pub issue_consensus: BTreeMap<String, IssueConsensus>,
    /// Calibration weight and contradiction count per review id.
    pub calibration: BTreeMap<String, CalibrationAssessment>,
    /// Calibration-weighted average of the totals, rounded.
    pub consensus_total: u32,
    /// Reliability meta-score per review id.
    pub reliability: BTreeMap<String, ReliabilityScore>,
    /// Review with the highest reliability total (ties broken by
    /// calibration, then thoroughness, then review id).
    pub most_reliable_review_id: String,
}

/// Run a meta-review over two or more reviews of the same artifact.
///
/// Review ids must be distinct: every aggregation here is keyed by id, and
/// two records sharing one would silently collapse into a single entry.
/// `rules` must be the impact rules the reviews were scored under; they are
/// what calibration checks each reviewer's scores against.
pub fn meta_review(
    rubric: &RubricConfig,
    reviews: &[ReviewRecord],
    rules: &[ScoringImpactRule],
) -> Result<MetaReviewResult, EngineError> {
    if reviews.len() < 2 {
        return Err(EngineError::InsufficientReviews { got: reviews.len() });
    }
    rubric.validate()?;

    // Review ids key every aggregation map below; a duplicate would merge
    // two records into one entry and skew the weighted average.
    for (i, review) in reviews.iter().enumerate() {
        if reviews[..i].iter().any(|r| r.review_id == review.review_id) {
            return Err(EngineError::DuplicateReview {
                review_id: review.review_id.clone(),
            });
        }
    }

    let artifact = reviews[0].artifact.clone();
    for review in reviews {
        if review.artifact != artifact {
            return Err(EngineError::ArtifactMismatch {
                review_id: review.review_id.clone(),
                expected: artifact.clone(),
                found: review.artifact.clone(),
            });
        }
        if review.report.rubric_kind != rubric.kind {
            return Err(EngineError::RubricMismatch {
                candidate_id: review.review_id.clone(),
                expected: rubric.kind.as_str().to_string(),
                found: review.report.rubric_kind.as_str().to_string(),
            });
        }
    }

    let review_ids: Vec<String> = reviews.iter().map(|r| r.review_id.clone()).collect();

    // Step 1: total-score spread.
    let totals: BTreeMap<String, u32> = reviews
        .iter()
        .map(|r| (r.review_id.clone(), r.report.total))
        .collect();
    let max_total = totals.values().copied().max().unwrap_or(0);
    let min_total = totals.values().copied().min().unwrap_or(0);
    let variance = max_total - min_total;

    // Step 2: per-dimension consensus over effective scores.
    let mut per_dimension_consensus = BTreeMap::new();
    for spec in &rubric.dimensions {
        let mut values = BTreeMap::new();
        for review in reviews {
            let scored = review.report.dimension(&spec.name).ok_or_else(|| {
                EngineError::RubricMismatch {
                    candidate_id: review.review_id.clone(),
                    expected: rubric.kind.as_str().to_string(),
                    found: format!("report without dimension '{}'", spec.name),
                }
            })?;
            values.insert(review.review_id.clone(), scored.raw_score_effective);
        }
        let max = values.values().copied().max().unwrap_or(0);
        let min = values.values().copied().min().unwrap_or(0);
        let dim_variance = max - min;
        per_dimension_consensus.insert(
            spec.name.clone(),
            DimensionConsensus {
                values,
                variance: dim_variance,
                agreement: dim_variance == 0,
            },
        );
    }

    // Step 3: issue-detection consensus, keyed by issue key.
    let mut issue_finders: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for review in reviews {
        for ev in &review.evidence {
            for issue in &ev.issues {
                let finders = issue_finders.entry(issue.key.clone()).or_default();
                if !finders.contains(&review.review_id) {
                    finders.push(review.review_id.clone());
                }
            }
        }
    }
    let issue_consensus: BTreeMap<String, IssueConsensus> = issue_finders
        .into_iter()
        .map(|(key, mut found_by)| {
            found_by.sort();
            let status = if found_by.len() == reviews.len() {
                IssueStatus::Confirmed
            } else if found_by.len() == 1 {
                IssueStatus::Disputed
            } else {
                IssueStatus::Majority
            };
            (key, IssueConsensus { found_by, status })
        })
        .collect();

    // Step 4: calibration weight per review.
    let mut calibration = BTreeMap::new();
    for review in reviews {
        let contradictions = count_contradictions(rubric, review, rules)?;
        let weight = (1.0 - CALIBRATION_PENALTY * f64::from(contradictions)).max(0.0);
        calibration.insert(
            review.review_id.clone(),
            CalibrationAssessment {
                contradictions,
                weight,
            },
        );
    }

    // Step 5: calibration-weighted consensus total. If every weight is zero
    // the weighted average is undefined; fall back to the unweighted mean.
    let weight_sum: f64 = calibration.values().map(|c| c.weight).sum();
    let consensus_total = if weight_sum > 0.0 {
        let weighted: f64 = reviews
            .iter()
            .map(|r| f64::from(r.report.total) * calibration[&r.review_id].weight)
            .sum();
        (weighted / weight_sum).round() as u32
    } else {
        let sum: u32 = totals.values().sum();
        ((f64::from(sum)) / (reviews.len() as f64)).round() as u32
    };

    // Step 6: reliability meta-score and selection.
    let corroborated: Vec<&str> = issue_consensus
        .iter()
        .filter(|(_, c)| c.status != IssueStatus::Disputed)
        .map(|(key, _)| key.as_str())
        .collect();
    let dimension_count = rubric.dimensions.len() as f64;

    let mut reliability = BTreeMap::new();
    for review in reviews {
        let findings: Vec<&crate::evidence::Issue> =
            review.evidence.iter().flat_map(|e| e.issues.iter()).collect();

        let thoroughness = fraction_axis(
            corroborated
                .iter()
                .filter(|key| findings.iter().any(|i| i.key == **key))
                .count(),
            corroborated.len(),
        );
        let evidence_quality = fraction_axis(
            findings.iter().filter(|i| i.location.is_some()).count(),
            findings.len(),
        );
        let actionability = fraction_axis(
            findings.iter().filter(|i| i.suggested_fix.is_some()).count(),
            findings.len(),
        );
        let contradiction_rate =
            f64::from(calibration[&review.review_id].contradictions) / dimension_count;
        let calibration_axis = ((1.0 - contradiction_rate) * 5.0).max(0.0);

        let total = thoroughness + evidence_quality + calibration_axis + actionability;
        reliability.insert(
            review.review_id.clone(),
            ReliabilityScore {
                thoroughness,
                evidence_quality,
                calibration: calibration_axis,
                actionability,
                total,
            },
        );
    }

    let most_reliable_review_id = select_most_reliable(&reliability)?;

    Ok(MetaReviewResult {
        review_ids,
        artifact,
        totals,
        variance,
        high_variance: variance > HIGH_VARIANCE_THRESHOLD,
        per_dimension_consensus,
        issue_consensus,
        calibration,
        consensus_total,
        reliability,
        most_reliable_review_id,
    })
}

/// Count dimensions where a review's recorded effective score exceeds the
/// cap its own reported issues trigger. One contradiction per dimension.
fn count_contradictions(
    rubric: &RubricConfig,
    review: &ReviewRecord,
    rules: &[ScoringImpactRule],
) -> Result<u32, EngineError> {
    let mut contradictions = 0u32;
    for spec in &rubric.dimensions {
        let ev = review
            .evidence_for(&spec.name)
            .ok_or_else(|| EngineError::MissingEvidence {
                dimension: spec.name.clone(),
            })?;
        let recorded = review
            .report
            .dimension(&spec.name)
            .map(|d| d.raw_score_effective)
            .ok_or_else(|| EngineError::RubricMismatch {
                candidate_id: review.review_id.clone(),
                expected: rubric.kind.as_str().to_string(),
                found: format!("report without dimension '{}'", spec.name),
            })?;
        let cap = effective_cap(&spec.name, &ev.issues, rules);
        if recorded > cap {
            contradictions += 1;
        }
    }
    Ok(contradictions)
}

/// `found / total * 5`, with an empty denominator scoring the full 5.0
/// (nothing to miss or fault).
fn fraction_axis(found: usize, total: usize) -> f64 {
    if total == 0 {
        5.0
    } else {
        (found as f64) / (total as f64) * 5.0
    }
}

/// Highest reliability total wins; ties fall back to calibration, then
/// thoroughness, then review id for determinism.
fn select_most_reliable(
    reliability: &BTreeMap<String, ReliabilityScore>,
) -> Result<String, EngineError> {
    reliability
        .iter()
        .max_by(|(id_a, a), (id_b, b)| {
            a.total
                .total_cmp(&b.total)
                .then(a.calibration.total_cmp(&b.calibration))
                .then(a.thoroughness.total_cmp(&b.thoroughness))
                .then(id_b.cmp(id_a))
        })
        .map(|(id, _)| id.clone())
        .ok_or_else(|| EngineError::InsufficientReviews { got: 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{plan_impact_rules, Issue};
    use crate::scoring::score_candidate;

    fn plan_evidence(scores: [i32; 5]) -> Vec<Evidence> {
        let names = [
            "Executability",
            "Completeness",
            "Risk Awareness",
            "Sequencing",
            "Resourcing",
        ];
        names
            .iter()
            .zip(scores)
            .map(|(name, raw)| Evidence::new(*name, raw))
            .collect()
    }

    fn review(id: &str, artifact: &str, evidence: Vec<Evidence>) -> ReviewRecord {
        let rubric = RubricConfig::plan();
        let report = score_candidate(id, &rubric, &evidence, &plan_impact_rules()).unwrap();
        ReviewRecord::new(id, artifact, report, evidence)
    }

    #[test]
    fn fewer_than_two_reviews_rejected() {
        let rubric = RubricConfig::plan();
        let only = review("r1", "plan.md", plan_evidence([4, 4, 4, 4, 4]));
        let err = meta_review(&rubric, &[only], &plan_impact_rules()).unwrap_err();
        assert_eq!(err.code(), "insufficient_reviews");
    }

    #[test]
    fn duplicate_review_ids_rejected() {
        let rubric = RubricConfig::plan();
        // Two records under one id, total 80 each. Merging them would push
        // the weighted consensus past the 100-point scale, so the call must
        // fail outright instead of returning a result.
        let a = review("r1", "plan.md", plan_evidence([4, 4, 4, 4, 4]));
        let b = review("r1", "plan.md", plan_evidence([4, 4, 4, 4, 4]));
        assert_eq!(a.report.total, 80);
        let err = meta_review(&rubric, &[a, b], &plan_impact_rules()).unwrap_err();
        assert_eq!(err.code(), "duplicate_review");
    }

    #[test]
    fn different_artifacts_rejected() {
        let rubric = RubricConfig::plan();
        let a = review("r1", "plan-a.md", plan_evidence([4, 4, 4, 4, 4]));
        let b = review("r2", "plan-b.md", plan_evidence([4, 4, 4, 4, 4]));
        let err = meta_review(&rubric, &[a, b], &plan_impact_rules()).unwrap_err();
        assert_eq!(err.code(), "artifact_mismatch");
    }

    #[test]
    fn variance_and_high_variance_flag() {
        let rubric = RubricConfig::plan();
        let a = review("r1", "plan.md", plan_evidence([5, 5, 5, 4, 4])); // 94
        let b = review("r2", "plan.md", plan_evidence([4, 4, 4, 4, 4])); // 80
        let result = meta_review(&rubric, &[a, b], &plan_impact_rules()).unwrap();
        assert_eq!(result.variance, 14);
        assert!(result.high_variance);
    }

    #[test]
    fn dimension_agreement_flags() {
        let rubric = RubricConfig::plan();
        let a = review("r1", "plan.md", plan_evidence([4, 4, 4, 4, 4]));
        let b = review("r2", "plan.md", plan_evidence([4, 3, 4, 4, 4]));
        let result = meta_review(&rubric, &[a, b], &plan_impact_rules()).unwrap();
        assert!(result.per_dimension_consensus["Executability"].agreement);
        let comp = &result.per_dimension_consensus["Completeness"];
        assert!(!comp.agreement);
        assert_eq!(comp.variance, 1);
    }

    #[test]
    fn issue_consensus_statuses() {
        let rubric = RubricConfig::plan();
        let shared = Issue::new("amb-intro", "ambiguous_phrase");
        let solo = Issue::new("amb-outro", "ambiguous_phrase");

        let mut ev_a = plan_evidence([4, 4, 4, 4, 4]);
        ev_a[0].issues = vec![shared.clone(), solo.clone()];
        let mut ev_b = plan_evidence([4, 4, 4, 4, 4]);
        ev_b[0].issues = vec![shared.clone()];
        let mut ev_c = plan_evidence([4, 4, 4, 4, 4]);
        ev_c[0].issues = vec![shared];

        let result = meta_review(
            &rubric,
            &[
                review("r1", "plan.md", ev_a),
                review("r2", "plan.md", ev_b),
                review("r3", "plan.md", ev_c),
            ],
            &plan_impact_rules(),
        )
        .unwrap();

        assert_eq!(
            result.issue_consensus["amb-intro"].status,
            IssueStatus::Confirmed
        );
        assert_eq!(
            result.issue_consensus["amb-outro"].status,
            IssueStatus::Disputed
        );
        assert_eq!(result.issue_consensus["amb-intro"].found_by.len(), 3);
    }

    #[test]
    fn self_contradiction_costs_calibration_weight() {
        let rubric = RubricConfig::plan();
        // r1 reports 8 ambiguous phrases but a hand-built report claims
        // Executability 5/5: the rules cap at 3, so that is a contradiction.
        let mut ev = plan_evidence([5, 4, 4, 4, 4]);
        ev[0].issues = (0..8)
            .map(|i| Issue::new(format!("amb-{i}"), "ambiguous_phrase"))
            .collect();
        let clean_report =
            score_candidate("r1", &rubric, &plan_evidence([5, 4, 4, 4, 4]), &[]).unwrap();
        let contradicted = ReviewRecord::new("r1", "plan.md", clean_report, ev);
        let honest = review("r2", "plan.md", plan_evidence([4, 4, 4, 4, 4]));

        let result =
            meta_review(&rubric, &[contradicted, honest], &plan_impact_rules()).unwrap();
        let cal = &result.calibration["r1"];
        assert_eq!(cal.contradictions, 1);
        assert!((cal.weight - 0.95).abs() < 1e-9);
        assert!((result.calibration["r2"].weight - 1.0).abs() < 1e-9);
    }

    #[test]
    fn most_reliable_prefers_cited_and_calibrated_reviewer() {
        let rubric = RubricConfig::plan();
        let shared = Issue::new("amb-1", "ambiguous_phrase");

        let mut ev_a = plan_evidence([4, 4, 4, 4, 4]);
        ev_a[0].issues = vec![shared
            .clone()
            .at("step 3, second bullet")
            .with_fix("name the deployment target explicitly")];
        let mut ev_b = plan_evidence([4, 4, 4, 4, 4]);
        ev_b[0].issues = vec![shared];

        let result = meta_review(
            &rubric,
            &[
                review("r1", "plan.md", ev_a),
                review("r2", "plan.md", ev_b),
            ],
            &plan_impact_rules(),
        )
        .unwrap();

        assert_eq!(result.most_reliable_review_id, "r1");
        let r1 = &result.reliability["r1"];
        assert!((r1.evidence_quality - 5.0).abs() < 1e-9);
        assert!((r1.actionability - 5.0).abs() < 1e-9);
        assert!((r1.total - 20.0).abs() < 1e-9);
    }

    #[test]
    fn thoroughness_penalizes_missing_corroborated_issues() {
        let rubric = RubricConfig::plan();
        let found_by_all = Issue::new("amb-all", "ambiguous_phrase");
        let found_by_two = Issue::new("amb-two", "ambiguous_phrase");

        let mut ev_a = plan_evidence([4, 4, 4, 4, 4]);
        ev_a[0].issues = vec![found_by_all.clone(), found_by_two.clone()];
        let mut ev_b = plan_evidence([4, 4, 4, 4, 4]);
        ev_b[0].issues = vec![found_by_all.clone(), found_by_two];
        let mut ev_c = plan_evidence([4, 4, 4, 4, 4]);
        ev_c[0].issues = vec![found_by_all];

        let result = meta_review(
            &rubric,
            &[
                review("r1", "plan.md", ev_a),
                review("r2", "plan.md", ev_b),
                review("r3", "plan.md", ev_c),
            ],
            &plan_impact_rules(),
        )
        .unwrap();

        // "amb-two" is majority (2 of 3) and counts against r3, who missed
        // it: 1 of 2 corroborated issues found.
        assert_eq!(
            result.issue_consensus["amb-two"].status,
            IssueStatus::Majority
        );
        assert!((result.reliability["r1"].thoroughness - 5.0).abs() < 1e-9);
        assert!((result.reliability["r3"].thoroughness - 2.5).abs() < 1e-9);
        assert_eq!(result.most_reliable_review_id, "r1");
    }

    #[test]
    fn reliability_ties_break_deterministically() {
        let rubric = RubricConfig::plan();
        let a = review("alpha", "plan.md", plan_evidence([4, 4, 4, 4, 4]));
        let b = review("beta", "plan.md", plan_evidence([4, 4, 4, 4, 4]));
        let result = meta_review(&rubric, &[b, a], &plan_impact_rules()).unwrap();
        // Identical reviews: lexicographically smaller id wins.
        assert_eq!(result.most_reliable_review_id, "alpha");
    }
}
