//! Markdown rendering for engine results.
//!
//! Each rendering is stamped with a blake3 fingerprint of the serialized
//! result so a reader can tell whether two documents describe the same run.

use serde::Serialize;

use crate::compare::{ComparisonResult, DimensionWinner};
use crate::meta_review::{IssueStatus, MetaReviewResult};
use crate::scoring::ScoreReport;

/// Blake3 hex fingerprint of any serializable result.
pub fn fingerprint<T: Serialize>(value: &T) -> String {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}

/// Render a single-candidate score report.
pub fn render_score_report_markdown(report: &ScoreReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Review: {}\n\n", report.candidate_id));
    out.push_str(&format!("- Rubric: {}\n", report.rubric_kind.as_str()));
    out.push_str(&format!("- Total: {}/100\n", report.total));
    out.push_str(&format!("- Verdict: {}\n", report.verdict));
    if report.critical_floor_breached {
        out.push_str("- Critical floor breached: verdict demoted one tier\n");
    }
    out.push_str(&format!("- Fingerprint: `{}`\n", fingerprint(report)));

    out.push_str("\n## Dimensions\n\n");
    for dim in &report.dimensions {
        out.push_str(&format!(
            "- {} (weight {}): {}/5 -> {} points{}\n",
            dim.spec.name,
            dim.spec.weight,
            dim.raw_score_effective,
            dim.points,
            if dim.spec.is_critical { " [critical]" } else { "" }
        ));
    }

    out
}

/// Render a multi-candidate comparison.
pub fn render_comparison_markdown(result: &ComparisonResult) -> String {
    let mut out = String::new();
    out.push_str("# Comparison\n\n");
    out.push_str(&format!(
        "- Candidates: {}\n",
        result.candidate_ids.join(", ")
    ));
    out.push_str(&format!("- Fingerprint: `{}`\n", fingerprint(result)));

    out.push_str("\n## Ranking\n\n");
    for entry in &result.ranking {
        out.push_str(&format!(
            "{}. {} ({}/100)\n",
            entry.rank, entry.candidate_id, entry.total
        ));
    }

    out.push_str("\n## Per-dimension winners\n\n");
    for (dimension, winner) in &result.per_dimension_winner {
        let label = match winner {
            DimensionWinner::Candidate(id) => id.as_str(),
            DimensionWinner::Tie => "tie",
        };
        out.push_str(&format!("- {dimension}: {label}\n"));
    }

    out
}

/// Render a meta-review.
pub fn render_meta_review_markdown(result: &MetaReviewResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Meta-review: {}\n\n", result.artifact));
    out.push_str(&format!("- Reviews: {}\n", result.review_ids.join(", ")));
    out.push_str(&format!(
        "- Score variance: {}{}\n",
        result.variance,
        if result.high_variance { " (high)" } else { "" }
    ));
    out.push_str(&format!("- Consensus total: {}/100\n", result.consensus_total));
    out.push_str(&format!(
        "- Most reliable review: {}\n",
        result.most_reliable_review_id
    ));
    out.push_str(&format!("- Fingerprint: `{}`\n", fingerprint(result)));

    out.push_str("\n## Totals and calibration\n\n");
    for id in &result.review_ids {
        let cal = &result.calibration[id];
        out.push_str(&format!(
            "- {}: total {}/100, weight {:.2} ({} contradiction{})\n",
            id,
            result.totals[id],
            cal.weight,
            cal.contradictions,
            if cal.contradictions == 1 { "" } else { "s" }
        ));
    }

    out.push_str("\n## Dimension consensus\n\n");
    for (dimension, consensus) in &result.per_dimension_consensus {
        out.push_str(&format!(
            "- {}: {} (spread {})\n",
            dimension,
            if consensus.agreement {
                "consensus"
            } else {
                "disagreement"
            },
            consensus.variance
        ));
    }

    if !result.issue_consensus.is_empty() {
        out.push_str("\n## Issues\n\n");
        for (key, consensus) in &result.issue_consensus {
            let status = match consensus.status {
                IssueStatus::Confirmed => "confirmed",
                IssueStatus::Majority => "majority",
                IssueStatus::Disputed => "disputed - manual check",
            };
            out.push_str(&format!(
                "- `{}`: {} (found by {})\n",
                key,
                status,
                consensus.found_by.join(", ")
            ));
        }
    }

    out.push_str("\n## Reliability\n\n");
    for id in &result.review_ids {
        let r = &result.reliability[id];
        out.push_str(&format!(
            "- {}: {:.1}/20 (thoroughness {:.1}, evidence {:.1}, calibration {:.1}, actionability {:.1})\n",
            id, r.total, r.thoroughness, r.evidence_quality, r.calibration, r.actionability
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::Evidence;
    use crate::rubric::RubricConfig;
    use crate::scoring::score_candidate;

    fn sample_report() -> ScoreReport {
        let rubric = RubricConfig::document();
        let ev = vec![
            Evidence::new("Accuracy", 4),
            Evidence::new("Clarity", 5),
            Evidence::new("Completeness", 4),
            Evidence::new("Structure", 3),
            Evidence::new("Style", 4),
        ];
        score_candidate("guide.md", &rubric, &ev, &[]).unwrap()
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let report = sample_report();
        assert_eq!(fingerprint(&report), fingerprint(&report));
        assert_eq!(fingerprint(&report).len(), 64);
    }

    #[test]
    fn score_report_rendering_names_all_dimensions() {
        let report = sample_report();
        let md = render_score_report_markdown(&report);
        assert!(md.contains("guide.md"));
        assert!(md.contains(&format!("Total: {}/100", report.total)));
        for dim in &report.dimensions {
            assert!(md.contains(dim.spec.name.as_str()));
        }
        assert!(md.contains("[critical]"));
    }
}
