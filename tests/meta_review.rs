use verdict_engine::{
    meta_review, score_candidate, Evidence, Issue, ReviewRecord, RubricConfig, ScoringImpactRule,
};

const DIMENSIONS: [&str; 5] = [
    "Executability",
    "Completeness",
    "Risk Awareness",
    "Sequencing",
    "Resourcing",
];

fn plan_evidence(scores: [i32; 5]) -> Vec<Evidence> {
    DIMENSIONS
        .iter()
        .zip(scores)
        .map(|(name, raw)| Evidence::new(*name, raw))
        .collect()
}

/// One flaw issue per listed dimension, under a rule set that caps any
/// flawed dimension at 2. A recorded score above 2 on a flawed dimension is
/// then a self-contradiction.
fn flaw_rules() -> Vec<ScoringImpactRule> {
    DIMENSIONS
        .iter()
        .map(|dim| ScoringImpactRule::present(*dim, "flaw", 2))
        .collect()
}

fn review_with_flaws(
    id: &str,
    scores: [i32; 5],
    flawed_dimensions: &[&str],
) -> ReviewRecord {
    let rubric = RubricConfig::plan();
    // Score without rules so the report keeps the raw judgements; the flaw
    // issues then live only in the evidence, where calibration checks them.
    let report = score_candidate(id, &rubric, &plan_evidence(scores), &[]).unwrap();
    let mut evidence = plan_evidence(scores);
    for ev in &mut evidence {
        if flawed_dimensions.contains(&ev.dimension.as_str()) {
            ev.issues
                .push(Issue::new(format!("{}-{}-flaw", id, ev.dimension), "flaw"));
        }
    }
    ReviewRecord::new(id, "migration-plan.md", report, evidence)
}

#[test]
fn calibration_weighted_consensus_matches_worked_example() {
    let rubric = RubricConfig::plan();

    // Totals 87, 73, 83 with 5, 0, and 2 self-contradictions, giving
    // calibration weights 0.75, 1.00, 0.90.
    let r1 = review_with_flaws("r1", [5, 5, 4, 3, 4], &DIMENSIONS); // 30+20+16+9+12 = 87
    let r2 = review_with_flaws("r2", [4, 3, 4, 3, 4], &[]); // 24+12+16+9+12 = 73
    let r3 = review_with_flaws("r3", [5, 4, 4, 4, 3], &["Executability", "Completeness"]); // 83

    assert_eq!(r1.report.total, 87);
    assert_eq!(r2.report.total, 73);
    assert_eq!(r3.report.total, 83);

    let result = meta_review(&rubric, &[r1, r2, r3], &flaw_rules()).unwrap();

    assert_eq!(result.calibration["r1"].contradictions, 5);
    assert!((result.calibration["r1"].weight - 0.75).abs() < 1e-9);
    assert_eq!(result.calibration["r2"].contradictions, 0);
    assert!((result.calibration["r2"].weight - 1.0).abs() < 1e-9);
    assert_eq!(result.calibration["r3"].contradictions, 2);
    assert!((result.calibration["r3"].weight - 0.90).abs() < 1e-9);

    // round((87*0.75 + 73*1.00 + 83*0.90) / 2.65) = 80
    assert_eq!(result.consensus_total, 80);

    assert_eq!(result.variance, 14);
    assert!(result.high_variance);
}

#[test]
fn uncontradicted_reviewers_keep_full_weight() {
    let rubric = RubricConfig::plan();
    let r1 = review_with_flaws("r1", [4, 4, 4, 4, 4], &[]);
    let r2 = review_with_flaws("r2", [4, 3, 4, 4, 4], &[]);
    let result = meta_review(&rubric, &[r1, r2], &flaw_rules()).unwrap();
    assert!(result
        .calibration
        .values()
        .all(|c| c.contradictions == 0 && (c.weight - 1.0).abs() < 1e-9));
    // Equal weights degrade to the plain mean: round((80 + 76) / 2) = 78.
    assert_eq!(result.consensus_total, 78);
    assert!(!result.high_variance);
}

#[test]
fn contradicted_reviewer_loses_reliability_selection() {
    let rubric = RubricConfig::plan();
    // r1 scores everything 5 while reporting flaws on every dimension; r2
    // reports the same flaws and scores accordingly low.
    let r1 = review_with_flaws("r1", [5, 5, 5, 5, 5], &DIMENSIONS);
    let mut r2 = review_with_flaws("r2", [2, 2, 2, 2, 2], &DIMENSIONS);
    // Align r2's issue keys with r1's so every flaw is confirmed by both.
    for (ev, dim) in r2.evidence.iter_mut().zip(DIMENSIONS) {
        ev.issues = vec![Issue::new(format!("r1-{dim}-flaw"), "flaw")];
    }
    let result = meta_review(&rubric, &[r1.clone(), r2], &flaw_rules()).unwrap();

    assert_eq!(result.calibration["r1"].contradictions, 5);
    assert_eq!(result.calibration["r2"].contradictions, 0);
    assert_eq!(result.most_reliable_review_id, "r2");
}
