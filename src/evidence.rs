//! Evidence produced by the external rubric evaluator, and the scoring
//! impact rules that cap raw scores from it.
//!
//! The engine never inspects artifact text itself. It only reads what the
//! evaluator declared: a raw 1-5 score per dimension plus the issues it
//! found. Impact rules turn declared issues into score caps so that a high
//! raw score cannot silently coexist with heavy issue counts.

use serde::{Deserialize, Serialize};

/// A single issue the evaluator detected in the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Stable identity used to match the same finding across reviewers.
    pub key: String,
    /// Category the impact rules trigger on (e.g. `ambiguous_phrase`).
    pub kind: String,
    /// Where in the artifact the issue sits, if the evaluator cited one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Concrete fix, if the evaluator proposed one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
}

impl Issue {
    pub fn new(key: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: kind.into(),
            location: None,
            suggested_fix: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }
}

/// What the evaluator reported for one dimension.
///
/// Owned by the caller; the engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// Dimension name, matching a `DimensionSpec` in the active rubric.
    pub dimension: String,
    /// Raw 1-5 judgement before rule-based capping.
    pub raw_score: i32,
    /// Issues detected while assessing this dimension.
    pub issues: Vec<Issue>,
    /// Free-text justification.
    pub rationale: String,
}

impl Evidence {
    pub fn new(dimension: impl Into<String>, raw_score: i32) -> Self {
        Self {
            dimension: dimension.into(),
            raw_score,
            issues: Vec::new(),
            rationale: String::new(),
        }
    }

    pub fn with_issues(mut self, issues: Vec<Issue>) -> Self {
        self.issues = issues;
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    /// Count of issues of one kind.
    pub fn issue_count(&self, kind: &str) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }
}

/// Condition under which an impact rule fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTrigger {
    /// At least `count` issues of `kind` were reported.
    IssueCountAtLeast { kind: String, count: usize },
    /// Any issue of `kind` was reported.
    IssuePresent { kind: String },
}

impl RuleTrigger {
    /// Whether this trigger fires for the given issue set.
    pub fn fires(&self, issues: &[Issue]) -> bool {
        match self {
            Self::IssueCountAtLeast { kind, count } => {
                issues.iter().filter(|i| &i.kind == kind).count() >= *count
            }
            Self::IssuePresent { kind } => issues.iter().any(|i| &i.kind == kind),
        }
    }
}

/// Caps a raw score when declared issues contradict it.
///
/// Rules are evaluated independently; when several fire for one dimension
/// the tightest cap wins, never relaxed by a looser rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringImpactRule {
    /// Dimension this rule constrains.
    pub applies_to: String,
    /// Firing condition.
    pub trigger: RuleTrigger,
    /// Raw score ceiling when the trigger fires.
    pub cap_raw_score_at: u32,
}

impl ScoringImpactRule {
    pub fn count_at_least(
        applies_to: impl Into<String>,
        kind: impl Into<String>,
        count: usize,
        cap: u32,
    ) -> Self {
        Self {
            applies_to: applies_to.into(),
            trigger: RuleTrigger::IssueCountAtLeast {
                kind: kind.into(),
                count,
            },
            cap_raw_score_at: cap,
        }
    }

    pub fn present(applies_to: impl Into<String>, kind: impl Into<String>, cap: u32) -> Self {
        Self {
            applies_to: applies_to.into(),
            trigger: RuleTrigger::IssuePresent { kind: kind.into() },
            cap_raw_score_at: cap,
        }
    }
}

/// Tightest cap the rules impose on one dimension, given its issues.
///
/// Returns 5 (no cap) when no rule fires.
pub fn effective_cap(dimension: &str, issues: &[Issue], rules: &[ScoringImpactRule]) -> u32 {
    rules
        .iter()
        .filter(|r| r.applies_to == dimension && r.trigger.fires(issues))
        .map(|r| r.cap_raw_score_at)
        .min()
        .unwrap_or(5)
}

/// Builtin impact rules for plan reviews.
///
/// Ambiguous phrasing directly undermines executability: ten or more
/// ambiguous phrases cap Executability at 2, five or more at 3.
pub fn plan_impact_rules() -> Vec<ScoringImpactRule> {
    vec![
        ScoringImpactRule::count_at_least("Executability", "ambiguous_phrase", 10, 2),
        ScoringImpactRule::count_at_least("Executability", "ambiguous_phrase", 5, 3),
        ScoringImpactRule::count_at_least("Completeness", "missing_step", 3, 3),
        ScoringImpactRule::present("Completeness", "missing_prerequisite", 4),
    ]
}

/// Builtin impact rules for document reviews.
pub fn document_impact_rules() -> Vec<ScoringImpactRule> {
    vec![
        ScoringImpactRule::count_at_least("Accuracy", "broken_link", 5, 2),
        ScoringImpactRule::count_at_least("Accuracy", "broken_link", 2, 3),
        ScoringImpactRule::present("Accuracy", "factual_error", 2),
        ScoringImpactRule::count_at_least("Clarity", "ambiguous_phrase", 10, 2),
        ScoringImpactRule::count_at_least("Clarity", "ambiguous_phrase", 5, 3),
    ]
}
