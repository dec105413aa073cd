//! Rubric configuration: dimensions, weights, and verdict thresholds.
//!
//! A rubric is pure data. Scoring, verdicts, and tie-breaking all read from
//! these tables generically, so a new review kind is a new table, not new
//! code. Two builtin rubrics are provided, one per review kind; both
//! distribute exactly 100 points across their dimensions.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Verdict labels for document reviews, ordered best to worst.
pub mod document_verdicts {
    pub const PUBLISHABLE: &str = "PUBLISHABLE";
    pub const PUBLISHABLE_WITH_EDITS: &str = "PUBLISHABLE_WITH_EDITS";
    pub const NEEDS_REVISION: &str = "NEEDS_REVISION";
    pub const NOT_PUBLISHABLE: &str = "NOT_PUBLISHABLE";
}

/// Verdict labels for plan reviews, ordered best to worst.
pub mod plan_verdicts {
    pub const EXECUTABLE: &str = "EXECUTABLE";
    pub const EXECUTABLE_WITH_REFINEMENTS: &str = "EXECUTABLE_WITH_REFINEMENTS";
    pub const NEEDS_REFINEMENT: &str = "NEEDS_REFINEMENT";
    pub const NOT_EXECUTABLE: &str = "NOT_EXECUTABLE";
}

/// What kind of artifact a rubric reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewKind {
    Document,
    Plan,
}

impl ReviewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Plan => "plan",
        }
    }
}

/// One named axis of assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionSpec {
    /// Dimension name, unique within a rubric.
    pub name: String,
    /// Weight multiplier applied to the raw 1-5 score.
    pub weight: u32,
    /// Whether a low score here can demote an otherwise-high verdict.
    pub is_critical: bool,
}

impl DimensionSpec {
    pub fn new(name: impl Into<String>, weight: u32, is_critical: bool) -> Self {
        Self {
            name: name.into(),
            weight,
            is_critical,
        }
    }

    /// Maximum contribution of this dimension to the 100-point total.
    pub fn max_points(&self) -> u32 {
        self.weight * 5
    }
}

/// One row of the verdict threshold table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictThreshold {
    /// Minimum total score (inclusive) for this verdict.
    pub min_total: u32,
    /// Verdict label.
    pub label: String,
}

impl VerdictThreshold {
    pub fn new(min_total: u32, label: impl Into<String>) -> Self {
        Self {
            min_total,
            label: label.into(),
        }
    }
}

/// The full scoring configuration for one review kind.
///
/// Immutable after construction. `RubricConfig::new` validates every
/// invariant; the builtin rubrics are covered by the same validation in
/// tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricConfig {
    pub kind: ReviewKind,
    /// Dimensions in presentation order.
    pub dimensions: Vec<DimensionSpec>,
    /// Threshold table, strictly decreasing by `min_total`, ending at 0.
    pub verdict_thresholds: Vec<VerdictThreshold>,
    /// Effective critical score at or below which the verdict is demoted.
    pub critical_override_floor: u32,
    /// Critical dimension names in tie-break priority order.
    ///
    /// Disambiguates the "highest-weighted critical dimension" tie-break when
    /// two critical dimensions share the top weight.
    pub critical_priority: Vec<String>,
}

impl RubricConfig {
    /// Build and validate a rubric.
    pub fn new(
        kind: ReviewKind,
        dimensions: Vec<DimensionSpec>,
        verdict_thresholds: Vec<VerdictThreshold>,
        critical_override_floor: u32,
        critical_priority: Vec<String>,
    ) -> Result<Self, EngineError> {
        let rubric = Self {
            kind,
            dimensions,
            verdict_thresholds,
            critical_override_floor,
            critical_priority,
        };
        rubric.validate()?;
        Ok(rubric)
    }

    /// Builtin document review rubric.
    pub fn document() -> Self {
        Self {
            kind: ReviewKind::Document,
            dimensions: vec![
                DimensionSpec::new("Accuracy", 6, true),
                DimensionSpec::new("Clarity", 5, false),
                DimensionSpec::new("Completeness", 4, true),
                DimensionSpec::new("Structure", 3, false),
                DimensionSpec::new("Style", 2, false),
            ],
            verdict_thresholds: vec![
                VerdictThreshold::new(90, document_verdicts::PUBLISHABLE),
                VerdictThreshold::new(75, document_verdicts::PUBLISHABLE_WITH_EDITS),
                VerdictThreshold::new(60, document_verdicts::NEEDS_REVISION),
                VerdictThreshold::new(0, document_verdicts::NOT_PUBLISHABLE),
            ],
            critical_override_floor: 2,
            critical_priority: vec!["Accuracy".into(), "Completeness".into()],
        }
    }

    /// Builtin plan review rubric.
    pub fn plan() -> Self {
        Self {
            kind: ReviewKind::Plan,
            dimensions: vec![
                DimensionSpec::new("Executability", 6, true),
                DimensionSpec::new("Completeness", 4, true),
                DimensionSpec::new("Risk Awareness", 4, false),
                DimensionSpec::new("Sequencing", 3, false),
                DimensionSpec::new("Resourcing", 3, false),
            ],
            verdict_thresholds: vec![
                VerdictThreshold::new(90, plan_verdicts::EXECUTABLE),
                VerdictThreshold::new(75, plan_verdicts::EXECUTABLE_WITH_REFINEMENTS),
                VerdictThreshold::new(60, plan_verdicts::NEEDS_REFINEMENT),
                VerdictThreshold::new(0, plan_verdicts::NOT_EXECUTABLE),
            ],
            critical_override_floor: 2,
            critical_priority: vec!["Executability".into(), "Completeness".into()],
        }
    }

    /// Look up a dimension by name.
    pub fn dimension(&self, name: &str) -> Option<&DimensionSpec> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Dimensions flagged critical, in presentation order.
    pub fn critical_dimensions(&self) -> impl Iterator<Item = &DimensionSpec> {
        self.dimensions.iter().filter(|d| d.is_critical)
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.dimensions.is_empty() {
            return Err(EngineError::config("rubric has no dimensions"));
        }
        for (i, dim) in self.dimensions.iter().enumerate() {
            if dim.weight == 0 {
                return Err(EngineError::Config(format!(
                    "dimension '{}' has zero weight",
                    dim.name
                )));
            }
            if self.dimensions[..i].iter().any(|d| d.name == dim.name) {
                return Err(EngineError::Config(format!(
                    "duplicate dimension '{}'",
                    dim.name
                )));
            }
        }

        let total_points: u32 = self.dimensions.iter().map(DimensionSpec::max_points).sum();
        if total_points != 100 {
            return Err(EngineError::Config(format!(
                "dimension max points sum to {total_points}, expected 100"
            )));
        }

        if self.verdict_thresholds.is_empty() {
            return Err(EngineError::config("rubric has no verdict thresholds"));
        }
        for pair in self.verdict_thresholds.windows(2) {
            if pair[1].min_total >= pair[0].min_total {
                return Err(EngineError::Config(format!(
                    "verdict thresholds not strictly decreasing: {} then {}",
                    pair[0].min_total, pair[1].min_total
                )));
            }
        }
        let first = &self.verdict_thresholds[0];
        if first.min_total > 100 {
            return Err(EngineError::Config(format!(
                "top verdict threshold {} exceeds the 100-point scale",
                first.min_total
            )));
        }
        let last = self
            .verdict_thresholds
            .last()
            .ok_or_else(|| EngineError::config("rubric has no verdict thresholds"))?;
        if last.min_total != 0 {
            return Err(EngineError::Config(format!(
                "verdict thresholds leave a gap: lowest min_total is {}, expected 0",
                last.min_total
            )));
        }
        if self
            .verdict_thresholds
            .iter()
            .any(|t| t.label.trim().is_empty())
        {
            return Err(EngineError::config("verdict threshold with empty label"));
        }

        // critical_priority must list exactly the critical dimensions.
        let critical: Vec<&str> = self
            .critical_dimensions()
            .map(|d| d.name.as_str())
            .collect();
        if self.critical_priority.len() != critical.len() {
            return Err(EngineError::Config(format!(
                "critical_priority names {} dimensions, rubric has {} critical",
                self.critical_priority.len(),
                critical.len()
            )));
        }
        for name in &self.critical_priority {
            match self.dimension(name) {
                Some(dim) if dim.is_critical => {}
                Some(_) => {
                    return Err(EngineError::Config(format!(
                        "critical_priority names non-critical dimension '{name}'"
                    )))
                }
                None => {
                    return Err(EngineError::Config(format!(
                        "critical_priority names unknown dimension '{name}'"
                    )))
                }
            }
        }
        let mut seen: Vec<&str> = Vec::new();
        for name in &self.critical_priority {
            if seen.contains(&name.as_str()) {
                return Err(EngineError::Config(format!(
                    "critical_priority repeats '{name}'"
                )));
            }
            seen.push(name.as_str());
        }

        Ok(())
    }
}
