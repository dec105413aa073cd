//! Verdict resolution: threshold table scan plus the critical-floor
//! override.
//!
//! The override exists so a single catastrophic dimension cannot be averaged
//! away by strong scores elsewhere: any critical dimension at or below the
//! rubric's floor demotes the verdict exactly one tier.

use serde::Serialize;

use crate::error::EngineError;
use crate::rubric::RubricConfig;

/// Outcome of resolving a total score against a rubric's threshold table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerdictResolution {
    /// Final verdict label, after any demotion.
    pub label: String,
    /// Index into the threshold table for the final verdict.
    pub tier: usize,
    /// Whether the critical-floor override demoted the verdict.
    pub critical_floor_breached: bool,
}

/// Resolve a verdict for `total`, demoting one tier when any critical
/// dimension's effective score sits at or below the rubric floor.
///
/// `critical_effective` carries `(dimension name, raw_score_effective)` for
/// every dimension the rubric flags critical. Demotion never goes below the
/// lowest defined tier.
pub fn resolve_verdict(
    rubric: &RubricConfig,
    total: u32,
    critical_effective: &[(String, u32)],
) -> Result<VerdictResolution, EngineError> {
    let thresholds = &rubric.verdict_thresholds;
    if thresholds.is_empty() {
        return Err(EngineError::config("rubric has no verdict thresholds"));
    }
    for pair in thresholds.windows(2) {
        if pair[0].min_total == pair[1].min_total {
            return Err(EngineError::Config(format!(
                "duplicate verdict threshold at {}",
                pair[0].min_total
            )));
        }
    }

    // Descending scan, first match wins.
    let tier = thresholds
        .iter()
        .position(|t| t.min_total <= total)
        .ok_or_else(|| {
            EngineError::Config(format!(
                "no verdict threshold covers total {total}; table must end at 0"
            ))
        })?;

    let breached = critical_effective
        .iter()
        .any(|(_, eff)| *eff <= rubric.critical_override_floor);

    let final_tier = if breached {
        (tier + 1).min(thresholds.len() - 1)
    } else {
        tier
    };

    Ok(VerdictResolution {
        label: thresholds[final_tier].label.clone(),
        tier: final_tier,
        critical_floor_breached: breached,
    })
}
