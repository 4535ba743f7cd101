//! Per-tier conformance evaluation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::verdict::{VectorResult, VectorStatus};
use crate::vector::ConformanceLevel;

/// Outcome for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConformanceResult {
    #[serde(rename = "CONFORMANT")]
    Conformant,
    #[serde(rename = "PARTIAL")]
    Partial,
    #[serde(rename = "NON-CONFORMANT")]
    NonConformant,
}

impl ConformanceResult {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conformant => "CONFORMANT",
            Self::Partial => "PARTIAL",
            Self::NonConformant => "NON-CONFORMANT",
        }
    }
}

impl fmt::Display for ConformanceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tallies and result for one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConformanceCriteria {
    pub level: ConformanceLevel,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub result: ConformanceResult,
}

impl ConformanceCriteria {
    /// Count the results at `level` and classify them.
    ///
    /// A tier with no vectors is non-conformant: conformance cannot be
    /// claimed without evidence.
    #[must_use]
    pub fn evaluate(results: &[VectorResult], level: ConformanceLevel) -> Self {
        let mut criteria = Self {
            level,
            total: 0,
            passed: 0,
            failed: 0,
            skipped: 0,
            errors: 0,
            result: ConformanceResult::NonConformant,
        };
        for result in results.iter().filter(|r| r.vector.level == level) {
            criteria.total += 1;
            match result.status {
                VectorStatus::Pass => criteria.passed += 1,
                VectorStatus::Fail => criteria.failed += 1,
                VectorStatus::Skip => criteria.skipped += 1,
                VectorStatus::Error => criteria.errors += 1,
            }
        }
        criteria.result = if criteria.total == 0 || criteria.failed > 0 || criteria.errors > 0 {
            ConformanceResult::NonConformant
        } else if criteria.skipped > 0 {
            ConformanceResult::Partial
        } else {
            ConformanceResult::Conformant
        };
        criteria
    }
}

/// Criteria for every tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCriteria {
    pub tier1: ConformanceCriteria,
    pub tier2: ConformanceCriteria,
    pub tier3: ConformanceCriteria,
}

impl LevelCriteria {
    #[must_use]
    pub fn evaluate(results: &[VectorResult]) -> Self {
        Self {
            tier1: ConformanceCriteria::evaluate(results, ConformanceLevel::Tier1),
            tier2: ConformanceCriteria::evaluate(results, ConformanceLevel::Tier2),
            tier3: ConformanceCriteria::evaluate(results, ConformanceLevel::Tier3),
        }
    }

    #[must_use]
    pub const fn get(&self, level: ConformanceLevel) -> &ConformanceCriteria {
        match level {
            ConformanceLevel::Tier1 => &self.tier1,
            ConformanceLevel::Tier2 => &self.tier2,
            ConformanceLevel::Tier3 => &self.tier3,
        }
    }

    /// Highest tier that is at least partial, e.g. `"tier-2 CONFORMANT"`,
    /// or `"NON-CONFORMANT"` when none is.
    ///
    /// Tiers are judged independently: a partial tier-3 outranks a
    /// conformant tier-1.
    #[must_use]
    pub fn overall_result(&self) -> String {
        ConformanceLevel::ALL
            .iter()
            .rev()
            .map(|level| self.get(*level))
            .find(|criteria| criteria.result != ConformanceResult::NonConformant)
            .map_or_else(
                || ConformanceResult::NonConformant.to_string(),
                |criteria| format!("{} {}", criteria.level, criteria.result),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::{ExpectedOutcome, TestVector, VectorPayload};
    use crate::verdict::Verdict;
    use std::time::Duration;

    fn result(id: &str, level: ConformanceLevel, verdict: Verdict) -> VectorResult {
        let vector = TestVector {
            id: id.into(),
            level,
            title: String::new(),
            description: String::new(),
            payload: VectorPayload::Scenario,
            expected: ExpectedOutcome::Notification,
            reference: None,
        };
        VectorResult::from_verdict(vector, verdict, Duration::ZERO)
    }

    #[test]
    fn empty_tier_is_non_conformant() {
        let criteria = ConformanceCriteria::evaluate(&[], ConformanceLevel::Tier2);
        assert_eq!(criteria.total, 0);
        assert_eq!(criteria.result, ConformanceResult::NonConformant);
    }

    #[test]
    fn skips_only_make_partial() {
        let results = vec![
            result("a", ConformanceLevel::Tier1, Verdict::pass(None)),
            result("b", ConformanceLevel::Tier1, Verdict::skip("later")),
        ];
        let criteria = ConformanceCriteria::evaluate(&results, ConformanceLevel::Tier1);
        assert_eq!(criteria.result, ConformanceResult::Partial);
        assert_eq!((criteria.passed, criteria.skipped), (1, 1));
    }

    #[test]
    fn any_error_is_non_conformant() {
        let results = vec![
            result("a", ConformanceLevel::Tier1, Verdict::pass(None)),
            result("b", ConformanceLevel::Tier1, Verdict::error("Timeout after 5000ms")),
        ];
        let criteria = ConformanceCriteria::evaluate(&results, ConformanceLevel::Tier1);
        assert_eq!(criteria.result, ConformanceResult::NonConformant);
        assert_eq!(criteria.errors, 1);
    }

    #[test]
    fn tallies_ignore_other_tiers() {
        let results = vec![
            result("a", ConformanceLevel::Tier1, Verdict::pass(None)),
            result("b", ConformanceLevel::Tier2, Verdict::fail("nope", None)),
        ];
        let criteria = ConformanceCriteria::evaluate(&results, ConformanceLevel::Tier1);
        assert_eq!(criteria.total, 1);
        assert_eq!(criteria.result, ConformanceResult::Conformant);
    }

    #[test]
    fn overall_prefers_highest_tier() {
        let results = vec![
            result("a", ConformanceLevel::Tier1, Verdict::pass(None)),
            result("b", ConformanceLevel::Tier2, Verdict::fail("nope", None)),
            result("c", ConformanceLevel::Tier3, Verdict::skip("scenario")),
        ];
        let criteria = LevelCriteria::evaluate(&results);
        assert_eq!(criteria.overall_result(), "tier-3 PARTIAL");
    }

    #[test]
    fn overall_non_conformant_when_nothing_qualifies() {
        let results = vec![result("a", ConformanceLevel::Tier1, Verdict::fail("x", None))];
        assert_eq!(LevelCriteria::evaluate(&results).overall_result(), "NON-CONFORMANT");
    }

    #[test]
    fn serializes_result_labels() {
        let value = serde_json::to_value(ConformanceResult::NonConformant).expect("serializes");
        assert_eq!(value, serde_json::json!("NON-CONFORMANT"));
    }
}
