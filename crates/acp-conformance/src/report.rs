//! Final run report.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::evaluator::LevelCriteria;
use crate::validator::ValidationOutcome;
use crate::verdict::{VectorResult, VectorStatus};
use crate::vector::ConformanceLevel;

/// Everything a run produced. Built once by [`ConformanceReport::assemble`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConformanceReport {
    target: String,
    /// `None` when no manifest was validated up front.
    manifest_valid: Option<bool>,
    detected_level: Option<ConformanceLevel>,
    results: Vec<VectorResult>,
    criteria: LevelCriteria,
    overall_result: String,
}

impl ConformanceReport {
    /// Evaluate `results` and freeze them into a report.
    #[must_use]
    pub fn assemble(
        target: impl Into<String>,
        manifest: Option<&ValidationOutcome>,
        results: Vec<VectorResult>,
    ) -> Self {
        let criteria = LevelCriteria::evaluate(&results);
        let overall_result = criteria.overall_result();
        Self {
            target: target.into(),
            manifest_valid: manifest.map(|outcome| outcome.valid),
            detected_level: manifest.and_then(|outcome| outcome.conformance_level),
            results,
            criteria,
            overall_result,
        }
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub const fn manifest_valid(&self) -> Option<bool> {
        self.manifest_valid
    }

    #[must_use]
    pub const fn detected_level(&self) -> Option<ConformanceLevel> {
        self.detected_level
    }

    #[must_use]
    pub fn results(&self) -> &[VectorResult] {
        &self.results
    }

    #[must_use]
    pub const fn criteria(&self) -> &LevelCriteria {
        &self.criteria
    }

    #[must_use]
    pub fn overall_result(&self) -> &str {
        &self.overall_result
    }

    /// Whether the overall verdict is a failure.
    #[must_use]
    pub fn is_non_conformant(&self) -> bool {
        self.overall_result == crate::evaluator::ConformanceResult::NonConformant.as_str()
    }

    /// # Errors
    ///
    /// Fails only if a result carries a value serde cannot encode.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable summary.
    #[must_use]
    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# ACP Conformance Report\n");
        let _ = writeln!(out, "- **Target:** `{}`", self.target);
        let manifest = match self.manifest_valid {
            Some(true) => "valid",
            Some(false) => "invalid",
            None => "not checked",
        };
        let _ = writeln!(out, "- **Manifest:** {manifest}");
        if let Some(level) = self.detected_level {
            let _ = writeln!(out, "- **Declared level:** {level}");
        }
        let _ = writeln!(out, "- **Overall:** **{}**\n", self.overall_result);

        out.push_str("## Tiers\n\n");
        out.push_str("| Tier | Total | Passed | Failed | Skipped | Errors | Result |\n");
        out.push_str("|------|-------|--------|--------|---------|--------|--------|\n");
        for level in ConformanceLevel::ALL {
            let c = self.criteria.get(level);
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} | {} |",
                c.level, c.total, c.passed, c.failed, c.skipped, c.errors, c.result
            );
        }

        out.push_str("\n## Vectors\n\n");
        out.push_str("| Vector | Tier | Status | Duration | Detail |\n");
        out.push_str("|--------|------|--------|----------|--------|\n");
        for result in &self.results {
            let status = match result.status {
                VectorStatus::Pass => "pass",
                VectorStatus::Fail => "**FAIL**",
                VectorStatus::Skip => "skip",
                VectorStatus::Error => "**ERROR**",
            };
            let detail = result
                .skip_reason
                .as_deref()
                .or(result.error.as_deref())
                .unwrap_or(result.vector.title.as_str());
            let _ = writeln!(
                out,
                "| {} | {} | {} | {}ms | {} |",
                result.vector.id,
                result.vector.level,
                status,
                result.duration_ms,
                escape_cell(detail)
            );
        }
        out
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
