//! Per-vector outcomes.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::vector::TestVector;

/// Status of one executed vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorStatus {
    /// Outcome matched the expectation.
    Pass,
    /// Target answered, but not as expected.
    Fail,
    /// Not executed (skip policy, no transport, or a scenario vector).
    Skip,
    /// The harness could not produce a verdict (transport failure, timeout).
    Error,
}

impl VectorStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Skip => "skip",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for VectorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A judgement before timing and vector metadata are attached.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Pass { actual: Option<Value> },
    Fail { message: String, actual: Option<Value> },
    Skip { reason: String },
    Error { message: String },
}

impl Verdict {
    #[must_use]
    pub const fn pass(actual: Option<Value>) -> Self {
        Self::Pass { actual }
    }

    #[must_use]
    pub fn fail(message: impl Into<String>, actual: Option<Value>) -> Self {
        Self::Fail {
            message: message.into(),
            actual,
        }
    }

    #[must_use]
    pub fn skip(reason: impl Into<String>) -> Self {
        Self::Skip {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn status(&self) -> VectorStatus {
        match self {
            Self::Pass { .. } => VectorStatus::Pass,
            Self::Fail { .. } => VectorStatus::Fail,
            Self::Skip { .. } => VectorStatus::Skip,
            Self::Error { .. } => VectorStatus::Error,
        }
    }
}

/// Outcome of one vector, including the vector it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorResult {
    pub vector: TestVector,
    pub status: VectorStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    pub duration_ms: u64,
}

impl VectorResult {
    #[must_use]
    pub fn pass(vector: TestVector, actual: Option<Value>, duration: Duration) -> Self {
        Self::from_verdict(vector, Verdict::pass(actual), duration)
    }

    #[must_use]
    pub fn fail(
        vector: TestVector,
        message: impl Into<String>,
        actual: Option<Value>,
        duration: Duration,
    ) -> Self {
        Self::from_verdict(vector, Verdict::fail(message, actual), duration)
    }

    #[must_use]
    pub fn skip(vector: TestVector, reason: impl Into<String>, duration: Duration) -> Self {
        Self::from_verdict(vector, Verdict::skip(reason), duration)
    }

    #[must_use]
    pub fn error(vector: TestVector, message: impl Into<String>, duration: Duration) -> Self {
        Self::from_verdict(vector, Verdict::error(message), duration)
    }

    /// Attach a verdict to its vector.
    #[must_use]
    pub fn from_verdict(vector: TestVector, verdict: Verdict, duration: Duration) -> Self {
        let status = verdict.status();
        let (actual, error, skip_reason) = match verdict {
            Verdict::Pass { actual } => (actual, None, None),
            Verdict::Fail { message, actual } => (actual, Some(message), None),
            Verdict::Skip { reason } => (None, None, Some(reason)),
            Verdict::Error { message } => (None, Some(message), None),
        };
        Self {
            vector,
            status,
            actual,
            error,
            skip_reason,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        }
    }
}
