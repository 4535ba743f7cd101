//! Vector execution.
//!
//! Each vector is judged in a fixed order: skip policy first, then the
//! payload mode. Live modes need a transport; without one they are skipped
//! rather than failed, so a manifest-only run still yields a report.

use std::time::{Duration, Instant};

use acp_core::InboundMessage;
use serde_json::Value;
use tracing::{info, warn};

use crate::skip::SkipPolicy;
use crate::transport::{Transport, TransportError};
use crate::validator::ManifestValidator;
use crate::verdict::{VectorResult, Verdict};
use crate::vector::{ExpectedOutcome, TestVector, VectorPayload};

/// Skip reason for scenario vectors.
pub const SCENARIO_SKIP_REASON: &str = "scenario vector, requires orchestrated multi-step execution";

/// Skip reason for live vectors when no target is attached.
pub const NO_TRANSPORT_SKIP_REASON: &str = "no transport configured";

/// Runs single vectors against a validator and, optionally, a transport.
pub struct VectorExecutor<'a> {
    validator: &'a dyn ManifestValidator,
    skip_policy: &'a SkipPolicy,
    timeout: Duration,
}

impl<'a> VectorExecutor<'a> {
    #[must_use]
    pub fn new(
        validator: &'a dyn ManifestValidator,
        skip_policy: &'a SkipPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            validator,
            skip_policy,
            timeout,
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute one vector. Never fails: every problem becomes a status.
    pub async fn execute<T>(&self, vector: &TestVector, transport: Option<&mut T>) -> VectorResult
    where
        T: Transport + ?Sized,
    {
        let start = Instant::now();
        let verdict = self.judge(vector, transport).await;
        let result = VectorResult::from_verdict(vector.clone(), verdict, start.elapsed());
        info!(
            vector = %vector.id,
            level = %vector.level,
            status = %result.status,
            duration_ms = result.duration_ms,
            "vector executed"
        );
        result
    }

    /// Execute one vector with no target attached.
    pub async fn execute_offline(&self, vector: &TestVector) -> VectorResult {
        self.execute::<dyn Transport>(vector, None).await
    }

    async fn judge<T>(&self, vector: &TestVector, transport: Option<&mut T>) -> Verdict
    where
        T: Transport + ?Sized,
    {
        if let Some(reason) = self.skip_policy.justification(&vector.id) {
            return Verdict::skip(reason);
        }

        match (&vector.payload, transport) {
            (VectorPayload::Manifest(manifest), _) => self.judge_manifest(vector, manifest),
            (VectorPayload::Scenario, _) => Verdict::skip(SCENARIO_SKIP_REASON),
            (VectorPayload::Raw(_) | VectorPayload::Call(_) | VectorPayload::Notification(_), None) => {
                Verdict::skip(NO_TRANSPORT_SKIP_REASON)
            }
            (VectorPayload::Raw(raw), Some(transport)) => {
                match transport.send_raw(raw, self.timeout).await {
                    Ok(response) => judge_raw_response(&vector.expected, response),
                    Err(err) => Verdict::error(err.to_string()),
                }
            }
            (VectorPayload::Call(request), Some(transport)) => {
                match transport.send(request, self.timeout).await {
                    Ok(response) => judge_response(&vector.expected, response),
                    Err(err) => Verdict::error(err.to_string()),
                }
            }
            (VectorPayload::Notification(request), Some(transport)) => {
                match transport.notify(request).await {
                    Ok(()) => Verdict::pass(None),
                    Err(err @ TransportError::Closed { .. }) => Verdict::error(err.to_string()),
                    Err(err) => {
                        warn!(vector = %vector.id, error = %err, "notification write failed");
                        Verdict::pass(None)
                    }
                }
            }
        }
    }

    fn judge_manifest(&self, vector: &TestVector, manifest: &Value) -> Verdict {
        let outcome = self.validator.validate(manifest);
        let actual = serde_json::to_value(&outcome).ok();
        match (&vector.expected, outcome.valid) {
            (ExpectedOutcome::ManifestValid, true) | (ExpectedOutcome::ManifestInvalid, false) => {
                Verdict::pass(actual)
            }
            (ExpectedOutcome::ManifestValid, false) => {
                let detail = outcome
                    .errors
                    .iter()
                    .map(|issue| format!("{}: {}", display_path(&issue.path), issue.message))
                    .collect::<Vec<_>>()
                    .join("; ");
                Verdict::fail(format!("manifest rejected: {detail}"), actual)
            }
            (ExpectedOutcome::ManifestInvalid, true) => {
                Verdict::fail("manifest accepted but expected to be rejected", actual)
            }
            (other, _) => Verdict::error(format!(
                "manifest vector must expect manifest-valid or manifest-invalid, not {}",
                other.kind_str()
            )),
        }
    }
}

/// Judge a response to a structured call.
#[must_use]
pub fn judge_response(expected: &ExpectedOutcome, response: Value) -> Verdict {
    let raw = response.clone();
    match (expected, InboundMessage::classify(response)) {
        (ExpectedOutcome::Success { required_fields }, InboundMessage::Result { result, .. }) => {
            let missing = required_fields
                .iter()
                .flatten()
                .find(|field| result.get(field.as_str()).is_none());
            match missing {
                Some(field) => Verdict::fail(
                    format!("Missing required field: {field}"),
                    Some(result),
                ),
                None => Verdict::pass(Some(result)),
            }
        }
        (ExpectedOutcome::Success { .. }, InboundMessage::Error { error, .. }) => Verdict::fail(
            format!("Expected success, got error: {}", describe_error(&error)),
            Some(raw),
        ),
        (ExpectedOutcome::Success { .. }, InboundMessage::Unrecognized(_)) => Verdict::fail(
            "Expected success, got a response with neither result nor error",
            Some(raw),
        ),
        (ExpectedOutcome::Error { error_code }, message @ InboundMessage::Error { .. }) => {
            check_error_code(*error_code, &message, raw)
        }
        (ExpectedOutcome::Error { .. }, InboundMessage::Result { .. } | InboundMessage::Unrecognized(_)) => {
            Verdict::fail("Expected error response, got success", Some(raw))
        }
        (
            ExpectedOutcome::Notification
            | ExpectedOutcome::ManifestValid
            | ExpectedOutcome::ManifestInvalid,
            _,
        ) => Verdict::pass(Some(raw)),
    }
}

/// Judge a response to a raw probe. Any error is acceptable unless the
/// vector names a code; anything else fails.
#[must_use]
pub fn judge_raw_response(expected: &ExpectedOutcome, response: Value) -> Verdict {
    let raw = response.clone();
    match InboundMessage::classify(response) {
        message @ InboundMessage::Error { .. } => {
            check_error_code(expected.error_code(), &message, raw)
        }
        _ => Verdict::fail("Expected error response to malformed input", Some(raw)),
    }
}

fn check_error_code(expected: Option<i64>, message: &InboundMessage, raw: Value) -> Verdict {
    let actual = message.error_code();
    let error = match message {
        InboundMessage::Error { error, .. } => Some(error.clone()),
        _ => None,
    };
    match expected {
        Some(code) if actual != Some(code) => Verdict::fail(
            format!(
                "Expected error code {code}, got {}",
                actual.map_or_else(|| "none".to_string(), |c| c.to_string())
            ),
            Some(raw),
        ),
        _ => Verdict::pass(error),
    }
}

fn describe_error(error: &Value) -> String {
    match (
        error.get("code").and_then(Value::as_i64),
        error.get("message").and_then(Value::as_str),
    ) {
        (Some(code), Some(message)) => format!("{code} {message}"),
        (Some(code), None) => code.to_string(),
        (None, Some(message)) => message.to_string(),
        (None, None) => error.to_string(),
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "/" } else { path }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::VectorStatus;
    use serde_json::json;

    #[test]
    fn required_field_missing_fails() {
        let expected = ExpectedOutcome::Success {
            required_fields: Some(vec!["protocolVersion".into(), "agentInfo".into()]),
        };
        let verdict = judge_response(
            &expected,
            json!({"jsonrpc": "2.0", "id": 1, "result": {"protocolVersion": "1"}}),
        );
        assert_eq!(verdict.status(), VectorStatus::Fail);
        assert!(matches!(verdict, Verdict::Fail { ref message, .. } if message.contains("agentInfo")));
    }

    #[test]
    fn success_reports_result_as_actual() {
        let verdict = judge_response(
            &ExpectedOutcome::Success {
                required_fields: None,
            },
            json!({"jsonrpc": "2.0", "id": 1, "result": {"pong": true}}),
        );
        assert_eq!(verdict, Verdict::pass(Some(json!({"pong": true}))));
    }

    #[test]
    fn error_code_mismatch_fails() {
        let verdict = judge_response(
            &ExpectedOutcome::Error {
                error_code: Some(-32601),
            },
            json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32600, "message": "bad"}}),
        );
        assert!(
            matches!(verdict, Verdict::Fail { ref message, .. } if message == "Expected error code -32601, got -32600")
        );
    }

    #[test]
    fn error_without_code_expectation_passes_with_error_object() {
        let verdict = judge_response(
            &ExpectedOutcome::Error { error_code: None },
            json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -1, "message": "x"}}),
        );
        assert_eq!(verdict, Verdict::pass(Some(json!({"code": -1, "message": "x"}))));
    }

    #[test]
    fn unrecognized_response_fails_success_expectation() {
        let verdict = judge_response(
            &ExpectedOutcome::Success {
                required_fields: None,
            },
            json!({"jsonrpc": "2.0", "id": 1}),
        );
        assert_eq!(verdict.status(), VectorStatus::Fail);
    }

    #[test]
    fn other_kinds_are_permissive() {
        let verdict = judge_response(
            &ExpectedOutcome::Notification,
            json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -1}}),
        );
        assert_eq!(verdict.status(), VectorStatus::Pass);
    }

    #[test]
    fn raw_probe_requires_an_error() {
        let expected = ExpectedOutcome::Error {
            error_code: Some(-32700),
        };
        let ok = judge_raw_response(
            &expected,
            json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": "Parse error"}}),
        );
        assert_eq!(ok.status(), VectorStatus::Pass);

        let wrong = judge_raw_response(&expected, json!({"jsonrpc": "2.0", "id": null, "result": {}}));
        assert_eq!(wrong.status(), VectorStatus::Fail);
    }
}
