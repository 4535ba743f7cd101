//! Test fixtures for conformance types.
//!
//! Provides pre-built vectors, manifests, and wire responses.

// ─────────────────────────────────────────────────────────────────────────────
// Vector Fixtures
// ─────────────────────────────────────────────────────────────────────────────

/// Vector builders. Ids and titles are free-form; levels default to tier 1
/// unless the builder takes one.
pub mod vectors {
    use acp_conformance::{ConformanceLevel, ExpectedOutcome, TestVector, VectorPayload};
    use acp_core::RequestObject;
    use serde_json::Value;

    /// A vector with an arbitrary payload and outcome.
    #[must_use]
    pub fn vector(
        id: &str,
        level: ConformanceLevel,
        payload: VectorPayload,
        expected: ExpectedOutcome,
    ) -> TestVector {
        TestVector {
            id: id.to_string(),
            level,
            title: format!("{id} fixture"),
            description: String::new(),
            payload,
            expected,
            reference: None,
        }
    }

    /// A call with id `1` expecting success.
    #[must_use]
    pub fn call_success(id: &str, method: &str, required_fields: Option<&[&str]>) -> TestVector {
        vector(
            id,
            ConformanceLevel::Tier1,
            VectorPayload::Call(RequestObject::call(1, method, None)),
            ExpectedOutcome::Success {
                required_fields: required_fields
                    .map(|fields| fields.iter().map(|f| (*f).to_string()).collect()),
            },
        )
    }

    /// A call with id `1` expecting an error envelope.
    #[must_use]
    pub fn call_error(id: &str, method: &str, error_code: Option<i64>) -> TestVector {
        vector(
            id,
            ConformanceLevel::Tier1,
            VectorPayload::Call(RequestObject::call(1, method, None)),
            ExpectedOutcome::Error { error_code },
        )
    }

    /// A call carrying `params`, expecting `expected`.
    #[must_use]
    pub fn call_with_params(
        id: &str,
        method: &str,
        params: Value,
        expected: ExpectedOutcome,
    ) -> TestVector {
        vector(
            id,
            ConformanceLevel::Tier1,
            VectorPayload::Call(RequestObject::call(1, method, Some(params))),
            expected,
        )
    }

    #[must_use]
    pub fn notification(id: &str, method: &str) -> TestVector {
        vector(
            id,
            ConformanceLevel::Tier1,
            VectorPayload::Notification(RequestObject::notification(method, None)),
            ExpectedOutcome::Notification,
        )
    }

    #[must_use]
    pub fn raw(id: &str, raw: &str, error_code: Option<i64>) -> TestVector {
        vector(
            id,
            ConformanceLevel::Tier1,
            VectorPayload::Raw(raw.to_string()),
            ExpectedOutcome::Error { error_code },
        )
    }

    #[must_use]
    pub fn manifest(id: &str, manifest: Value, valid: bool) -> TestVector {
        vector(
            id,
            ConformanceLevel::Tier1,
            VectorPayload::Manifest(manifest),
            if valid {
                ExpectedOutcome::ManifestValid
            } else {
                ExpectedOutcome::ManifestInvalid
            },
        )
    }

    #[must_use]
    pub fn scenario(id: &str, level: ConformanceLevel) -> TestVector {
        vector(
            id,
            level,
            VectorPayload::Scenario,
            ExpectedOutcome::Success {
                required_fields: None,
            },
        )
    }

    /// Return `vector` moved to `level`.
    #[must_use]
    pub fn at_level(mut vector: TestVector, level: ConformanceLevel) -> TestVector {
        vector.level = level;
        vector
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Manifest Fixtures
// ─────────────────────────────────────────────────────────────────────────────

/// Agent manifests.
pub mod manifests {
    use serde_json::{Value, json};

    /// Smallest manifest the embedded schema accepts.
    #[must_use]
    pub fn minimal() -> Value {
        json!({
            "apiVersion": "acp/v1",
            "kind": "Agent",
            "metadata": { "name": "fixture-agent", "version": "1.0.0" }
        })
    }

    /// Manifest declaring tools, which claims tier 2.
    #[must_use]
    pub fn with_tools() -> Value {
        let mut manifest = minimal();
        manifest["tools"] = json!([{ "name": "echo", "description": "echo text" }]);
        manifest
    }

    /// Manifest declaring lifecycle and policies, which claims tier 3.
    #[must_use]
    pub fn full() -> Value {
        let mut manifest = with_tools();
        manifest["lifecycle"] = json!({ "shutdownTimeoutMs": 1000, "restartPolicy": "on-failure" });
        manifest["policies"] = json!({ "maxConcurrentCalls": 4, "allowedTools": ["echo"] });
        manifest
    }

    /// Manifest missing its required `kind`.
    #[must_use]
    pub fn missing_kind() -> Value {
        json!({
            "apiVersion": "acp/v1",
            "metadata": { "name": "fixture-agent", "version": "1.0.0" }
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Response Fixtures
// ─────────────────────────────────────────────────────────────────────────────

/// JSON-RPC response envelopes.
pub mod responses {
    use serde_json::{Value, json};

    #[must_use]
    pub fn success(id: impl Into<Value>, result: Value) -> Value {
        json!({ "jsonrpc": "2.0", "id": id.into(), "result": result })
    }

    #[must_use]
    pub fn error(id: impl Into<Value>, code: i64, message: &str) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": id.into(),
            "error": { "code": code, "message": message }
        })
    }

    /// An envelope with neither `result` nor `error`.
    #[must_use]
    pub fn empty(id: impl Into<Value>) -> Value {
        json!({ "jsonrpc": "2.0", "id": id.into() })
    }

    /// Successful reply to a bootstrap `initialize`.
    #[must_use]
    pub fn initialized(id: impl Into<Value>) -> Value {
        success(
            id,
            json!({
                "protocolVersion": "2025-06",
                "agentInfo": { "name": "scripted", "version": "0.0.0" },
                "capabilities": {}
            }),
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Result Fixtures
// ─────────────────────────────────────────────────────────────────────────────

/// Pre-judged results, for evaluator and report tests.
pub mod results {
    use std::time::Duration;

    use acp_conformance::{ConformanceLevel, VectorResult};

    use super::vectors;

    #[must_use]
    pub fn pass(id: &str, level: ConformanceLevel) -> VectorResult {
        VectorResult::pass(
            vectors::at_level(vectors::call_success(id, "ping", None), level),
            None,
            Duration::from_millis(1),
        )
    }

    #[must_use]
    pub fn fail(id: &str, level: ConformanceLevel) -> VectorResult {
        VectorResult::fail(
            vectors::at_level(vectors::call_success(id, "ping", None), level),
            "Expected success, got error: -32601 nope",
            None,
            Duration::from_millis(1),
        )
    }

    #[must_use]
    pub fn skip(id: &str, level: ConformanceLevel) -> VectorResult {
        VectorResult::skip(
            vectors::scenario(id, level),
            "scenario vector",
            Duration::ZERO,
        )
    }

    #[must_use]
    pub fn error(id: &str, level: ConformanceLevel) -> VectorResult {
        VectorResult::error(
            vectors::at_level(vectors::call_success(id, "ping", None), level),
            "Timeout after 5000ms",
            Duration::from_millis(5000),
        )
    }
}
