//! Protocol types for ACP - line-delimited JSON-RPC 2.0 envelopes.
//!
//! Every message is one UTF-8 JSON object terminated by `\n`. A request
//! carries `{jsonrpc, id, method, params}`; a notification omits `id`; a
//! response carries either `result` or `error`.
//!
//! Requests are kept as raw JSON objects: conformance vectors deliberately
//! send malformed envelopes (wrong version, missing method) and those must
//! reach the target byte-for-byte as written.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The only JSON-RPC version the protocol speaks.
pub const JSONRPC_VERSION: &str = "2.0";

/// Method names defined by the protocol.
pub mod methods {
    /// Opens a session. Must precede every other call.
    pub const INITIALIZE: &str = "initialize";
    /// Closes the session; the target returns to the uninitialized state.
    pub const SHUTDOWN: &str = "shutdown";
    /// Liveness probe.
    pub const PING: &str = "ping";
    /// Reports the agent's current lifecycle state.
    pub const AGENT_STATUS: &str = "agent/status";
    /// Lists tools the agent exposes.
    pub const TOOLS_LIST: &str = "tools/list";
    /// Invokes a tool.
    pub const TOOLS_CALL: &str = "tools/call";
    /// Sent by the host after a successful `initialize`.
    pub const NOTIFICATION_INITIALIZED: &str = "notifications/initialized";
    /// Cancels an in-flight call.
    pub const NOTIFICATION_CANCELLED: &str = "notifications/cancelled";
}

/// JSON-RPC error codes used by the protocol.
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    /// Protocol-specific: a session call arrived before `initialize`.
    pub const NOT_INITIALIZED: i64 = -32002;
}

// ─────────────────────────────────────────────────────────────────────────────
// Identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Request identifier (`id` member).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl RequestId {
    /// Extract an identifier from a JSON value. `null` and non-scalar values
    /// carry no usable identity.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Number),
            Value::String(s) => Some(Self::String(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<RequestId> for Value {
    fn from(id: RequestId) -> Self {
        match id {
            RequestId::Number(n) => Self::from(n),
            RequestId::String(s) => Self::String(s),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outbound messages
// ─────────────────────────────────────────────────────────────────────────────

/// Whether an outbound request expects a correlated response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundKind {
    /// Carries an `id`; exactly one response is mandated.
    Call,
    /// No `id`; nothing comes back.
    Notification,
}

/// A request or notification as a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestObject(Map<String, Value>);

impl RequestObject {
    /// Wrap an existing JSON object.
    #[must_use]
    pub const fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Build a well-formed call.
    #[must_use]
    pub fn call(id: impl Into<RequestId>, method: &str, params: Option<Value>) -> Self {
        let id: RequestId = id.into();
        let mut map = Self::envelope(method, params);
        map.insert("id".to_string(), Value::from(id));
        Self(map)
    }

    /// Build a well-formed notification.
    #[must_use]
    pub fn notification(method: &str, params: Option<Value>) -> Self {
        Self(Self::envelope(method, params))
    }

    fn envelope(method: &str, params: Option<Value>) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            "jsonrpc".to_string(),
            Value::String(JSONRPC_VERSION.to_string()),
        );
        map.insert("method".to_string(), Value::String(method.to_string()));
        if let Some(params) = params {
            map.insert("params".to_string(), params);
        }
        map
    }

    /// Classify by presence of the `id` member (even `"id": null` is a call).
    #[must_use]
    pub fn kind(&self) -> OutboundKind {
        if self.0.contains_key("id") {
            OutboundKind::Call
        } else {
            OutboundKind::Notification
        }
    }

    /// The `method` member, if it is a string.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.0.get("method").and_then(Value::as_str)
    }

    /// The `id` member, if it is a usable identifier.
    #[must_use]
    pub fn id(&self) -> Option<RequestId> {
        self.0.get("id").and_then(RequestId::from_value)
    }

    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl TryFrom<Value> for RequestObject {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inbound messages
// ─────────────────────────────────────────────────────────────────────────────

/// A response envelope read back from the target.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// `{"result": ...}`.
    Result {
        id: Option<RequestId>,
        result: Value,
    },
    /// `{"error": {...}}`. The error member is kept raw so that targets with
    /// non-standard error shapes can still be judged.
    Error { id: Option<RequestId>, error: Value },
    /// Neither `result` nor `error`.
    Unrecognized(Value),
}

impl InboundMessage {
    /// Classify a parsed JSON value. An `error` member wins over `result`.
    #[must_use]
    pub fn classify(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::Unrecognized(value);
        };
        let id = map.get("id").and_then(RequestId::from_value);
        match map.remove("error") {
            Some(error) if !error.is_null() => return Self::Error { id, error },
            Some(error) => {
                map.insert("error".to_string(), error);
            }
            None => {}
        }
        match map.remove("result") {
            Some(result) => Self::Result { id, result },
            None => Self::Unrecognized(Value::Object(map)),
        }
    }

    /// The `error.code` member when this is an error with an integer code.
    #[must_use]
    pub fn error_code(&self) -> Option<i64> {
        match self {
            Self::Error { error, .. } => error.get("code").and_then(Value::as_i64),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Structured JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Build a success response line payload. A missing `id` becomes `null`.
#[must_use]
pub fn success_response(id: Option<Value>, result: Value) -> Value {
    serde_json::json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id.unwrap_or(Value::Null),
        "result": result,
    })
}

/// Build an error response line payload. A missing `id` becomes `null`.
#[must_use]
pub fn error_response(id: Option<Value>, error: &ErrorObject) -> Value {
    serde_json::json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id.unwrap_or(Value::Null),
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_without_id_is_notification() {
        let request = RequestObject::try_from(json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        }))
        .expect("object");
        assert_eq!(request.kind(), OutboundKind::Notification);
        assert_eq!(request.method(), Some("notifications/initialized"));
        assert_eq!(request.id(), None);
    }

    #[test]
    fn null_id_is_still_a_call() {
        let request = RequestObject::try_from(json!({
            "jsonrpc": "2.0",
            "id": null,
            "method": "ping"
        }))
        .expect("object");
        assert_eq!(request.kind(), OutboundKind::Call);
        assert_eq!(request.id(), None);
    }

    #[test]
    fn non_object_request_is_rejected() {
        assert!(RequestObject::try_from(json!([1, 2])).is_err());
    }

    #[test]
    fn call_builder_sets_envelope() {
        let request = RequestObject::call(7, methods::PING, None);
        assert_eq!(
            request.to_value(),
            json!({"jsonrpc": "2.0", "id": 7, "method": "ping"})
        );
    }

    #[test]
    fn classify_error_takes_precedence() {
        let message = InboundMessage::classify(json!({
            "jsonrpc": "2.0",
            "id": "a",
            "result": {},
            "error": {"code": -32601, "message": "nope"}
        }));
        assert!(message.is_error());
        assert_eq!(message.error_code(), Some(-32601));
    }

    #[test]
    fn classify_null_error_falls_back_to_result() {
        let message = InboundMessage::classify(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {"ok": true},
            "error": null
        }));
        assert_eq!(
            message,
            InboundMessage::Result {
                id: Some(RequestId::Number(1)),
                result: json!({"ok": true})
            }
        );
    }

    #[test]
    fn classify_without_result_or_error() {
        let message = InboundMessage::classify(json!({"jsonrpc": "2.0", "id": 1}));
        assert!(matches!(message, InboundMessage::Unrecognized(_)));
        assert_eq!(message.error_code(), None);
    }

    #[test]
    fn error_response_uses_null_id_when_absent() {
        let error = ErrorObject {
            code: error_codes::PARSE_ERROR,
            message: "Parse error".to_string(),
            data: None,
        };
        let response = error_response(None, &error);
        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["error"]["code"], json!(-32700));
    }
}
