//! Declarative test vectors.
//!
//! A vector is one conformance case: an input (a structured request, raw
//! bytes, or an inline manifest), the outcome the target must produce, and
//! metadata. Vectors are immutable input data; the engine never edits them.
//!
//! On the wire a vector carries up to three optional payload fields
//! (`request`, `rawRequest`, `manifestData`). They are collapsed into one
//! [`VectorPayload`] at load time, and a document that populates more than
//! one of them is rejected.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use acp_core::{OutboundKind, RequestObject};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Conformance tier. Higher tiers require a superset of lower-tier behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConformanceLevel {
    #[serde(rename = "tier-1")]
    Tier1,
    #[serde(rename = "tier-2")]
    Tier2,
    #[serde(rename = "tier-3")]
    Tier3,
}

impl ConformanceLevel {
    /// All tiers, least demanding first.
    pub const ALL: [Self; 3] = [Self::Tier1, Self::Tier2, Self::Tier3];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tier1 => "tier-1",
            Self::Tier2 => "tier-2",
            Self::Tier3 => "tier-3",
        }
    }
}

impl fmt::Display for ConformanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConformanceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tier-1" | "1" => Ok(Self::Tier1),
            "tier-2" | "2" => Ok(Self::Tier2),
            "tier-3" | "3" => Ok(Self::Tier3),
            other => Err(format!("unknown conformance level `{other}`")),
        }
    }
}

/// Outcome contract a vector declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ExpectedOutcome {
    /// A `result` envelope, optionally carrying named fields.
    Success {
        #[serde(
            rename = "requiredFields",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        required_fields: Option<Vec<String>>,
    },
    /// An `error` envelope, optionally with a specific code.
    Error {
        #[serde(rename = "errorCode", default, skip_serializing_if = "Option::is_none")]
        error_code: Option<i64>,
    },
    /// Nothing comes back.
    Notification,
    /// The inline manifest must validate.
    ManifestValid,
    /// The inline manifest must be rejected.
    ManifestInvalid,
}

impl ExpectedOutcome {
    /// Expected error code, when the outcome names one.
    #[must_use]
    pub const fn error_code(&self) -> Option<i64> {
        match self {
            Self::Error { error_code } => *error_code,
            _ => None,
        }
    }

    #[must_use]
    pub const fn kind_str(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Error { .. } => "error",
            Self::Notification => "notification",
            Self::ManifestValid => "manifest-valid",
            Self::ManifestInvalid => "manifest-invalid",
        }
    }
}

/// What a vector sends, decided once at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorPayload {
    /// Structured request with an `id`; one response is awaited.
    Call(RequestObject),
    /// Structured request without an `id`; fire and forget.
    Notification(RequestObject),
    /// Bytes written verbatim, used to probe parse-error handling.
    Raw(String),
    /// Inline manifest judged by the validator; no transport involved.
    Manifest(Value),
    /// Multi-step behavior that cannot be expressed as one exchange.
    Scenario,
}

impl VectorPayload {
    fn from_request(request: RequestObject) -> Self {
        match request.kind() {
            OutboundKind::Call => Self::Call(request),
            OutboundKind::Notification => Self::Notification(request),
        }
    }

    /// Whether executing this payload needs a live transport.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Call(_) | Self::Notification(_) | Self::Raw(_))
    }
}

/// One declarative test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTestVector", into = "RawTestVector")]
pub struct TestVector {
    pub id: String,
    pub level: ConformanceLevel,
    pub title: String,
    pub description: String,
    pub payload: VectorPayload,
    pub expected: ExpectedOutcome,
    pub reference: Option<String>,
}

impl TestVector {
    /// Method of the structured request, if the vector carries one.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match &self.payload {
            VectorPayload::Call(request) | VectorPayload::Notification(request) => {
                request.method()
            }
            _ => None,
        }
    }
}

/// Wire shape of a vector document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTestVector {
    id: String,
    level: ConformanceLevel,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    raw_request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    manifest_data: Option<Value>,
    expected: ExpectedOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
}

impl TryFrom<RawTestVector> for TestVector {
    type Error = VectorError;

    fn try_from(raw: RawTestVector) -> Result<Self, Self::Error> {
        let mut populated = Vec::new();
        if raw.request.is_some() {
            populated.push("request");
        }
        if raw.raw_request.is_some() {
            populated.push("rawRequest");
        }
        if raw.manifest_data.is_some() {
            populated.push("manifestData");
        }
        if populated.len() > 1 {
            return Err(VectorError::ConflictingPayloads {
                id: raw.id,
                fields: populated.join(", "),
            });
        }

        let payload = match (raw.request, raw.raw_request, raw.manifest_data) {
            (Some(request), _, _) => {
                let request = RequestObject::try_from(request)
                    .map_err(|_| VectorError::RequestNotObject { id: raw.id.clone() })?;
                VectorPayload::from_request(request)
            }
            (None, Some(raw_request), _) => VectorPayload::Raw(raw_request),
            (None, None, Some(manifest)) => VectorPayload::Manifest(manifest),
            (None, None, None) => VectorPayload::Scenario,
        };

        Ok(Self {
            id: raw.id,
            level: raw.level,
            title: raw.title,
            description: raw.description,
            payload,
            expected: raw.expected,
            reference: raw.reference,
        })
    }
}

impl From<TestVector> for RawTestVector {
    fn from(vector: TestVector) -> Self {
        let (request, raw_request, manifest_data) = match vector.payload {
            VectorPayload::Call(request) | VectorPayload::Notification(request) => {
                (Some(request.to_value()), None, None)
            }
            VectorPayload::Raw(raw) => (None, Some(raw), None),
            VectorPayload::Manifest(manifest) => (None, None, Some(manifest)),
            VectorPayload::Scenario => (None, None, None),
        };
        Self {
            id: vector.id,
            level: vector.level,
            title: vector.title,
            description: vector.description,
            request,
            raw_request,
            manifest_data,
            expected: vector.expected,
            reference: vector.reference,
        }
    }
}

/// Errors raised while loading vectors.
#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    #[error("vector `{id}` populates more than one payload field ({fields})")]
    ConflictingPayloads { id: String, fields: String },

    #[error("vector `{id}` has a request that is not a JSON object")]
    RequestNotObject { id: String },

    #[error("duplicate vector id `{id}`")]
    DuplicateId { id: String },

    #[error("vector document must be an array or an object with a `vectors` array")]
    UnexpectedDocument,

    #[error("invalid vector JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read vectors from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Parse a vector document: either a bare array or `{ "vectors": [...] }`.
///
/// # Errors
///
/// Returns [`VectorError`] on malformed JSON, conflicting payloads, or
/// duplicate ids.
pub fn parse_vectors(json: &str) -> Result<Vec<TestVector>, VectorError> {
    let document: Value = serde_json::from_str(json)?;
    let list = match document {
        Value::Array(_) => document,
        Value::Object(mut map) => map
            .remove("vectors")
            .filter(Value::is_array)
            .ok_or(VectorError::UnexpectedDocument)?,
        _ => return Err(VectorError::UnexpectedDocument),
    };
    let vectors: Vec<TestVector> = serde_json::from_value(list)?;

    let mut seen = HashSet::new();
    for vector in &vectors {
        if !seen.insert(vector.id.as_str()) {
            return Err(VectorError::DuplicateId {
                id: vector.id.clone(),
            });
        }
    }
    Ok(vectors)
}

/// Load a vector document from disk.
///
/// # Errors
///
/// Returns [`VectorError::Io`] if the file cannot be read, otherwise any
/// error from [`parse_vectors`].
pub fn load_vectors(path: &Path) -> Result<Vec<TestVector>, VectorError> {
    let payload = std::fs::read_to_string(path).map_err(|source| VectorError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_vectors(&payload)
}
