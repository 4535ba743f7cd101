//! Agent manifest validation.
//!
//! The executor only sees the [`ManifestValidator`] seam. The shipped
//! implementation checks manifests against an embedded JSON Schema
//! (draft 2020-12), then derives the conformance tier the manifest claims
//! from the primitives it declares.

use std::collections::BTreeSet;

use jsonschema::Validator;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::vector::ConformanceLevel;

/// Embedded agent manifest schema.
pub const AGENT_MANIFEST_SCHEMA: &str = include_str!("schemas/agent_manifest.schema.json");

/// Top-level manifest sections that count as protocol primitives.
pub const PRIMITIVES: [&str; 6] = [
    "capabilities",
    "tools",
    "resources",
    "prompts",
    "lifecycle",
    "policies",
];

/// Judges manifest documents.
pub trait ManifestValidator: Send + Sync {
    fn validate(&self, manifest: &Value) -> ValidationOutcome;
}

/// One schema violation or advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// JSON pointer into the manifest; empty for the document root.
    pub path: String,
    pub message: String,
}

/// Verdict on one manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conformance_level: Option<ConformanceLevel>,
    #[serde(default)]
    pub errors: Vec<ValidationIssue>,
    #[serde(default)]
    pub warnings: Vec<ValidationIssue>,
    #[serde(default)]
    pub primitives_seen: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("invalid manifest schema: {message}")]
    InvalidSchema { message: String },

    #[error("manifest schema is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON Schema backed validator.
pub struct SchemaValidator {
    schema: Validator,
    known_sections: BTreeSet<String>,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("known_sections", &self.known_sections)
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Validator over the embedded agent manifest schema.
    ///
    /// # Errors
    ///
    /// Fails only if the embedded schema does not compile.
    pub fn builtin() -> Result<Self, ValidatorError> {
        Self::from_schema_str(AGENT_MANIFEST_SCHEMA)
    }

    /// # Errors
    ///
    /// Returns an error if `schema` is not JSON or not a valid JSON Schema.
    pub fn from_schema_str(schema: &str) -> Result<Self, ValidatorError> {
        let schema: Value = serde_json::from_str(schema)?;
        Self::from_schema(&schema)
    }

    /// # Errors
    ///
    /// Returns an error if `schema` is not a valid JSON Schema.
    pub fn from_schema(schema: &Value) -> Result<Self, ValidatorError> {
        let validator = Validator::new(schema).map_err(|err| ValidatorError::InvalidSchema {
            message: err.to_string(),
        })?;
        let known_sections = schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default();
        Ok(Self {
            schema: validator,
            known_sections,
        })
    }
}

impl ManifestValidator for SchemaValidator {
    fn validate(&self, manifest: &Value) -> ValidationOutcome {
        let errors: Vec<ValidationIssue> = self
            .schema
            .iter_errors(manifest)
            .map(|error| ValidationIssue {
                path: error.instance_path.to_string(),
                message: error.to_string(),
            })
            .collect();

        let Some(sections) = manifest.as_object() else {
            return ValidationOutcome {
                valid: false,
                errors,
                ..ValidationOutcome::default()
            };
        };

        let warnings = if self.known_sections.is_empty() {
            Vec::new()
        } else {
            sections
                .keys()
                .filter(|key| !self.known_sections.contains(*key))
                .map(|key| ValidationIssue {
                    path: format!("/{key}"),
                    message: format!("unknown top-level section `{key}`"),
                })
                .collect()
        };

        let primitives_seen: Vec<String> = PRIMITIVES
            .iter()
            .filter(|name| sections.contains_key(**name))
            .map(|name| (*name).to_string())
            .collect();

        let valid = errors.is_empty();
        ValidationOutcome {
            valid,
            conformance_level: valid.then(|| claimed_level(&primitives_seen)),
            errors,
            warnings,
            primitives_seen,
        }
    }
}

/// Tier a manifest claims from the primitives it declares: lifecycle and
/// policies together mean tier-3, any interaction primitive means tier-2.
#[must_use]
pub fn claimed_level(primitives: &[String]) -> ConformanceLevel {
    let has = |name: &str| primitives.iter().any(|p| p == name);
    if has("lifecycle") && has("policies") {
        ConformanceLevel::Tier3
    } else if ["capabilities", "tools", "resources", "prompts"]
        .iter()
        .any(|name| has(name))
    {
        ConformanceLevel::Tier2
    } else {
        ConformanceLevel::Tier1
    }
}
