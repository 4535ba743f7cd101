//! Skip policy: vectors excluded from a run, each with a justification.
//!
//! Policy files are flat maps from vector id to reason. JSON and TOML are
//! both accepted, chosen by file extension:
//!
//! ```toml
//! "ACP-T3-002" = "target does not implement heartbeats yet"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vector::TestVector;

/// Mapping from vector id to the reason it is skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkipPolicy(BTreeMap<String, String>);

/// Errors raised while loading a skip policy.
#[derive(Debug, Error)]
pub enum SkipPolicyError {
    #[error("failed to read skip policy {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid skip policy JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid skip policy TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("skip policy entry `{id}` has an empty justification")]
    EmptyJustification { id: String },
}

impl SkipPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, id: impl Into<String>, reason: impl Into<String>) {
        self.0.insert(id.into(), reason.into());
    }

    /// Justification for skipping `id`, if it is listed.
    #[must_use]
    pub fn justification(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(id, reason)| (id.as_str(), reason.as_str()))
    }

    /// Entries that name no vector in `vectors` (usually a stale policy).
    #[must_use]
    pub fn unknown_ids<'a>(&'a self, vectors: &[TestVector]) -> Vec<&'a str> {
        self.0
            .keys()
            .filter(|id| !vectors.iter().any(|vector| &vector.id == *id))
            .map(String::as_str)
            .collect()
    }

    /// Parse a JSON policy.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON or an empty justification.
    pub fn from_json_str(json: &str) -> Result<Self, SkipPolicyError> {
        Self::checked(serde_json::from_str(json)?)
    }

    /// Parse a TOML policy.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed TOML or an empty justification.
    pub fn from_toml_str(toml: &str) -> Result<Self, SkipPolicyError> {
        Self::checked(toml::from_str(toml)?)
    }

    /// Load a policy file; `.toml` files are parsed as TOML, anything else
    /// as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SkipPolicyError> {
        let payload = std::fs::read_to_string(path).map_err(|source| SkipPolicyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if path.extension().is_some_and(|ext| ext == "toml") {
            Self::from_toml_str(&payload)
        } else {
            Self::from_json_str(&payload)
        }
    }

    fn checked(entries: BTreeMap<String, String>) -> Result<Self, SkipPolicyError> {
        if let Some((id, _)) = entries.iter().find(|(_, reason)| reason.trim().is_empty()) {
            return Err(SkipPolicyError::EmptyJustification { id: id.clone() });
        }
        Ok(Self(entries))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SkipPolicy {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(id, reason)| (id.into(), reason.into()))
                .collect(),
        )
    }
}
