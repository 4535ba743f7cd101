//! Built-in vector catalog, used when no vector file is supplied.

use crate::vector::{ConformanceLevel, TestVector, VectorError, parse_vectors};

const CATALOG_JSON: &str = include_str!("vectors/catalog.json");

/// Parse the embedded catalog.
///
/// # Errors
///
/// Fails only if the embedded document is malformed.
pub fn builtin() -> Result<Vec<TestVector>, VectorError> {
    parse_vectors(CATALOG_JSON)
}

/// Keep vectors at `level` or below, preserving order.
#[must_use]
pub fn up_to(vectors: Vec<TestVector>, level: ConformanceLevel) -> Vec<TestVector> {
    vectors.into_iter().filter(|v| v.level <= level).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::{ExpectedOutcome, VectorPayload};

    #[test]
    fn catalog_parses() {
        let vectors = builtin().expect("embedded catalog parses");
        assert!(vectors.len() >= 20);
    }

    #[test]
    fn catalog_covers_every_tier_and_mode() {
        let vectors = builtin().expect("embedded catalog parses");
        for level in ConformanceLevel::ALL {
            assert!(vectors.iter().any(|v| v.level == level), "no vectors at {level}");
        }
        let has = |pred: fn(&VectorPayload) -> bool| vectors.iter().any(|v| pred(&v.payload));
        assert!(has(|p| matches!(p, VectorPayload::Call(_))));
        assert!(has(|p| matches!(p, VectorPayload::Notification(_))));
        assert!(has(|p| matches!(p, VectorPayload::Raw(_))));
        assert!(has(|p| matches!(p, VectorPayload::Manifest(_))));
        assert!(has(|p| matches!(p, VectorPayload::Scenario)));
    }

    #[test]
    fn manifest_vectors_expect_manifest_outcomes() {
        for vector in builtin().expect("embedded catalog parses") {
            if matches!(vector.payload, VectorPayload::Manifest(_)) {
                assert!(
                    matches!(
                        vector.expected,
                        ExpectedOutcome::ManifestValid | ExpectedOutcome::ManifestInvalid
                    ),
                    "{} pairs a manifest with {}",
                    vector.id,
                    vector.expected.kind_str()
                );
            }
        }
    }

    #[test]
    fn level_filter_keeps_lower_tiers() {
        let filtered = up_to(builtin().expect("catalog"), ConformanceLevel::Tier1);
        assert!(filtered.iter().all(|v| v.level == ConformanceLevel::Tier1));
        assert!(!filtered.is_empty());
    }
}
