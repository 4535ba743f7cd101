//! Assertion helpers for conformance testing.

use acp_conformance::{ConformanceReport, VectorResult, VectorStatus};

use crate::SentMessage;

// ─────────────────────────────────────────────────────────────────────────────
// Result Assertions
// ─────────────────────────────────────────────────────────────────────────────

/// Assert that a vector result has `expected` status.
///
/// # Panics
///
/// Panics if the status differs; the message includes the whole result.
pub fn assert_status(result: &VectorResult, expected: VectorStatus) {
    assert_eq!(
        result.status, expected,
        "vector {} expected {expected} but got: {result:?}",
        result.vector.id
    );
}

/// Assert that a result failed or errored with a message containing `needle`.
///
/// # Panics
///
/// Panics if there is no error message or it does not contain `needle`.
pub fn assert_error_contains(result: &VectorResult, needle: &str) {
    let message = result
        .error
        .as_deref()
        .unwrap_or_else(|| panic!("vector {} has no error message: {result:?}", result.vector.id));
    assert!(
        message.contains(needle),
        "vector {} error '{message}' does not contain '{needle}'",
        result.vector.id
    );
}

/// Assert that a result was skipped with a reason containing `needle`.
///
/// # Panics
///
/// Panics if the result was not skipped or the reason does not match.
pub fn assert_skipped_because(result: &VectorResult, needle: &str) {
    assert_status(result, VectorStatus::Skip);
    let reason = result.skip_reason.as_deref().unwrap_or_default();
    assert!(
        reason.contains(needle),
        "vector {} skip reason '{reason}' does not contain '{needle}'",
        result.vector.id
    );
}

/// Find the result for `id`.
///
/// # Panics
///
/// Panics if no result has that id.
#[must_use]
pub fn result_for<'a>(results: &'a [VectorResult], id: &str) -> &'a VectorResult {
    results
        .iter()
        .find(|result| result.vector.id == id)
        .unwrap_or_else(|| panic!("no result for vector {id}"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Report Assertions
// ─────────────────────────────────────────────────────────────────────────────

/// Assert the overall badge of a report.
///
/// # Panics
///
/// Panics if the overall result differs.
pub fn assert_overall(report: &ConformanceReport, expected: &str) {
    assert_eq!(
        report.overall_result(),
        expected,
        "unexpected overall result; per-vector statuses: {:?}",
        report
            .results()
            .iter()
            .map(|r| (r.vector.id.as_str(), r.status))
            .collect::<Vec<_>>()
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport Assertions
// ─────────────────────────────────────────────────────────────────────────────

/// Assert that the structured messages sent used exactly `expected` methods.
///
/// # Panics
///
/// Panics if the method sequence differs.
pub fn assert_sent_methods(sent: &[SentMessage], expected: &[&str]) {
    let methods: Vec<&str> = sent.iter().filter_map(SentMessage::method).collect();
    assert_eq!(methods, expected, "unexpected messages sent: {sent:?}");
}
