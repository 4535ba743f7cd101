//! Tier evaluation and report assembly over realistic result sets.

use acp_conformance::{
    ConformanceCriteria, ConformanceLevel, ConformanceReport, ConformanceResult, ConformanceRun,
    LevelCriteria, ManifestValidator, RunOptions, SchemaValidator, SkipPolicy,
};
use acp_testkit::fixtures::{manifests, results, vectors};
use acp_testkit::{assert_overall, init_test_tracing};
use serde_json::Value;

use acp_conformance::ConformanceLevel::{Tier1, Tier2, Tier3};

#[test]
fn two_passing_tier1_vectors_make_tier1_conformant() {
    let set = vec![results::pass("A-1", Tier1), results::pass("A-2", Tier1)];
    let criteria = LevelCriteria::evaluate(&set);

    assert_eq!(criteria.tier1.result, ConformanceResult::Conformant);
    assert_eq!(criteria.tier1.total, 2);
    assert_eq!(criteria.tier2.result, ConformanceResult::NonConformant);
    assert_eq!(criteria.tier2.total, 0);
    assert_eq!(criteria.overall_result(), "tier-1 CONFORMANT");
}

#[test]
fn lower_tier_skip_does_not_suppress_conformant_higher_tier() {
    let set = vec![
        results::pass("B-1", Tier1),
        results::skip("B-2", Tier2),
        results::pass("B-3", Tier3),
    ];
    let criteria = LevelCriteria::evaluate(&set);

    assert_eq!(criteria.tier1.result, ConformanceResult::Conformant);
    assert_eq!(criteria.tier2.result, ConformanceResult::Partial);
    assert_eq!(criteria.tier3.result, ConformanceResult::Conformant);
    assert_eq!(criteria.overall_result(), "tier-3 CONFORMANT");
}

#[test]
fn any_number_of_skips_caps_at_partial() {
    for skips in 1..=5 {
        let mut set = vec![results::pass("P-0", Tier2)];
        set.extend((0..skips).map(|i| results::skip(&format!("S-{i}"), Tier2)));
        let criteria = ConformanceCriteria::evaluate(&set, Tier2);
        assert_eq!(criteria.result, ConformanceResult::Partial, "{skips} skips");
        assert_eq!(criteria.skipped, skips);
    }
}

#[test]
fn partial_tier3_outranks_conformant_tier1() {
    let set = vec![
        results::pass("C-1", Tier1),
        results::fail("C-2", Tier2),
        results::pass("C-3", Tier3),
        results::skip("C-4", Tier3),
    ];
    assert_eq!(LevelCriteria::evaluate(&set).overall_result(), "tier-3 PARTIAL");
}

#[test]
fn errors_and_failures_are_both_disqualifying() {
    let set = vec![results::pass("D-1", Tier1), results::error("D-2", Tier1)];
    let criteria = ConformanceCriteria::evaluate(&set, Tier1);
    assert_eq!(criteria.result, ConformanceResult::NonConformant);
    assert_eq!(criteria.errors, 1);

    let all_bad = vec![results::fail("E-1", Tier1), results::error("E-2", Tier3)];
    assert_eq!(LevelCriteria::evaluate(&all_bad).overall_result(), "NON-CONFORMANT");
}

#[test]
fn report_json_carries_tiers_and_manifest_outcome() {
    let validator = SchemaValidator::builtin().expect("schema");
    let outcome = validator.validate(&manifests::full());
    assert!(outcome.valid);

    let report = ConformanceReport::assemble(
        "agent --stdio",
        Some(&outcome),
        vec![results::pass("R-1", Tier1), results::skip("R-2", Tier2)],
    );
    assert_overall(&report, "tier-2 PARTIAL");
    assert_eq!(report.manifest_valid(), Some(true));
    assert_eq!(report.detected_level(), Some(Tier3));

    let json: Value =
        serde_json::from_str(&report.to_json_pretty().expect("serializes")).expect("parses");
    assert_eq!(json["overallResult"], "tier-2 PARTIAL");
    assert_eq!(json["manifestValid"], true);
    assert_eq!(json["criteria"]["tier2"]["result"], "PARTIAL");
    assert_eq!(json["results"][1]["skipReason"], "scenario vector");
}

#[tokio::test]
async fn offline_builtin_catalog_is_partial_everywhere() {
    init_test_tracing();
    let validator = SchemaValidator::builtin().expect("schema");
    let policy = SkipPolicy::new();
    let catalog = acp_conformance::catalog::builtin().expect("catalog");
    let mut run = ConformanceRun::new(&validator, &policy, RunOptions::default());

    run.run(&catalog).await;
    let summary = run.finish("(manifest only)", None).await;

    for level in ConformanceLevel::ALL {
        assert_eq!(
            summary.report.criteria().get(level).result,
            ConformanceResult::Partial,
            "{level}"
        );
    }
    assert_overall(&summary.report, "tier-3 PARTIAL");
    assert_eq!(summary.report.manifest_valid(), None);
    assert!(!summary.log.entries().is_empty());
}

#[tokio::test]
async fn manifest_vectors_alone_yield_conformant_tier() {
    init_test_tracing();
    let validator = SchemaValidator::builtin().expect("schema");
    let policy = SkipPolicy::new();
    let set = vec![
        vectors::manifest("M-1", manifests::minimal(), true),
        vectors::manifest("M-2", manifests::missing_kind(), false),
    ];
    let mut run = ConformanceRun::new(&validator, &policy, RunOptions::default());

    run.run(&set).await;
    let summary = run.finish("(manifest only)", None).await;

    assert_overall(&summary.report, "tier-1 CONFORMANT");
}
