//! Full runs of the built-in catalog against the bundled test agent.

use std::time::Duration;

use acp_conformance::{
    ConformanceLevel, ConformanceResult, ConformanceRun, ManifestValidator, ProcessTransport,
    RunOptions, SchemaValidator, SkipPolicy, TargetCommand, VectorStatus, catalog,
};
use acp_testkit::fixtures::manifests;
use acp_testkit::{assert_overall, assert_status, init_test_tracing, result_for};

fn test_agent() -> TargetCommand {
    TargetCommand::new(env!("CARGO_BIN_EXE_acp-test-agent"))
}

fn options() -> RunOptions {
    RunOptions {
        timeout: Duration::from_secs(5),
        ..RunOptions::default()
    }
}

#[tokio::test]
async fn builtin_catalog_against_test_agent() {
    init_test_tracing();
    let validator = SchemaValidator::builtin().expect("schema");
    let policy = SkipPolicy::new();
    let vectors = catalog::builtin().expect("catalog");
    let transport = ProcessTransport::spawn(&test_agent())
        .await
        .expect("spawn test agent");
    let manifest = validator.validate(&manifests::full());

    let mut run = ConformanceRun::new(&validator, &policy, options())
        .with_transport(Box::new(transport));
    run.run(&vectors).await;
    let summary = run.finish("acp-test-agent", Some(&manifest)).await;
    let report = &summary.report;

    let criteria = report.criteria();
    assert_eq!(criteria.get(ConformanceLevel::Tier1).result, ConformanceResult::Conformant);
    assert_eq!(criteria.get(ConformanceLevel::Tier2).result, ConformanceResult::Conformant);
    assert_eq!(criteria.get(ConformanceLevel::Tier3).result, ConformanceResult::Partial);
    assert_eq!(criteria.get(ConformanceLevel::Tier3).skipped, 2);
    assert_overall(report, "tier-3 PARTIAL");

    assert_status(result_for(report.results(), "ACP-T1-004"), VectorStatus::Pass);
    assert_status(result_for(report.results(), "ACP-T3-002"), VectorStatus::Pass);
    assert_status(result_for(report.results(), "ACP-T3-007"), VectorStatus::Skip);
    assert_eq!(report.results().len(), vectors.len());
    assert_eq!(report.detected_level(), Some(ConformanceLevel::Tier3));
}

#[tokio::test]
async fn stateful_vector_first_triggers_bootstrap() {
    init_test_tracing();
    let validator = SchemaValidator::builtin().expect("schema");
    let policy = SkipPolicy::new();
    let vectors: Vec<_> = catalog::builtin()
        .expect("catalog")
        .into_iter()
        .filter(|v| v.id == "ACP-T2-001" || v.id == "ACP-T2-002")
        .collect();
    let transport = ProcessTransport::spawn(&test_agent())
        .await
        .expect("spawn test agent");

    let mut run = ConformanceRun::new(&validator, &policy, options())
        .with_transport(Box::new(transport));
    run.run(&vectors).await;

    assert_eq!(run.session().bootstrap_count(), 1);
    assert!(run.results().iter().all(|r| r.status == VectorStatus::Pass));
    run.finish("acp-test-agent", None).await;
}

#[tokio::test]
async fn slow_agent_times_out_every_call_without_aborting_the_run() {
    init_test_tracing();
    let validator = SchemaValidator::builtin().expect("schema");
    let policy = SkipPolicy::new();
    let vectors = catalog::up_to(catalog::builtin().expect("catalog"), ConformanceLevel::Tier1);
    let transport = ProcessTransport::spawn(&test_agent().env("ACP_TEST_AGENT_DELAY_MS", "400"))
        .await
        .expect("spawn test agent");

    let mut run = ConformanceRun::new(
        &validator,
        &policy,
        RunOptions {
            timeout: Duration::from_millis(50),
            ..RunOptions::default()
        },
    )
    .with_transport(Box::new(transport));
    run.run(&vectors).await;
    let summary = run.finish("slow agent", None).await;

    let initialize = result_for(summary.report.results(), "ACP-T1-001");
    assert_status(initialize, VectorStatus::Error);
    assert_eq!(initialize.error.as_deref(), Some("Timeout after 50ms"));
    // Manifest vectors never touch the transport.
    assert_status(result_for(summary.report.results(), "ACP-T1-007"), VectorStatus::Pass);
    assert_eq!(summary.report.results().len(), vectors.len());
    assert_overall(&summary.report, "NON-CONFORMANT");
}

#[tokio::test]
async fn skip_policy_turns_failures_into_partial() {
    init_test_tracing();
    let validator = SchemaValidator::builtin().expect("schema");
    let mut policy = SkipPolicy::new();
    policy.insert("ACP-T1-003", "agent answers unknown methods with a custom code");
    let vectors = catalog::up_to(catalog::builtin().expect("catalog"), ConformanceLevel::Tier1);
    let transport = ProcessTransport::spawn(&test_agent())
        .await
        .expect("spawn test agent");

    let mut run = ConformanceRun::new(&validator, &policy, options())
        .with_transport(Box::new(transport));
    run.run(&vectors).await;
    let summary = run.finish("acp-test-agent", None).await;

    assert_overall(&summary.report, "tier-1 PARTIAL");
    let skipped = result_for(summary.report.results(), "ACP-T1-003");
    assert_eq!(
        skipped.skip_reason.as_deref(),
        Some("agent answers unknown methods with a custom code")
    );
}
