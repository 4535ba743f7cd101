//! Run loop.
//!
//! A [`ConformanceRun`] owns everything that lives for exactly one run:
//! the transport, the session view, the results so far and the run log.
//! Vectors execute strictly in order, one at a time.

use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};

use crate::executor::VectorExecutor;
use crate::logging::RunLogger;
use crate::report::ConformanceReport;
use crate::session::{SessionLifecycle, default_bootstrap_params};
use crate::skip::SkipPolicy;
use crate::transport::Transport;
use crate::validator::{ManifestValidator, ValidationOutcome};
use crate::verdict::VectorResult;
use crate::vector::TestVector;

/// Per-run settings.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub timeout: Duration,
    pub bootstrap_params: Value,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(crate::config::DEFAULT_TIMEOUT_MS),
            bootstrap_params: default_bootstrap_params(),
        }
    }
}

/// What a finished run hands back.
#[derive(Debug)]
pub struct RunSummary {
    pub report: ConformanceReport,
    pub log: RunLogger,
}

/// Run-scoped execution context.
pub struct ConformanceRun<'a> {
    validator: &'a dyn ManifestValidator,
    skip_policy: &'a SkipPolicy,
    timeout: Duration,
    transport: Option<Box<dyn Transport + 'a>>,
    session: SessionLifecycle,
    results: Vec<VectorResult>,
    log: RunLogger,
}

impl<'a> ConformanceRun<'a> {
    #[must_use]
    pub fn new(
        validator: &'a dyn ManifestValidator,
        skip_policy: &'a SkipPolicy,
        options: RunOptions,
    ) -> Self {
        Self {
            validator,
            skip_policy,
            timeout: options.timeout,
            transport: None,
            session: SessionLifecycle::new(options.bootstrap_params),
            results: Vec::new(),
            log: RunLogger::new(),
        }
    }

    /// Attach the target. Without one, live vectors are skipped.
    #[must_use]
    pub fn with_transport(mut self, transport: Box<dyn Transport + 'a>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn with_logger(mut self, log: RunLogger) -> Self {
        self.log = log;
        self
    }

    #[must_use]
    pub const fn session(&self) -> &SessionLifecycle {
        &self.session
    }

    #[must_use]
    pub fn results(&self) -> &[VectorResult] {
        &self.results
    }

    /// Execute one vector, bootstrapping the session first when needed.
    pub async fn run_vector(&mut self, vector: &TestVector) -> &VectorResult {
        let executor = VectorExecutor::new(self.validator, self.skip_policy, self.timeout);
        let skipped = self.skip_policy.justification(&vector.id).is_some();

        let result = match self.transport.as_deref_mut() {
            Some(transport) => {
                if !skipped {
                    self.session.prepare(vector, transport, self.timeout).await;
                }
                let result = executor.execute(vector, Some(transport)).await;
                self.session.observe(&result);
                result
            }
            None => executor.execute_offline(vector).await,
        };

        self.log.record_vector(&result);
        let index = self.results.len();
        self.results.push(result);
        &self.results[index]
    }

    /// Execute `vectors` in order and return every result so far.
    pub async fn run(&mut self, vectors: &[TestVector]) -> &[VectorResult] {
        info!(vectors = vectors.len(), live = self.transport.is_some(), "starting conformance run");
        for vector in vectors {
            self.run_vector(vector).await;
        }
        &self.results
    }

    /// Close the transport and freeze the results into a report.
    pub async fn finish(
        mut self,
        target: impl Into<String>,
        manifest: Option<&ValidationOutcome>,
    ) -> RunSummary {
        if let Some(transport) = self.transport.as_deref_mut() {
            transport.close().await;
        }
        let report = ConformanceReport::assemble(target, manifest, self.results);
        self.log.record_summary(&report);
        if report.is_non_conformant() {
            warn!(overall = report.overall_result(), "run finished");
        } else {
            info!(overall = report.overall_result(), "run finished");
        }
        RunSummary {
            report,
            log: self.log,
        }
    }
}
