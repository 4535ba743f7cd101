//! ACP conformance tooling: vector execution, session bootstrap, and tiered
//! evaluation.
//!
//! This crate provides:
//! - **Vectors**: declarative test cases loaded from JSON, plus a built-in
//!   catalog spanning all three tiers
//! - **Transport**: a stdio channel to a target process with line framing
//!   and per-call timeouts
//! - **Execution**: per-vector verdicts, with the session opened on demand
//!   before stateful calls
//! - **Evaluation**: per-tier criteria and an overall badge, rendered as
//!   JSON or markdown
//!
//! # Tiers
//!
//! Tiers are judged independently. A tier is `CONFORMANT` when every vector
//! passed, `PARTIAL` when the only shortfall is skipped vectors, and
//! `NON-CONFORMANT` otherwise (including when it has no vectors at all).
//! The overall result names the highest tier that is at least partial.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod config;
pub mod evaluator;
pub mod executor;
pub mod logging;
pub mod report;
pub mod runner;
pub mod session;
pub mod skip;
pub mod transport;
pub mod validator;
pub mod vector;
pub mod verdict;

pub use config::{ConfigError, RunConfig};
pub use evaluator::{ConformanceCriteria, ConformanceResult, LevelCriteria};
pub use executor::VectorExecutor;
pub use logging::{RunLogEntry, RunLogger};
pub use report::ConformanceReport;
pub use runner::{ConformanceRun, RunOptions, RunSummary};
pub use session::SessionLifecycle;
pub use skip::{SkipPolicy, SkipPolicyError};
pub use transport::{ProcessTransport, TargetCommand, Transport, TransportError};
pub use validator::{
    ManifestValidator, SchemaValidator, ValidationIssue, ValidationOutcome, ValidatorError,
};
pub use vector::{
    ConformanceLevel, ExpectedOutcome, TestVector, VectorError, VectorPayload, load_vectors,
    parse_vectors,
};
pub use verdict::{VectorResult, VectorStatus, Verdict};
