//! ACP Test Kit - fixtures and scripted transports for conformance tests
//!
//! This crate provides testing utilities for the conformance engine:
//!
//! - [`ScriptedTransport`] - An in-memory transport that replays queued
//!   replies and records everything sent to it
//! - Vector and response fixtures
//! - Assertion helpers for vector results
//! - Tracing configuration for test output
//!
//! # Example
//!
//! ```rust,ignore
//! use acp_testkit::{ScriptedTransport, assert_status, fixtures};
//! use acp_conformance::VectorStatus;
//!
//! #[tokio::test]
//! async fn ping_passes() {
//!     acp_testkit::init_test_tracing();
//!
//!     let mut transport = ScriptedTransport::new();
//!     transport.push_response(fixtures::responses::success(1, serde_json::json!({})));
//!
//!     let vector = fixtures::vectors::call_success("T-1", "ping", None);
//!     let result = executor.execute(&vector, Some(&mut transport)).await;
//!     assert_status(&result, VectorStatus::Pass);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod assertions;
pub mod fixtures;
mod mock_transport;
mod tracing_config;

pub use assertions::*;
pub use mock_transport::*;
pub use tracing_config::*;

// Re-export core types for convenience
pub use acp_conformance::{TestVector, VectorResult, VectorStatus};
pub use acp_core::{ErrorObject, RequestObject, error_codes};
