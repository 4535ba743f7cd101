//! Transports carry one request at a time to a target and read back its
//! reply.
//!
//! The engine only depends on the [`Transport`] trait. [`ProcessTransport`]
//! is the stdio implementation; tests substitute a scripted one.

mod framing;
mod process;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use acp_core::RequestObject;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use framing::LineFramer;
pub use process::ProcessTransport;

/// Errors a transport reports back to the executor.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to spawn target `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("transport closed: {reason}")]
    Closed { reason: String },

    #[error("transport I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

impl TransportError {
    pub(crate) fn timeout(duration: Duration) -> Self {
        Self::Timeout {
            timeout_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        }
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }
}

/// A request/response channel to a target under test.
///
/// Calls are strictly sequential: at most one is outstanding at a time.
#[async_trait]
pub trait Transport: Send {
    /// Send a call and wait for one response, bounded by `timeout`.
    async fn send(
        &mut self,
        message: &RequestObject,
        timeout: Duration,
    ) -> Result<Value, TransportError>;

    /// Write `raw` verbatim (plus a line terminator) and wait for one
    /// response, bounded by `timeout`.
    async fn send_raw(&mut self, raw: &str, timeout: Duration) -> Result<Value, TransportError>;

    /// Write a notification without waiting for anything.
    ///
    /// Fails with [`TransportError::Closed`] when the transport is no longer
    /// usable; other errors are write failures.
    async fn notify(&mut self, message: &RequestObject) -> Result<(), TransportError>;

    /// Stop the target and release resources. Idempotent.
    async fn close(&mut self);

    fn is_closed(&self) -> bool;
}

/// How to launch a target process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetCommand {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

impl TargetCommand {
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for TargetCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
