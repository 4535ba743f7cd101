//! Session lifecycle tracking across a run.
//!
//! Targets refuse session calls until `initialize` succeeds. Before a vector
//! that needs an open session, the tracker sends a bootstrap `initialize`
//! on the vector's behalf; it then follows `initialize` and `shutdown`
//! vectors to keep its view of the target accurate.

use std::time::Duration;

use acp_core::{InboundMessage, RequestObject, methods};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::transport::Transport;
use crate::verdict::{VectorResult, VectorStatus};
use crate::vector::TestVector;

/// Default `initialize` params used for bootstrap calls.
#[must_use]
pub fn default_bootstrap_params() -> Value {
    json!({
        "manifest": {
            "apiVersion": "acp/v1",
            "kind": "Agent",
            "metadata": {
                "name": "conformance-bootstrap",
                "version": "0.0.0"
            }
        }
    })
}

/// Run-scoped view of whether the target's session is open.
#[derive(Debug, Clone)]
pub struct SessionLifecycle {
    initialized: bool,
    bootstrap_params: Value,
    bootstraps: u64,
}

impl Default for SessionLifecycle {
    fn default() -> Self {
        Self::new(default_bootstrap_params())
    }
}

impl SessionLifecycle {
    #[must_use]
    pub const fn new(bootstrap_params: Value) -> Self {
        Self {
            initialized: false,
            bootstrap_params,
            bootstraps: 0,
        }
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Number of bootstrap calls sent so far.
    #[must_use]
    pub const fn bootstrap_count(&self) -> u64 {
        self.bootstraps
    }

    /// Whether `vector` needs a bootstrap before it runs.
    #[must_use]
    pub fn needs_bootstrap(&self, vector: &TestVector) -> bool {
        !self.initialized
            && vector
                .method()
                .is_some_and(|method| method != methods::INITIALIZE)
    }

    /// Open a session for `vector` if it needs one.
    ///
    /// Failures are logged and otherwise ignored: the vector still runs and
    /// its own verdict shows what the target did.
    pub async fn prepare<T>(&mut self, vector: &TestVector, transport: &mut T, timeout: Duration)
    where
        T: Transport + ?Sized,
    {
        if !self.needs_bootstrap(vector) {
            return;
        }
        self.bootstraps += 1;
        let request = RequestObject::call(
            format!("bootstrap-{}", self.bootstraps),
            methods::INITIALIZE,
            Some(self.bootstrap_params.clone()),
        );

        match transport.send(&request, timeout).await {
            Ok(response) => match InboundMessage::classify(response) {
                InboundMessage::Result { .. } => {
                    debug!(vector = %vector.id, "bootstrap initialize succeeded");
                    self.initialized = true;
                }
                InboundMessage::Error { error, .. } => {
                    warn!(vector = %vector.id, %error, "bootstrap initialize rejected");
                }
                InboundMessage::Unrecognized(value) => {
                    warn!(vector = %vector.id, response = %value, "bootstrap initialize got an unrecognized response");
                }
            },
            Err(err) => {
                warn!(vector = %vector.id, error = %err, "bootstrap initialize failed");
            }
        }
    }

    /// Update the session view from a finished vector: a passing
    /// `initialize` opens the session and a passing `shutdown` closes it.
    pub fn observe(&mut self, result: &VectorResult) {
        if result.status != VectorStatus::Pass {
            return;
        }
        match result.vector.method() {
            Some(methods::INITIALIZE) => self.initialized = true,
            Some(methods::SHUTDOWN) => self.initialized = false,
            _ => {}
        }
    }
}
