//! Scripted in-memory transport.
//!
//! Replies are queued up front and handed out in order, one per call or raw
//! send. Every message the engine writes is recorded for later assertions.
//! Clones share state, so a test can keep a handle after boxing the
//! transport into a run.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use acp_conformance::{Transport, TransportError};
use acp_core::RequestObject;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

/// A failure the transport reports instead of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedFailure {
    /// Behave as if the per-call timeout elapsed.
    Timeout,
    /// The target went away; the transport stays closed afterwards.
    Closed(String),
    /// A write failed.
    Io(String),
}

impl ScriptedFailure {
    fn into_error(self, timeout: Duration) -> TransportError {
        match self {
            Self::Timeout => TransportError::Timeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            },
            Self::Closed(reason) => TransportError::Closed { reason },
            Self::Io(message) => TransportError::Io(std::io::Error::other(message)),
        }
    }
}

/// One queued reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedReply {
    Response(Value),
    Failure(ScriptedFailure),
}

/// A message the engine handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum SentMessage {
    Call(Value),
    Raw(String),
    Notification(Value),
}

impl SentMessage {
    /// Method of a structured message.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Call(value) | Self::Notification(value) => {
                value.get("method").and_then(Value::as_str)
            }
            Self::Raw(_) => None,
        }
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    replies: VecDeque<ScriptedReply>,
    notify_failure: Option<ScriptedFailure>,
    sent: Vec<SentMessage>,
    closed: bool,
    close_calls: usize,
}

impl ScriptState {
    fn next_reply(&mut self, timeout: Duration) -> Result<Value, TransportError> {
        if self.closed {
            return Err(TransportError::Closed {
                reason: "transport already closed".to_string(),
            });
        }
        match self.replies.pop_front() {
            Some(ScriptedReply::Response(value)) => Ok(value),
            Some(ScriptedReply::Failure(failure)) => {
                if matches!(failure, ScriptedFailure::Closed(_)) {
                    self.closed = true;
                }
                Err(failure.into_error(timeout))
            }
            None => Err(ScriptedFailure::Timeout.into_error(timeout)),
        }
    }
}

/// In-memory [`Transport`] driven by a reply script.
///
/// An exhausted script behaves like a silent target: every further call
/// times out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a transport whose script is `responses`, in order.
    #[must_use]
    pub fn with_responses(responses: impl IntoIterator<Item = Value>) -> Self {
        let transport = Self::new();
        for response in responses {
            transport.push_response(response);
        }
        transport
    }

    pub fn push_response(&self, response: Value) {
        self.state
            .lock()
            .replies
            .push_back(ScriptedReply::Response(response));
    }

    pub fn push_failure(&self, failure: ScriptedFailure) {
        self.state
            .lock()
            .replies
            .push_back(ScriptedReply::Failure(failure));
    }

    /// Make the next notification fail with `failure`.
    pub fn fail_next_notification(&self, failure: ScriptedFailure) {
        self.state.lock().notify_failure = Some(failure);
    }

    /// Everything sent so far, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.state.lock().sent.clone()
    }

    /// Methods of the structured messages sent so far.
    #[must_use]
    pub fn sent_methods(&self) -> Vec<String> {
        self.state
            .lock()
            .sent
            .iter()
            .filter_map(|message| message.method().map(str::to_string))
            .collect()
    }

    /// Replies still waiting in the script.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.state.lock().replies.len()
    }

    #[must_use]
    pub fn close_calls(&self) -> usize {
        self.state.lock().close_calls
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &mut self,
        message: &RequestObject,
        timeout: Duration,
    ) -> Result<Value, TransportError> {
        let mut state = self.state.lock();
        state.sent.push(SentMessage::Call(message.to_value()));
        let reply = state.next_reply(timeout);
        debug!(method = ?message.method(), ok = reply.is_ok(), "scripted call");
        reply
    }

    async fn send_raw(&mut self, raw: &str, timeout: Duration) -> Result<Value, TransportError> {
        let mut state = self.state.lock();
        state.sent.push(SentMessage::Raw(raw.to_string()));
        state.next_reply(timeout)
    }

    async fn notify(&mut self, message: &RequestObject) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.sent.push(SentMessage::Notification(message.to_value()));
        if state.closed {
            return Err(TransportError::Closed {
                reason: "transport already closed".to_string(),
            });
        }
        match state.notify_failure.take() {
            Some(failure) => {
                if matches!(failure, ScriptedFailure::Closed(_)) {
                    state.closed = true;
                }
                Err(failure.into_error(Duration::ZERO))
            }
            None => Ok(()),
        }
    }

    async fn close(&mut self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.close_calls += 1;
    }

    fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}
