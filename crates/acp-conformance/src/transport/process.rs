//! Stdio transport for a target launched as a child process.
//!
//! A reader task owns the child's stdout and feeds a [`LineFramer`]. The
//! call in flight registers a one-shot slot in the shared inbox; the reader
//! fills it with the first message that is not a late reply to an earlier,
//! timed-out exchange. Targets answer in order, so every timed-out exchange
//! is queued and the first later reply carrying its id (or no id, for raw
//! probes) is dropped, even when the current call reuses that id.

use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use acp_core::{RequestId, RequestObject};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::{LineFramer, TargetCommand, Transport, TransportError};

const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Oldest abandoned exchanges are forgotten past this many.
const MAX_ABANDONED: usize = 64;

struct PendingCall {
    expected: Option<RequestId>,
    reply: oneshot::Sender<Result<Value, TransportError>>,
}

#[derive(Default)]
struct Inbox {
    framer: LineFramer,
    pending: Option<PendingCall>,
    /// Ids of timed-out exchanges, oldest first. `None` marks a raw probe.
    abandoned: VecDeque<Option<RequestId>>,
    closed: Option<String>,
}

impl Inbox {
    fn dispatch(&mut self) {
        while self.pending.is_some() {
            let Some(message) = self.framer.next_message() else {
                return;
            };
            if self.is_stale(&message) {
                continue;
            }
            if let Some(pending) = self.pending.take() {
                // The caller may have given up already; nothing to do then.
                let _ = pending.reply.send(Ok(message));
            }
        }
    }

    fn is_stale(&mut self, message: &Value) -> bool {
        // Requests and notifications from the target never answer a call.
        if message.get("method").is_some() {
            return false;
        }
        let id = message.get("id").and_then(RequestId::from_value);
        let Some(index) = self.abandoned.iter().position(|entry| *entry == id) else {
            return false;
        };
        self.abandoned.remove(index);
        debug!(id = ?id, "dropping late response to a timed-out call");
        true
    }

    fn abandon(&mut self, id: Option<RequestId>) {
        if self.abandoned.len() == MAX_ABANDONED {
            self.abandoned.pop_front();
        }
        self.abandoned.push_back(id);
    }

    fn shut(&mut self, reason: &str) {
        if self.closed.is_none() {
            self.closed = Some(reason.to_string());
        }
        self.abandoned.clear();
        if let Some(pending) = self.pending.take() {
            let _ = pending.reply.send(Err(TransportError::Closed {
                reason: reason.to_string(),
            }));
        }
    }
}

/// Transport to a child process speaking line-delimited JSON on stdio.
pub struct ProcessTransport {
    target: String,
    child: Child,
    stdin: Option<ChildStdin>,
    inbox: Arc<Mutex<Inbox>>,
    reader: JoinHandle<()>,
    stderr: JoinHandle<()>,
    closed: bool,
}

impl std::fmt::Debug for ProcessTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessTransport")
            .field("target", &self.target)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl ProcessTransport {
    /// Launch `target` with piped stdio.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Spawn`] if the process cannot be started
    /// or its pipes cannot be opened.
    #[allow(clippy::unused_async)] // Async so callers need a runtime, which the reader task requires
    pub async fn spawn(target: &TargetCommand) -> Result<Self, TransportError> {
        let label = target.to_string();
        let spawn_error = |source: std::io::Error| TransportError::Spawn {
            command: label.clone(),
            source,
        };

        let mut cmd = Command::new(&target.command);
        cmd.args(&target.args)
            .envs(&target.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &target.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(spawn_error)?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| spawn_error(std::io::Error::other("target stdin unavailable")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_error(std::io::Error::other("target stdout unavailable")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| spawn_error(std::io::Error::other("target stderr unavailable")))?;

        let inbox = Arc::new(Mutex::new(Inbox::default()));
        let reader = tokio::spawn(read_stdout(stdout, Arc::clone(&inbox)));
        let stderr = tokio::spawn(forward_stderr(stderr, label.clone()));
        debug!(command = %label, pid = child.id(), "spawned target");

        Ok(Self {
            target: label,
            child,
            stdin: Some(stdin),
            inbox,
            reader,
            stderr,
            closed: false,
        })
    }

    /// Process id of the target, while it is running.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn closed_error(&self) -> TransportError {
        let reason = self
            .inbox
            .lock()
            .closed
            .clone()
            .unwrap_or_else(|| "transport closed".to_string());
        TransportError::Closed { reason }
    }

    async fn write_line(&mut self, line: &[u8]) -> Result<(), TransportError> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(self.closed_error());
        };
        stdin.write_all(line).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    async fn exchange(
        &mut self,
        line: &[u8],
        expected: Option<RequestId>,
        timeout: Duration,
    ) -> Result<Value, TransportError> {
        if self.is_closed() {
            return Err(self.closed_error());
        }
        trace!(command = %self.target, id = ?expected, bytes = line.len(), "sending");
        let started = Instant::now();

        // A write cut short would leave a partial line on stdin, so a
        // stalled write closes the transport.
        match tokio::time::timeout(timeout, self.write_line(line)).await {
            Ok(written) => written?,
            Err(_elapsed) => {
                self.stdin.take();
                self.inbox.lock().shut("write to target timed out");
                warn!(command = %self.target, id = ?expected, ?timeout, "write timed out");
                return Err(TransportError::timeout(timeout));
            }
        }

        let (reply, response) = oneshot::channel();
        {
            let mut inbox = self.inbox.lock();
            if inbox.closed.is_some() {
                drop(inbox);
                return Err(self.closed_error());
            }
            inbox.pending = Some(PendingCall {
                expected: expected.clone(),
                reply,
            });
            inbox.dispatch();
        }

        let remaining = timeout.saturating_sub(started.elapsed());
        let outcome = tokio::time::timeout(remaining, response).await;

        let mut inbox = self.inbox.lock();
        let leftover = inbox.pending.take();
        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(_dropped)) => {
                drop(inbox);
                Err(self.closed_error())
            }
            Err(_elapsed) => {
                if leftover.is_some() {
                    inbox.abandon(expected.clone());
                }
                drop(inbox);
                warn!(command = %self.target, id = ?expected, ?timeout, "call timed out");
                Err(TransportError::timeout(timeout))
            }
        }
    }
}

#[async_trait]
impl Transport for ProcessTransport {
    async fn send(
        &mut self,
        message: &RequestObject,
        timeout: Duration,
    ) -> Result<Value, TransportError> {
        let line = serde_json::to_vec(message)?;
        self.exchange(&line, message.id(), timeout).await
    }

    async fn send_raw(&mut self, raw: &str, timeout: Duration) -> Result<Value, TransportError> {
        self.exchange(raw.as_bytes(), None, timeout).await
    }

    async fn notify(&mut self, message: &RequestObject) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(self.closed_error());
        }
        let line = serde_json::to_vec(message)?;
        self.write_line(&line).await
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        // Dropping stdin gives well-behaved targets an EOF before the kill.
        self.stdin.take();
        if let Err(err) = self.child.start_kill() {
            debug!(command = %self.target, error = %err, "target already exited");
        }
        match self.child.wait().await {
            Ok(status) => debug!(command = %self.target, %status, "target stopped"),
            Err(err) => warn!(command = %self.target, error = %err, "failed to reap target"),
        }
        self.reader.abort();
        self.stderr.abort();
        self.inbox.lock().shut("transport closed");
    }

    fn is_closed(&self) -> bool {
        self.closed || self.inbox.lock().closed.is_some()
    }
}

impl Drop for ProcessTransport {
    fn drop(&mut self) {
        self.reader.abort();
        self.stderr.abort();
    }
}

async fn read_stdout(mut stdout: ChildStdout, inbox: Arc<Mutex<Inbox>>) {
    let mut chunk = vec![0_u8; READ_CHUNK_BYTES];
    loop {
        match stdout.read(&mut chunk).await {
            Ok(0) => {
                debug!("target closed stdout");
                inbox.lock().shut("target closed stdout");
                return;
            }
            Ok(read) => {
                trace!(bytes = read, "read from target");
                let mut inbox = inbox.lock();
                inbox.framer.extend(&chunk[..read]);
                inbox.dispatch();
            }
            Err(err) => {
                inbox
                    .lock()
                    .shut(&format!("failed to read target stdout: {err}"));
                return;
            }
        }
    }
}

async fn forward_stderr(stderr: ChildStderr, target: String) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(target: "acp_conformance::target_stderr", command = %target, "{line}");
    }
}
