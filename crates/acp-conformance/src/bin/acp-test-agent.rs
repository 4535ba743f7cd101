//! Minimal ACP agent for subprocess integration tests.
//!
//! Speaks line-delimited JSON-RPC on stdio and is fully deterministic. It
//! implements the session lifecycle (initialize/shutdown), ping,
//! agent/status, and a single `echo` tool, so the conformance suite can be
//! exercised end to end without an external target.
//!
//! `ACP_TEST_AGENT_DELAY_MS` delays every response, for timeout tests.

#![forbid(unsafe_code)]

use std::io::{BufRead, Write};
use std::time::{Duration, Instant};

use acp_core::{
    AcpError, AcpResult, JSONRPC_VERSION, error_response, methods, success_response,
};
use serde_json::{Value, json};

const PROTOCOL_VERSION: &str = "2025-06";

struct TestAgent {
    start_time: Instant,
    initialized: bool,
    client_name: Option<String>,
}

impl TestAgent {
    fn new() -> Self {
        Self {
            start_time: Instant::now(),
            initialized: false,
            client_name: None,
        }
    }

    fn require_session(&self) -> AcpResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(AcpError::NotInitialized)
        }
    }

    fn handle_initialize(&mut self, params: &Value) -> AcpResult<Value> {
        if self.initialized {
            return Err(AcpError::AlreadyInitialized);
        }
        let name = params
            .pointer("/manifest/metadata/name")
            .and_then(Value::as_str)
            .ok_or_else(|| AcpError::InvalidParams {
                message: "initialize requires manifest.metadata.name".to_string(),
            })?;
        self.client_name = Some(name.to_string());
        self.initialized = true;
        Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "agentInfo": {
                "name": "acp-test-agent",
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {
                "tools": true,
                "cancellation": true,
                "statusReporting": true,
            },
        }))
    }

    fn handle_status(&self) -> AcpResult<Value> {
        self.require_session()?;
        Ok(json!({
            "state": "ready",
            "uptimeMs": u64::try_from(self.start_time.elapsed().as_millis()).unwrap_or(u64::MAX),
            "client": self.client_name,
        }))
    }

    fn handle_tools_list(&self) -> AcpResult<Value> {
        self.require_session()?;
        Ok(json!({
            "tools": [{
                "name": "echo",
                "description": "Returns the `text` argument unchanged.",
                "inputSchema": {
                    "type": "object",
                    "properties": { "text": { "type": "string" } },
                    "required": ["text"],
                },
            }],
        }))
    }

    fn handle_tools_call(&self, params: &Value) -> AcpResult<Value> {
        self.require_session()?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| AcpError::InvalidParams {
                message: "tools/call requires a tool name".to_string(),
            })?;
        if name != "echo" {
            return Err(AcpError::InvalidParams {
                message: format!("unknown tool: {name}"),
            });
        }
        let text = params
            .pointer("/arguments/text")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(json!({
            "content": [{ "type": "text", "text": text }],
            "isError": false,
        }))
    }

    fn handle_shutdown(&mut self) -> AcpResult<Value> {
        self.require_session()?;
        self.initialized = false;
        self.client_name = None;
        Ok(json!({}))
    }

    fn dispatch(&mut self, method: &str, params: &Value) -> AcpResult<Value> {
        match method {
            methods::INITIALIZE => self.handle_initialize(params),
            methods::PING => Ok(json!({})),
            methods::AGENT_STATUS => self.handle_status(),
            methods::TOOLS_LIST => self.handle_tools_list(),
            methods::TOOLS_CALL => self.handle_tools_call(params),
            methods::SHUTDOWN => self.handle_shutdown(),
            other => Err(AcpError::MethodNotFound {
                method: other.to_string(),
            }),
        }
    }
}

// Notifications never get a response, known or not.
fn log_notification(method: &str) {
    if method == methods::NOTIFICATION_INITIALIZED || method == methods::NOTIFICATION_CANCELLED {
        eprintln!("acp-test-agent: notification {method}");
    }
}

fn reply(id: Option<Value>, result: AcpResult<Value>) -> Value {
    match result {
        Ok(value) => success_response(id, value),
        Err(err) => error_response(id, &err.to_error_object()),
    }
}

/// Produce the response line for one input line, if any.
fn handle_message(agent: &mut TestAgent, message: &str) -> Option<Value> {
    let request: Value = match serde_json::from_str(message) {
        Ok(value) => value,
        Err(err) => {
            let error = AcpError::Parse {
                message: err.to_string(),
            };
            return Some(reply(None, Err(error)));
        }
    };

    let Value::Object(request) = request else {
        let error = AcpError::InvalidRequest {
            message: "request must be a JSON object".to_string(),
        };
        return Some(reply(None, Err(error)));
    };

    let id = request.get("id").cloned();
    if request.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        let error = AcpError::InvalidRequest {
            message: format!("jsonrpc must be \"{JSONRPC_VERSION}\""),
        };
        return Some(reply(id, Err(error)));
    }
    let Some(method) = request.get("method").and_then(Value::as_str) else {
        let error = AcpError::InvalidRequest {
            message: "missing method".to_string(),
        };
        return Some(reply(id, Err(error)));
    };

    if id.is_none() {
        log_notification(method);
        return None;
    }

    let params = request.get("params").cloned().unwrap_or_else(|| json!({}));
    Some(reply(id, agent.dispatch(method, &params)))
}

fn response_delay() -> Option<Duration> {
    std::env::var("ACP_TEST_AGENT_DELAY_MS")
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

fn run_loop(mut agent: TestAgent) -> std::io::Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let delay = response_delay();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let Some(response) = handle_message(&mut agent, &line) else {
            continue;
        };
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        let response_json = serde_json::to_string(&response)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        writeln!(stdout, "{response_json}")?;
        stdout.flush()?;
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    run_loop(TestAgent::new())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(agent: &mut TestAgent, line: &str) -> Value {
        handle_message(agent, line).expect("calls get a response")
    }

    fn init_line() -> &'static str {
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"manifest":{"metadata":{"name":"t"}}}}"#
    }

    #[test]
    fn session_calls_require_initialize() {
        let mut agent = TestAgent::new();
        let response = call(&mut agent, r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#);
        assert_eq!(response["error"]["code"], -32002);
        let response = call(&mut agent, init_line());
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        let response = call(&mut agent, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#);
        assert_eq!(response["result"]["tools"][0]["name"], "echo");
    }

    #[test]
    fn second_initialize_is_invalid_request() {
        let mut agent = TestAgent::new();
        call(&mut agent, init_line());
        let response = call(&mut agent, init_line());
        assert_eq!(response["error"]["code"], -32600);
    }

    #[test]
    fn malformed_inputs_map_to_jsonrpc_codes() {
        let mut agent = TestAgent::new();
        assert_eq!(call(&mut agent, "{\"jsonrpc\":")["error"]["code"], -32700);
        assert_eq!(call(&mut agent, "[1,2]")["error"]["code"], -32600);
        assert_eq!(call(&mut agent, r#"{"jsonrpc":"2.0","id":5}"#)["error"]["code"], -32600);
        assert_eq!(
            call(&mut agent, r#"{"jsonrpc":"1.0","id":6,"method":"ping"}"#)["error"]["code"],
            -32600
        );
        assert_eq!(
            call(&mut agent, r#"{"jsonrpc":"2.0","id":7,"method":"nope"}"#)["error"]["code"],
            -32601
        );
    }

    #[test]
    fn notifications_are_silent() {
        let mut agent = TestAgent::new();
        assert!(
            handle_message(&mut agent, r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .is_none()
        );
    }

    #[test]
    fn echo_tool_returns_text() {
        let mut agent = TestAgent::new();
        call(&mut agent, init_line());
        let response = call(
            &mut agent,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"echo","arguments":{"text":"hi"}}}"#,
        );
        assert_eq!(response["result"]["content"][0]["text"], "hi");
        assert_eq!(response["id"], 3);
    }
}
