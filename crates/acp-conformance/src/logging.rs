//! Structured run logs and tracing setup for the binaries.
//!
//! Every executed vector produces one JSONL entry; a summary entry closes
//! the run. All entries of one run share a correlation id.

use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::report::ConformanceReport;
use crate::verdict::{VectorResult, VectorStatus};

const MODULE: &str = "acp-conformance";

/// One structured log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLogEntry {
    /// RFC3339 timestamp (UTC).
    pub timestamp: DateTime<Utc>,
    /// Log level (info, warn, error).
    pub level: String,
    /// Vector id, or `run` for the summary.
    pub test_name: String,
    pub module: String,
    /// Phase (execute|summary).
    pub phase: String,
    pub correlation_id: String,
    /// Vector status, or the overall result for the summary.
    pub result: String,
    pub duration_ms: u64,
    /// Entry-specific fields, secrets redacted.
    #[serde(default)]
    pub context: Value,
}

impl RunLogEntry {
    #[must_use]
    pub fn new(
        level: impl Into<String>,
        test_name: impl Into<String>,
        phase: impl Into<String>,
        correlation_id: impl Into<String>,
        result: impl Into<String>,
        duration_ms: u64,
        context: &Value,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level: level.into(),
            test_name: test_name.into(),
            module: MODULE.to_string(),
            phase: phase.into(),
            correlation_id: correlation_id.into(),
            result: result.into(),
            duration_ms,
            context: redact_secrets(context),
        }
    }
}

/// Collects entries for one run in memory.
#[derive(Debug)]
pub struct RunLogger {
    correlation_id: String,
    entries: Vec<RunLogEntry>,
}

impl Default for RunLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl RunLogger {
    /// Logger with a fresh correlation id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_correlation_id(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn with_correlation_id(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn push(&mut self, entry: RunLogEntry) {
        self.entries.push(entry);
    }

    /// Record the outcome of one vector.
    pub fn record_vector(&mut self, result: &VectorResult) {
        let level = match result.status {
            VectorStatus::Pass | VectorStatus::Skip => "info",
            VectorStatus::Fail => "warn",
            VectorStatus::Error => "error",
        };
        let mut context = json!({
            "tier": result.vector.level,
            "title": result.vector.title,
        });
        if let Some(reason) = &result.skip_reason {
            context["skip_reason"] = json!(reason);
        }
        if let Some(error) = &result.error {
            context["error"] = json!(error);
        }
        if let Some(actual) = &result.actual {
            context["actual"] = actual.clone();
        }
        let entry = RunLogEntry::new(
            level,
            result.vector.id.clone(),
            "execute",
            self.correlation_id.clone(),
            result.status.as_str(),
            result.duration_ms,
            &context,
        );
        self.push(entry);
    }

    /// Record the closing summary for a finished run.
    pub fn record_summary(&mut self, report: &ConformanceReport) {
        let level = if report.is_non_conformant() {
            "warn"
        } else {
            "info"
        };
        let duration_ms = report.results().iter().map(|r| r.duration_ms).sum();
        let context = json!({
            "target": report.target(),
            "criteria": report.criteria(),
            "vectors": report.results().len(),
        });
        let entry = RunLogEntry::new(
            level,
            "run",
            "summary",
            self.correlation_id.clone(),
            report.overall_result(),
            duration_ms,
            &context,
        );
        self.push(entry);
    }

    #[must_use]
    pub fn entries(&self) -> &[RunLogEntry] {
        &self.entries
    }

    /// Serialize all entries to JSON lines.
    #[must_use]
    pub fn to_json_lines(&self) -> String {
        self.entries
            .iter()
            .filter_map(|entry| serde_json::to_string(entry).ok())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write all entries as JSON lines to a file.
    ///
    /// # Errors
    /// Returns an IO error if the file cannot be created or written to.
    pub fn write_json_lines<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        for entry in &self.entries {
            let line = serde_json::to_string(entry)
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
            writeln!(file, "{line}")?;
        }
        Ok(())
    }
}

/// Install the stderr `fmt` subscriber used by the binaries.
///
/// Directives from `RUST_LOG` are combined with `default_directive`. Safe to
/// call more than once.
pub fn init_cli_tracing(default_directive: tracing::Level) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_directive.into()),
        )
        .try_init();
}

fn redact_secrets(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, val)| {
                    let val = if should_redact_key(key) {
                        Value::String("redacted".to_string())
                    } else {
                        redact_secrets(val)
                    };
                    (key.clone(), val)
                })
                .collect(),
        ),
        Value::Array(values) => Value::Array(values.iter().map(redact_secrets).collect()),
        other => other.clone(),
    }
}

fn should_redact_key(key: &str) -> bool {
    let needle = key.to_ascii_lowercase();
    [
        "token",
        "secret",
        "password",
        "api_key",
        "apikey",
        "authorization",
        "credential",
    ]
    .iter()
    .any(|s| needle.contains(s))
}
