//! Run configuration.
//!
//! A TOML file describes the target and the inputs of a run. Every field is
//! optional so that CLI flags can supply or override any of them:
//!
//! ```toml
//! timeout_ms = 3000
//! vectors = "vectors/custom.json"
//! skip_policy = "skip.toml"
//!
//! [target]
//! command = "node"
//! args = ["dist/agent.js", "--stdio"]
//! env = { AGENT_LOG = "debug" }
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::session::default_bootstrap_params;
use crate::transport::TargetCommand;

/// Timeout per call when nothing else sets one.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Environment variable overriding [`DEFAULT_TIMEOUT_MS`].
pub const TIMEOUT_ENV: &str = "ACP_CONFORMANCE_TIMEOUT_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Inputs of one conformance run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub target: Option<TargetCommand>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// `params` of bootstrap `initialize` calls.
    #[serde(default)]
    pub bootstrap_params: Option<Value>,
    #[serde(default)]
    pub vectors: Option<PathBuf>,
    #[serde(default)]
    pub skip_policy: Option<PathBuf>,
    /// Manifest validated up front; its level appears in the report.
    #[serde(default)]
    pub manifest: Option<PathBuf>,
    /// Replacement for the embedded manifest schema.
    #[serde(default)]
    pub schema: Option<PathBuf>,
    #[serde(default)]
    pub log_jsonl: Option<PathBuf>,
}

impl RunConfig {
    /// # Errors
    ///
    /// Returns an error on malformed TOML, unknown keys, or invalid values.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file and resolve its relative paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let payload = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_toml_str(&payload)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == Some(0) {
            return Err(ConfigError::Invalid {
                name: "timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        if let Some(target) = &self.target
            && target.command.trim().is_empty()
        {
            return Err(ConfigError::Invalid {
                name: "target.command",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut Option<PathBuf>| {
            if let Some(p) = path.as_mut()
                && p.is_relative()
            {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.vectors);
        resolve(&mut self.skip_policy);
        resolve(&mut self.manifest);
        resolve(&mut self.schema);
        resolve(&mut self.log_jsonl);
        if let Some(cwd) = self.target.as_mut().and_then(|t| t.cwd.as_mut())
            && cwd.is_relative()
        {
            *cwd = base.join(&*cwd);
        }
    }

    /// Effective call timeout, consulting [`TIMEOUT_ENV`] when the config
    /// does not set one.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        resolve_timeout(self.timeout_ms, std::env::var(TIMEOUT_ENV).ok().as_deref())
    }

    #[must_use]
    pub fn bootstrap_params(&self) -> Value {
        self.bootstrap_params
            .clone()
            .unwrap_or_else(default_bootstrap_params)
    }
}

/// Explicit setting, then the environment value, then the default.
/// Unparseable or zero environment values are ignored.
#[must_use]
pub fn resolve_timeout(explicit: Option<u64>, env: Option<&str>) -> Duration {
    let from_env = env
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0);
    Duration::from_millis(explicit.or(from_env).unwrap_or(DEFAULT_TIMEOUT_MS))
}
