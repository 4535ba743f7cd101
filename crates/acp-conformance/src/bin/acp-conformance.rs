//! ACP conformance runner.
//!
//! Runs the conformance vectors against an agent launched as a subprocess
//! and reports per-tier results.
//!
//! # Usage
//!
//! ```bash
//! # Built-in catalog against a target speaking ACP on stdio
//! acp-conformance --target-cmd node --target-arg dist/agent.js
//!
//! # Manifest-only run (live vectors are skipped)
//! acp-conformance --manifest agent.json
//!
//! # Everything from a config file, JSON report on stdout
//! acp-conformance --config acp.toml --json
//! ```
//!
//! Exit codes: 0 unless the overall result is `NON-CONFORMANT` (1); 2 for
//! usage, configuration, or spawn failures.

#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use acp_conformance::logging::init_cli_tracing;
use acp_conformance::{
    ConformanceLevel, ConformanceRun, ManifestValidator, ProcessTransport, RunConfig, RunOptions,
    SchemaValidator, SkipPolicy, TargetCommand, TestVector, ValidationOutcome, catalog,
    load_vectors,
};
use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::Value;
use tracing::{info, warn};

/// ACP conformance runner.
///
/// Executes declarative test vectors against an ACP agent and reports
/// conformance per tier.
#[derive(Parser, Debug)]
#[command(name = "acp-conformance")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML run configuration; flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Vector file (JSON array or `{"vectors": [...]}`); defaults to the
    /// built-in catalog.
    #[arg(long)]
    vectors: Option<PathBuf>,

    /// Skip policy file (JSON or TOML) mapping vector ids to reasons.
    #[arg(long)]
    skip_policy: Option<PathBuf>,

    /// Agent manifest (JSON) to validate up front.
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// JSON Schema replacing the embedded manifest schema.
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Command launching the target agent.
    #[arg(long)]
    target_cmd: Option<String>,

    /// Argument for the target command (repeatable).
    #[arg(long = "target-arg", allow_hyphen_values = true)]
    target_args: Vec<String>,

    /// Per-call timeout in milliseconds.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_ms: Option<u64>,

    /// Only run vectors up to this tier (1, 2, 3 or tier-N).
    #[arg(long)]
    level: Option<ConformanceLevel>,

    /// Print the JSON report on stdout instead of markdown.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Also write the JSON report to this file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the structured run log (JSONL) to this file.
    #[arg(long)]
    log_jsonl: Option<PathBuf>,

    /// List the selected vectors and exit.
    #[arg(long, default_value_t = false)]
    list: bool,
}

impl Args {
    /// Merge flags over the config file.
    fn into_config(self) -> Result<(RunConfig, Flags)> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => RunConfig::default(),
        };

        if let Some(command) = self.target_cmd {
            let mut target = TargetCommand::new(command);
            target.args = self.target_args;
            if let Some(existing) = config.target.take() {
                target.env = existing.env;
                target.cwd = existing.cwd;
            }
            config.target = Some(target);
        } else if !self.target_args.is_empty() {
            match config.target.as_mut() {
                Some(target) => target.args = self.target_args,
                None => bail!("--target-arg requires --target-cmd or a [target] in the config"),
            }
        }

        config.timeout_ms = self.timeout_ms.or(config.timeout_ms);
        config.vectors = self.vectors.or(config.vectors);
        config.skip_policy = self.skip_policy.or(config.skip_policy);
        config.manifest = self.manifest.or(config.manifest);
        config.schema = self.schema.or(config.schema);
        config.log_jsonl = self.log_jsonl.or(config.log_jsonl);

        Ok((
            config,
            Flags {
                level: self.level,
                json: self.json,
                output: self.output,
                list: self.list,
            },
        ))
    }
}

/// Presentation flags that never live in the config file.
struct Flags {
    level: Option<ConformanceLevel>,
    json: bool,
    output: Option<PathBuf>,
    list: bool,
}

/// Everything loaded before the target is started.
struct Prepared {
    vectors: Vec<TestVector>,
    skip_policy: SkipPolicy,
    validator: SchemaValidator,
    manifest: Option<ValidationOutcome>,
}

fn prepare(config: &RunConfig, flags: &Flags) -> Result<Prepared> {
    let vectors = match &config.vectors {
        Some(path) => load_vectors(path)?,
        None => catalog::builtin().context("embedded catalog")?,
    };
    let vectors = match flags.level {
        Some(level) => catalog::up_to(vectors, level),
        None => vectors,
    };

    let skip_policy = match &config.skip_policy {
        Some(path) => SkipPolicy::load(path)?,
        None => SkipPolicy::new(),
    };
    for id in skip_policy.unknown_ids(&vectors) {
        warn!(vector = id, "skip policy names an unknown vector");
    }

    let validator = match &config.schema {
        Some(path) => {
            let schema = std::fs::read_to_string(path)
                .with_context(|| format!("reading schema {}", path.display()))?;
            SchemaValidator::from_schema_str(&schema)?
        }
        None => SchemaValidator::builtin()?,
    };

    let manifest = config
        .manifest
        .as_deref()
        .map(|path| validate_manifest_file(&validator, path))
        .transpose()?;

    Ok(Prepared {
        vectors,
        skip_policy,
        validator,
        manifest,
    })
}

fn validate_manifest_file(validator: &SchemaValidator, path: &Path) -> Result<ValidationOutcome> {
    let payload = std::fs::read_to_string(path)
        .with_context(|| format!("reading manifest {}", path.display()))?;
    let manifest: Value = serde_json::from_str(&payload)
        .with_context(|| format!("parsing manifest {}", path.display()))?;
    let outcome = validator.validate(&manifest);
    for issue in &outcome.errors {
        warn!(path = %issue.path, "manifest: {}", issue.message);
    }
    for issue in &outcome.warnings {
        info!(path = %issue.path, "manifest: {}", issue.message);
    }
    Ok(outcome)
}

fn print_vector_list(vectors: &[TestVector]) {
    for vector in vectors {
        let mode = match &vector.payload {
            acp_conformance::VectorPayload::Call(_) => "call",
            acp_conformance::VectorPayload::Notification(_) => "notification",
            acp_conformance::VectorPayload::Raw(_) => "raw",
            acp_conformance::VectorPayload::Manifest(_) => "manifest",
            acp_conformance::VectorPayload::Scenario => "scenario",
        };
        println!("{}\t{}\t{mode}\t{}", vector.id, vector.level, vector.title);
    }
}

async fn run(config: RunConfig, flags: Flags) -> Result<ExitCode> {
    let prepared = match prepare(&config, &flags) {
        Ok(prepared) => prepared,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return Ok(ExitCode::from(2));
        }
    };

    if flags.list {
        print_vector_list(&prepared.vectors);
        return Ok(ExitCode::SUCCESS);
    }

    let timeout: Duration = config.timeout();
    let options = RunOptions {
        timeout,
        bootstrap_params: config.bootstrap_params(),
    };
    let mut conformance = ConformanceRun::new(&prepared.validator, &prepared.skip_policy, options);

    let target_label = match &config.target {
        Some(target) => match ProcessTransport::spawn(target).await {
            Ok(transport) => {
                conformance = conformance.with_transport(Box::new(transport));
                target.to_string()
            }
            Err(err) => {
                eprintln!("Error: {err}");
                return Ok(ExitCode::from(2));
            }
        },
        None => {
            info!("no target configured; live vectors will be skipped");
            "(manifest only)".to_string()
        }
    };

    conformance.run(&prepared.vectors).await;
    let summary = conformance
        .finish(target_label, prepared.manifest.as_ref())
        .await;
    let report = summary.report;

    if let Some(path) = &config.log_jsonl {
        summary
            .log
            .write_json_lines(path)
            .with_context(|| format!("writing run log {}", path.display()))?;
    }

    let json = report.to_json_pretty()?;
    if let Some(path) = &flags.output {
        std::fs::write(path, &json)
            .with_context(|| format!("writing report {}", path.display()))?;
    }
    if flags.json {
        println!("{json}");
    } else {
        print!("{}", report.render_markdown());
    }

    Ok(if report.is_non_conformant() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    init_cli_tracing(tracing::Level::INFO);

    let (config, flags) = match Args::parse().into_config() {
        Ok(parts) => parts,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::from(2);
        }
    };

    match run(config, flags).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}
