// crates/agent-conformance-cli/src/main.rs
// ============================================================================
// Module: Agent Conformance CLI Entry Point
// Description: Command dispatcher for conformance runs, probes, and evaluations.
// Purpose: Drive the harness against a running master agent from the shell.
// Dependencies: agent-conformance, clap, serde_jcs, thiserror, tokio, tracing-subscriber
// ============================================================================

//! ## Overview
//! `agent-conformance` exposes three commands:
//! - `run` acquires one gated session and runs the scenario catalog;
//! - `probe` walks the tool-call endpoint and prints every step;
//! - `eval` replays evaluation datasets through the agent card.
//!
//! Exit codes: 0 on success or a gate skip, 1 on any failed scenario or
//! dataset, 1 on configuration and output errors. Logs go to stderr; reports
//! go to stdout.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use agent_conformance::ConformanceSession;
use agent_conformance::HarnessConfig;
use agent_conformance::HealthGate;
use agent_conformance::ScenarioId;
use agent_conformance::ScenarioStatus;
use agent_conformance::SessionReport;
use agent_conformance::SessionStart;
use agent_conformance::config::parse_base_url;
use agent_conformance::eval::DEFAULT_DATASETS;
use agent_conformance::eval::DatasetReport;
use agent_conformance::eval::Evaluator;
use agent_conformance::eval::dataset_paths;
use agent_conformance::probe::ProbeReport;
use agent_conformance::probe::ToolProbeClient;
use agent_conformance::probe::run_probe;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "agent-conformance", version, disable_help_subcommand = true)]
struct Cli {
    /// Log output format on stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,
    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run conformance scenarios against the master agent HTTP API.
    Run(RunCommand),
    /// Walk the tool-call endpoint and print every step.
    Probe(ProbeCommand),
    /// Replay evaluation datasets through the agent card.
    Eval(EvalCommand),
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Scenario names to run (defaults to every scenario).
    #[arg(long = "only", value_name = "SCENARIO")]
    only: Vec<String>,
    /// Override for `MASTER_AGENT_API_URL`.
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,
    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Arguments for `probe`.
#[derive(Args, Debug)]
struct ProbeCommand {
    /// Override for `MASTER_AGENT_MCP_URL`.
    #[arg(long, value_name = "URL")]
    mcp_url: Option<String>,
    /// Wait between the emit and the second status call, in milliseconds.
    #[arg(long, default_value_t = 3_000)]
    wait_ms: u64,
    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Arguments for `eval`.
#[derive(Args, Debug)]
struct EvalCommand {
    /// Dataset files or directories (defaults to `MASTER_AGENT_EVAL_DIR`).
    #[arg(value_name = "DATASET")]
    datasets: Vec<PathBuf>,
    /// Replays per case.
    #[arg(long, default_value_t = 1)]
    num_runs: u32,
    /// Override for `MASTER_AGENT_A2A_URL`.
    #[arg(long, value_name = "URL")]
    a2a_url: Option<String>,
    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Report output formats.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// One line per item.
    Text,
    /// Canonical JSON.
    Json,
}

/// Log output formats.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum LogFormat {
    /// Human-readable lines.
    Pretty,
    /// JSON lines.
    Json,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

impl From<agent_conformance::HarnessError> for CliError {
    fn from(err: agent_conformance::HarnessError) -> Self {
        Self::new(err.to_string())
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_format, &cli.log_level);
    let config = HarnessConfig::load()?;
    match cli.command {
        Commands::Run(command) => command_run(command, config).await,
        Commands::Probe(command) => command_probe(command, config).await,
        Commands::Eval(command) => command_eval(command, config).await,
    }
}

/// Installs the stderr tracing subscriber.
fn init_tracing(format: LogFormat, level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let _ = match format {
        LogFormat::Json => registry.with(layer.json()).try_init(),
        LogFormat::Pretty => registry.with(layer).try_init(),
    };
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
async fn command_run(command: RunCommand, mut config: HarnessConfig) -> CliResult<ExitCode> {
    if let Some(url) = command.api_url.as_deref() {
        config.api_url = parse_base_url("--api-url", url)?;
    }
    let scenarios = select_scenarios(&command.only)?;
    let report = match ConformanceSession::acquire(config.clone()).await? {
        SessionStart::Ready(session) => session.run(&scenarios).await,
        SessionStart::Skipped {
            reason,
        } => SessionReport::skipped(&config, &reason, &scenarios),
    };
    match command.format {
        OutputFormat::Json => write_json(&report)?,
        OutputFormat::Text => {
            for line in render_session(&report) {
                write_line(&line)?;
            }
        }
    }
    Ok(if report.all_passed() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Resolves `--only` names, defaulting to every scenario.
fn select_scenarios(only: &[String]) -> CliResult<Vec<ScenarioId>> {
    if only.is_empty() {
        return Ok(ScenarioId::ALL.to_vec());
    }
    only.iter()
        .map(|name| {
            ScenarioId::parse(name).ok_or_else(|| {
                let known =
                    ScenarioId::ALL.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ");
                CliError::new(format!("unknown scenario {name}; expected one of: {known}"))
            })
        })
        .collect()
}

/// Renders a session report as text lines.
fn render_session(report: &SessionReport) -> Vec<String> {
    let mut lines = Vec::with_capacity(report.scenarios.len() + 1);
    if let Some(reason) = &report.skipped_reason {
        lines.push(format!("skipped: {reason}"));
        return lines;
    }
    for scenario in &report.scenarios {
        let label = match scenario.status {
            ScenarioStatus::Pass => "PASS",
            ScenarioStatus::Fail => "FAIL",
            ScenarioStatus::Skip => "SKIP",
        };
        let mut line =
            format!("{label} {} ({} ms)", scenario.scenario.as_str(), scenario.elapsed_ms);
        if scenario.status == ScenarioStatus::Fail {
            line.push_str(": ");
            line.push_str(&scenario.failure_summary());
        }
        lines.push(line);
    }
    lines.push(format!(
        "{} passed, {} failed ({} wait against {})",
        report.count(ScenarioStatus::Pass),
        report.count(ScenarioStatus::Fail),
        report.wait_mode,
        report.api_url
    ));
    lines
}

// ============================================================================
// SECTION: Probe Command
// ============================================================================

/// Executes the `probe` command.
async fn command_probe(command: ProbeCommand, config: HarnessConfig) -> CliResult<ExitCode> {
    let mcp_url = match command.mcp_url.as_deref() {
        Some(url) => parse_base_url("--mcp-url", url)?,
        None => config.mcp_url,
    };
    let client = ToolProbeClient::new(&mcp_url, config.request_timeout)?;
    let report = run_probe(&client, Duration::from_millis(command.wait_ms)).await;
    match command.format {
        OutputFormat::Json => write_json(&report)?,
        OutputFormat::Text => {
            for line in render_probe(&report) {
                write_line(&line)?;
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Renders a probe report as text lines.
fn render_probe(report: &ProbeReport) -> Vec<String> {
    let step = |name: &str, value: Option<&serde_json::Value>| {
        value.map_or_else(|| format!("{name}: none"), |value| format!("{name}: {value}"))
    };
    vec![
        format!("endpoint: {}", report.endpoint),
        format!("matching tools: {}", report.matching_tools.join(", ")),
        step("status before", report.status_before.as_ref()),
        step("emit", report.emitted.as_ref()),
        step("status after", report.status_after.as_ref()),
        step("recent events", report.recent_events.as_ref()),
        format!(
            "observed totalEvents: {}",
            report
                .observed_total_events()
                .map_or_else(|| "unknown".to_string(), |total| total.to_string())
        ),
    ]
}

// ============================================================================
// SECTION: Eval Command
// ============================================================================

/// Executes the `eval` command.
async fn command_eval(command: EvalCommand, mut config: HarnessConfig) -> CliResult<ExitCode> {
    if let Some(url) = command.a2a_url.as_deref() {
        config.a2a_url = parse_base_url("--a2a-url", url)?;
    }
    let paths = resolve_datasets(&command.datasets, &config)?;
    if let Some(reason) = HealthGate::session(&config).await.skip_reason() {
        write_line(&format!("skipped: {reason}"))?;
        return Ok(ExitCode::SUCCESS);
    }
    let evaluator = Evaluator::discover(&config.a2a_url, config.request_timeout).await?;
    let mut reports: Vec<DatasetReport> = Vec::with_capacity(paths.len());
    for path in &paths {
        reports.push(evaluator.evaluate(path, command.num_runs).await?);
    }
    match command.format {
        OutputFormat::Json => write_json(&reports)?,
        OutputFormat::Text => {
            for report in &reports {
                for line in render_dataset(report) {
                    write_line(&line)?;
                }
            }
        }
    }
    let passed = reports.iter().all(DatasetReport::passed);
    Ok(if passed { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Expands dataset arguments, falling back to the configured eval directory.
fn resolve_datasets(datasets: &[PathBuf], config: &HarnessConfig) -> CliResult<Vec<PathBuf>> {
    if datasets.is_empty() {
        let dir = config.eval_dir.as_ref().ok_or_else(|| {
            CliError::new(
                "no datasets given and MASTER_AGENT_EVAL_DIR is unset".to_string(),
            )
        })?;
        return Ok(DEFAULT_DATASETS.iter().map(|name| dir.join(name)).collect());
    }
    let mut paths = Vec::new();
    for dataset in datasets {
        paths.extend(dataset_paths(dataset)?);
    }
    Ok(paths)
}

/// Renders a dataset report as text lines.
fn render_dataset(report: &DatasetReport) -> Vec<String> {
    let score = |value: Option<f64>| value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"));
    let mut lines = Vec::with_capacity(report.cases.len() + 1);
    lines.push(format!(
        "{} {} ({})",
        if report.passed() { "PASS" } else { "FAIL" },
        report.eval_set_id,
        report.path.display()
    ));
    for case in &report.cases {
        let mut line = format!(
            "  {} {} run {}: trajectory {} response {}",
            if case.passed { "PASS" } else { "FAIL" },
            case.eval_id,
            case.run,
            score(case.trajectory),
            score(case.response)
        );
        if let Some(error) = &case.error {
            line.push_str(": ");
            line.push_str(error);
        }
        lines.push(line);
    }
    lines
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Writes canonical JSON to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_jcs::to_string(value)
        .map_err(|err| CliError::new(format!("failed to serialize report: {err}")))?;
    write_line(&text)
}

/// Writes a line to stdout, mapping failures to [`CliError`].
fn write_line(message: &str) -> CliResult<()> {
    write_stdout_line(message)
        .map_err(|err| CliError::new(format!("failed to write to stdout: {err}")))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
