// crates/agent-conformance/src/config/env.rs
// ============================================================================
// Module: Harness Environment
// Description: Environment-backed configuration for the conformance harness.
// Purpose: Centralize env parsing with strict UTF-8 validation and defaults.
// Dependencies: url
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8, empty values, and malformed URLs fail
//! closed; unset values fall back to the documented endpoint defaults.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::convergence::WaitStrategy;
use crate::error::HarnessError;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default base URL for the master agent HTTP API.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";
/// Default base URL for the agent-card / streaming endpoint.
pub const DEFAULT_A2A_URL: &str = "http://localhost:8084";
/// Default base URL for the tool-call (MCP) endpoint.
pub const DEFAULT_MCP_URL: &str = "http://localhost:8083";
/// Default per-request timeout for the shared event client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Default timeout for the session health probe.
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
/// Default convergence window after a submission.
pub const DEFAULT_CONVERGENCE_WINDOW: Duration = Duration::from_secs(15);
/// Default snapshot interval for poll-until convergence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys for harness configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessEnv {
    /// Base URL of the master agent HTTP API.
    ApiUrl,
    /// Base URL of the agent-card / streaming endpoint.
    A2aUrl,
    /// Base URL of the tool-call endpoint.
    McpUrl,
    /// Per-request timeout in seconds (positive integer).
    TimeoutSeconds,
    /// Health probe timeout in seconds (positive integer).
    HealthTimeoutSeconds,
    /// Convergence window in seconds (positive integer).
    WaitSeconds,
    /// Convergence mode (`fixed` or `poll`).
    WaitMode,
    /// Poll interval in milliseconds for `poll` mode (positive integer).
    PollIntervalMillis,
    /// Optional directory holding evaluation datasets.
    EvalDir,
    /// Optional artifact run root override.
    RunRoot,
}

impl HarnessEnv {
    /// Every key, in documentation order.
    pub const ALL: [Self; 10] = [
        Self::ApiUrl,
        Self::A2aUrl,
        Self::McpUrl,
        Self::TimeoutSeconds,
        Self::HealthTimeoutSeconds,
        Self::WaitSeconds,
        Self::WaitMode,
        Self::PollIntervalMillis,
        Self::EvalDir,
        Self::RunRoot,
    ];

    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApiUrl => "MASTER_AGENT_API_URL",
            Self::A2aUrl => "MASTER_AGENT_A2A_URL",
            Self::McpUrl => "MASTER_AGENT_MCP_URL",
            Self::TimeoutSeconds => "MASTER_AGENT_TIMEOUT_SEC",
            Self::HealthTimeoutSeconds => "MASTER_AGENT_HEALTH_TIMEOUT_SEC",
            Self::WaitSeconds => "MASTER_AGENT_WAIT_SEC",
            Self::WaitMode => "MASTER_AGENT_WAIT_MODE",
            Self::PollIntervalMillis => "MASTER_AGENT_POLL_INTERVAL_MS",
            Self::EvalDir => "MASTER_AGENT_EVAL_DIR",
            Self::RunRoot => "MASTER_AGENT_SYSTEM_TEST_RUN_ROOT",
        }
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Typed harness configuration derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Base URL of the master agent HTTP API (no trailing slash).
    pub api_url: String,
    /// Base URL of the agent-card / streaming endpoint (no trailing slash).
    pub a2a_url: String,
    /// Base URL of the tool-call endpoint (no trailing slash).
    pub mcp_url: String,
    /// Per-request timeout for the shared event client.
    pub request_timeout: Duration,
    /// Timeout for the one-shot health probe.
    pub health_timeout: Duration,
    /// How scenarios wait for asynchronous processing.
    pub wait: WaitStrategy,
    /// Optional evaluation dataset directory.
    pub eval_dir: Option<PathBuf>,
    /// Optional artifact run root.
    pub run_root: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            a2a_url: DEFAULT_A2A_URL.to_string(),
            mcp_url: DEFAULT_MCP_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            wait: WaitStrategy::FixedWindow(DEFAULT_CONVERGENCE_WINDOW),
            eval_dir: None,
            run_root: None,
        }
    }
}

impl HarnessConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] when an environment value is not valid
    /// UTF-8, is empty, or fails validation (URL, duration, or wait mode).
    pub fn load() -> Result<Self, HarnessError> {
        let defaults = Self::default();
        let api_url = read_url(HarnessEnv::ApiUrl)?.unwrap_or(defaults.api_url);
        let a2a_url = read_url(HarnessEnv::A2aUrl)?.unwrap_or(defaults.a2a_url);
        let mcp_url = read_url(HarnessEnv::McpUrl)?.unwrap_or(defaults.mcp_url);
        let request_timeout = read_positive(HarnessEnv::TimeoutSeconds)?
            .map_or(defaults.request_timeout, Duration::from_secs);
        let health_timeout = read_positive(HarnessEnv::HealthTimeoutSeconds)?
            .map_or(defaults.health_timeout, Duration::from_secs);
        let window = read_positive(HarnessEnv::WaitSeconds)?
            .map_or(DEFAULT_CONVERGENCE_WINDOW, Duration::from_secs);
        let interval = read_positive(HarnessEnv::PollIntervalMillis)?
            .map_or(DEFAULT_POLL_INTERVAL, Duration::from_millis);
        let wait =
            parse_wait_mode(read_env_nonempty(HarnessEnv::WaitMode.as_str())?, window, interval)?;
        let eval_dir = read_env_nonempty(HarnessEnv::EvalDir.as_str())?.map(PathBuf::from);
        let run_root = read_env_nonempty(HarnessEnv::RunRoot.as_str())?.map(PathBuf::from);
        Ok(Self {
            api_url,
            a2a_url,
            mcp_url,
            request_timeout,
            health_timeout,
            wait,
            eval_dir,
            run_root,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, HarnessError> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string()
            .map(Some)
            .map_err(|_| HarnessError::Config(format!("{name} must be valid UTF-8")))
    })
}

/// Reads an environment variable and rejects empty values.
fn read_env_nonempty(name: &str) -> Result<Option<String>, HarnessError> {
    match read_env_strict(name)? {
        Some(value) if value.trim().is_empty() => {
            Err(HarnessError::Config(format!("{name} must not be empty")))
        }
        Some(value) => Ok(Some(value)),
        None => Ok(None),
    }
}

/// Reads and validates an absolute http(s) URL.
fn read_url(key: HarnessEnv) -> Result<Option<String>, HarnessError> {
    let name = key.as_str();
    read_env_nonempty(name)?.map(|raw| parse_base_url(name, &raw)).transpose()
}

/// Parses a base URL, requires an http or https scheme, and strips any
/// trailing slash so endpoint paths can be appended directly.
///
/// # Errors
///
/// Returns [`HarnessError::Config`] when the value is not an absolute http(s) URL.
pub fn parse_base_url(name: &str, raw: &str) -> Result<String, HarnessError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed)
        .map_err(|err| HarnessError::Config(format!("{name} must be an absolute URL: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(trimmed.trim_end_matches('/').to_string()),
        other => Err(HarnessError::Config(format!("{name} must use http or https, got {other}"))),
    }
}

/// Reads a positive integer value.
fn read_positive(key: HarnessEnv) -> Result<Option<u64>, HarnessError> {
    let name = key.as_str();
    read_env_nonempty(name)?.map(|raw| parse_positive(name, &raw)).transpose()
}

/// Parses a positive integer from an environment variable string.
fn parse_positive(name: &str, raw: &str) -> Result<u64, HarnessError> {
    let value: u64 = raw
        .trim()
        .parse()
        .map_err(|_| HarnessError::Config(format!("{name} must be a positive integer")))?;
    if value == 0 {
        return Err(HarnessError::Config(format!("{name} must be greater than zero")));
    }
    Ok(value)
}

/// Resolves the wait strategy from the mode literal.
fn parse_wait_mode(
    raw: Option<String>,
    window: Duration,
    interval: Duration,
) -> Result<WaitStrategy, HarnessError> {
    let Some(value) = raw else {
        return Ok(WaitStrategy::FixedWindow(window));
    };
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("fixed") {
        return Ok(WaitStrategy::FixedWindow(window));
    }
    if trimmed.eq_ignore_ascii_case("poll") {
        return Ok(WaitStrategy::PollUntil {
            timeout: window,
            interval,
        });
    }
    Err(HarnessError::Config(format!("{} must be fixed or poll", HarnessEnv::WaitMode.as_str())))
}
