// system-tests/src/live.rs
// ============================================================================
// Module: Live Configuration
// Description: Harness configuration with fixture-backed defaults.
// Purpose: Point suites at bundled datasets unless the environment overrides them.
// Dependencies: agent-conformance
// ============================================================================

//! ## Overview
//! Live suites read the same `MASTER_AGENT_*` environment as the CLI. The only
//! difference is the evaluation dataset directory, which falls back to the
//! fixtures bundled under `tests/fixtures/eval_datasets`.

use std::path::PathBuf;

use agent_conformance::HarnessConfig;

/// Directory holding the bundled evaluation datasets.
#[must_use]
pub fn eval_fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/eval_datasets")
}

/// Loads the harness configuration for a live suite.
///
/// `MASTER_AGENT_EVAL_DIR` wins when set; otherwise the bundled fixtures are
/// used.
///
/// # Errors
///
/// Returns the configuration error message when the environment is invalid.
pub fn live_config() -> Result<HarnessConfig, String> {
    let mut config = HarnessConfig::load().map_err(|err| err.to_string())?;
    if config.eval_dir.is_none() {
        config.eval_dir = Some(eval_fixtures_dir());
    }
    Ok(config)
}
