// system-tests/tests/helpers/timeouts.rs
// ============================================================================
// Module: System Test Timeouts
// Description: Suite-level timeout budget with an env override.
// Purpose: Bound whole live tests so a hung agent fails instead of stalling CI.
// ============================================================================

use std::env;
use std::future::Future;
use std::time::Duration;

const ENV_TIMEOUT_SECS: &str = "MASTER_AGENT_SYSTEM_TEST_TIMEOUT_SEC";

/// Returns the effective timeout, honoring `MASTER_AGENT_SYSTEM_TEST_TIMEOUT_SEC`.
/// The override acts as a minimum so explicitly longer budgets are kept.
pub fn resolve_timeout(requested: Duration) -> Result<Duration, String> {
    match env::var(ENV_TIMEOUT_SECS) {
        Ok(raw) => {
            let override_timeout =
                parse_timeout_secs(&raw).map_err(|err| format!("{ENV_TIMEOUT_SECS} {err}"))?;
            Ok(std::cmp::max(requested, override_timeout))
        }
        Err(_) => Ok(requested),
    }
}

/// Runs `future` within the resolved budget.
pub async fn within<F: Future>(requested: Duration, future: F) -> Result<F::Output, String> {
    let budget = resolve_timeout(requested)?;
    tokio::time::timeout(budget, future)
        .await
        .map_err(|_| format!("test exceeded its {} s budget", budget.as_secs()))
}

fn parse_timeout_secs(raw: &str) -> Result<Duration, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("must be a positive integer number of seconds".to_string());
    }
    let secs: u64 =
        trimmed.parse().map_err(|_| "must be a positive integer number of seconds".to_string())?;
    if secs == 0 {
        return Err("must be greater than zero".to_string());
    }
    Ok(Duration::from_secs(secs))
}
