// crates/agent-conformance/src/health.rs
// ============================================================================
// Module: Health Gate
// Description: Session-scoped reachability precondition for the agent under test.
// Purpose: Turn "service absent" into a labeled skip instead of test failures.
// Dependencies: tokio, tracing
// ============================================================================

//! ## Overview
//! The gate probes `GET /v0/agent/status` once per process with a short
//! timeout. Connection errors, timeouts, and non-success statuses all map to
//! [`GateOutcome::Skip`] with a diagnostic naming the unreachable URL. The
//! first outcome is memoized for the remainder of the process; only the
//! pass/skip result is stored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::OnceLock;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::info;
use tracing::warn;

use crate::client::EventClient;
use crate::config::HarnessConfig;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Result of the session health probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// The agent answered the status probe with a success status.
    Pass,
    /// The agent is unreachable; dependents must skip.
    Skip {
        /// Diagnostic naming the URL and the failure.
        reason: String,
    },
}

impl GateOutcome {
    /// Returns the skip reason, if any.
    #[must_use]
    pub fn skip_reason(&self) -> Option<&str> {
        match self {
            Self::Pass => None,
            Self::Skip {
                reason,
            } => Some(reason),
        }
    }
}

/// Memoized health gate bound to one API URL.
///
/// The first call to [`HealthGate::outcome`] probes; later calls return the
/// stored outcome without touching the network.
#[derive(Debug)]
pub struct HealthGate {
    /// Base URL of the master agent HTTP API.
    api_url: String,
    /// Probe timeout.
    timeout: Duration,
    /// Outcome of the first probe.
    outcome: OnceCell<GateOutcome>,
}

/// Gate shared by the whole process.
static SESSION_GATE: OnceLock<HealthGate> = OnceLock::new();

impl HealthGate {
    /// Creates an unprobed gate.
    #[must_use]
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_url: api_url.into(),
            timeout,
            outcome: OnceCell::new(),
        }
    }

    /// Returns the memoized outcome, probing on first use only.
    pub async fn outcome(&self) -> &GateOutcome {
        self.outcome.get_or_init(|| probe_health(&self.api_url, self.timeout)).await
    }

    /// Returns true once a probe has completed.
    #[must_use]
    pub fn is_probed(&self) -> bool {
        self.outcome.initialized()
    }

    /// Returns the process-wide outcome, probing on first use only.
    ///
    /// Later calls return the first outcome even when given a different
    /// configuration; one process is one session.
    pub async fn session(config: &HarnessConfig) -> &'static GateOutcome {
        SESSION_GATE
            .get_or_init(|| Self::new(config.api_url.clone(), config.health_timeout))
            .outcome()
            .await
    }
}

// ============================================================================
// SECTION: Probe
// ============================================================================

/// Probes the status endpoint once without memoization.
pub async fn probe_health(api_url: &str, timeout: Duration) -> GateOutcome {
    let outcome = match EventClient::new(api_url, timeout) {
        Ok(client) => match client.ping().await {
            Ok(_) => GateOutcome::Pass,
            Err(err) => GateOutcome::Skip {
                reason: format!("master agent not reachable at {api_url}: {err}"),
            },
        },
        Err(err) => GateOutcome::Skip {
            reason: format!("master agent not reachable at {api_url}: {err}"),
        },
    };
    match &outcome {
        GateOutcome::Pass => info!(api_url, "master agent health probe passed"),
        GateOutcome::Skip {
            reason,
        } => warn!(api_url, reason = %reason, "master agent health probe failed; skipping session"),
    }
    outcome
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
