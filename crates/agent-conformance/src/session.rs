// crates/agent-conformance/src/session.rs
// ============================================================================
// Module: Conformance Session
// Description: One gated session sharing a single event client.
// Purpose: Run scenario batches and aggregate their reports.
// Dependencies: serde, tracing
// ============================================================================

//! ## Overview
//! A session is acquired through the health gate. When the gate skips, no
//! client is built and every requested scenario is reported as skipped with
//! the gate diagnostic. When it passes, one [`EventClient`] is shared by every
//! scenario of the session and scenarios run sequentially.

use serde::Serialize;
use tracing::info;

use crate::client::EventClient;
use crate::client::TranscriptEntry;
use crate::config::HarnessConfig;
use crate::convergence::WaitStrategy;
use crate::error::HarnessError;
use crate::health::GateOutcome;
use crate::health::HealthGate;
use crate::scenarios::ScenarioId;
use crate::scenarios::ScenarioReport;
use crate::scenarios::ScenarioStatus;
use crate::scenarios::run_scenario;

/// Outcome of acquiring a session.
pub enum SessionStart {
    /// The agent is reachable.
    Ready(ConformanceSession),
    /// The gate skipped the session.
    Skipped {
        /// Gate diagnostic naming the unreachable URL.
        reason: String,
    },
}

/// Gated session owning the shared event client.
pub struct ConformanceSession {
    /// Effective configuration.
    config: HarnessConfig,
    /// Client shared by every scenario of the session.
    client: EventClient,
}

impl ConformanceSession {
    /// Acquires a session through the process-wide gate.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transport`] when the client cannot be built.
    pub async fn acquire(config: HarnessConfig) -> Result<SessionStart, HarnessError> {
        let outcome = HealthGate::session(&config).await;
        Self::from_outcome(config, outcome)
    }

    /// Acquires a session through an explicit gate.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transport`] when the client cannot be built.
    pub async fn acquire_with(
        config: HarnessConfig,
        gate: &HealthGate,
    ) -> Result<SessionStart, HarnessError> {
        let outcome = gate.outcome().await;
        Self::from_outcome(config, outcome)
    }

    /// Builds the session for a known gate outcome.
    fn from_outcome(
        config: HarnessConfig,
        outcome: &GateOutcome,
    ) -> Result<SessionStart, HarnessError> {
        match outcome {
            GateOutcome::Pass => {
                let client = EventClient::new(config.api_url.clone(), config.request_timeout)?;
                Ok(SessionStart::Ready(Self {
                    config,
                    client,
                }))
            }
            GateOutcome::Skip {
                reason,
            } => Ok(SessionStart::Skipped {
                reason: reason.clone(),
            }),
        }
    }

    /// Returns the shared client.
    #[must_use]
    pub const fn client(&self) -> &EventClient {
        &self.client
    }

    /// Returns the effective configuration.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Returns the session wait strategy.
    #[must_use]
    pub const fn wait(&self) -> WaitStrategy {
        self.config.wait
    }

    /// Returns the transcript of the shared client.
    #[must_use]
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.client.transcript()
    }

    /// Runs `scenarios` in order and aggregates their reports.
    pub async fn run(&self, scenarios: &[ScenarioId]) -> SessionReport {
        let mut reports = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            reports.push(run_scenario(*scenario, &self.client, self.config.wait).await);
        }
        let report = SessionReport {
            api_url: self.config.api_url.clone(),
            wait_mode: self.config.wait.label(),
            skipped_reason: None,
            scenarios: reports,
        };
        info!(
            passed = report.count(ScenarioStatus::Pass),
            failed = report.count(ScenarioStatus::Fail),
            "conformance session finished"
        );
        report
    }
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Aggregated outcome of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    /// Base URL under test.
    pub api_url: String,
    /// Wait strategy label.
    pub wait_mode: &'static str,
    /// Gate diagnostic when the session was skipped.
    pub skipped_reason: Option<String>,
    /// Per-scenario reports in execution order.
    pub scenarios: Vec<ScenarioReport>,
}

impl SessionReport {
    /// Builds a report marking every scenario as skipped.
    #[must_use]
    pub fn skipped(config: &HarnessConfig, reason: &str, scenarios: &[ScenarioId]) -> Self {
        Self {
            api_url: config.api_url.clone(),
            wait_mode: config.wait.label(),
            skipped_reason: Some(reason.to_string()),
            scenarios: scenarios
                .iter()
                .map(|scenario| ScenarioReport::skipped(*scenario, reason))
                .collect(),
        }
    }

    /// Counts scenarios with the given status.
    #[must_use]
    pub fn count(&self, status: ScenarioStatus) -> usize {
        self.scenarios.iter().filter(|report| report.status == status).count()
    }

    /// Returns true when no scenario failed; skipped sessions count as passing.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.count(ScenarioStatus::Fail) == 0
    }

    /// Returns true when the gate skipped the session.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        self.skipped_reason.is_some()
    }
}
