// crates/agent-conformance/src/scenarios/mod.rs
// ============================================================================
// Module: Scenario Catalog
// Description: Named conformance scenarios and their reports.
// Purpose: Run submission, convergence, and validation scenarios uniformly.
// Dependencies: rand, serde, tracing
// ============================================================================

//! ## Overview
//! Each scenario obtains the shared [`EventClient`], submits input, optionally
//! waits for convergence, and records [`Expectations`]. Transport and decode
//! failures end a scenario early; violated expectations are all collected.
//! No scenario assumes exclusive access to the service's global state.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod convergence;
pub mod submission;
pub mod validation;


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::time::Instant;

use rand::Rng;
use serde::Serialize;
use tracing::info;
use tracing::warn;

use crate::client::EventClient;
use crate::convergence::WaitStrategy;
use crate::error::HarnessError;
use crate::expect::Check;
use crate::expect::Expectations;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Scenario family, mirroring the synchronous/asynchronous contract split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioGroup {
    /// Immediate acknowledgement contract.
    Submission,
    /// Eventual processing contract.
    Convergence,
    /// Rejection of malformed payloads.
    Validation,
}

/// Named scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    /// Critical event is acknowledged as queued with an id.
    PushCriticalEvent,
    /// Processed event is reflected in world state.
    PushEventUpdatesStatus,
    /// Critical event leads to an open incident.
    PushCriticalCreatesIncident,
    /// Queue drains after processing.
    QueueDepthDrains,
    /// Payload with only `source` is rejected.
    MissingRequiredFields,
    /// Payload without `source` is rejected.
    MissingSource,
    /// Payload without `type` is rejected.
    MissingType,
    /// Payload without `message` is rejected.
    MissingMessage,
    /// Payload with an empty `message` is rejected.
    EmptyMessage,
}

impl ScenarioId {
    /// Every scenario in execution order.
    pub const ALL: [Self; 9] = [
        Self::PushCriticalEvent,
        Self::PushEventUpdatesStatus,
        Self::PushCriticalCreatesIncident,
        Self::QueueDepthDrains,
        Self::MissingRequiredFields,
        Self::MissingSource,
        Self::MissingType,
        Self::MissingMessage,
        Self::EmptyMessage,
    ];

    /// Returns the stable scenario name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PushCriticalEvent => "push_critical_event",
            Self::PushEventUpdatesStatus => "push_event_updates_status",
            Self::PushCriticalCreatesIncident => "push_critical_creates_incident",
            Self::QueueDepthDrains => "queue_depth_drains",
            Self::MissingRequiredFields => "missing_required_fields",
            Self::MissingSource => "missing_source",
            Self::MissingType => "missing_type",
            Self::MissingMessage => "missing_message",
            Self::EmptyMessage => "empty_message",
        }
    }

    /// Returns the scenario family.
    #[must_use]
    pub const fn group(self) -> ScenarioGroup {
        match self {
            Self::PushCriticalEvent => ScenarioGroup::Submission,
            Self::PushEventUpdatesStatus
            | Self::PushCriticalCreatesIncident
            | Self::QueueDepthDrains => ScenarioGroup::Convergence,
            Self::MissingRequiredFields
            | Self::MissingSource
            | Self::MissingType
            | Self::MissingMessage
            | Self::EmptyMessage => ScenarioGroup::Validation,
        }
    }

    /// Parses a stable scenario name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == name)
    }
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Scenario verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    /// Every expectation held.
    Pass,
    /// An expectation failed or a request errored.
    Fail,
    /// Not run because the health gate skipped the session.
    Skip,
}

impl ScenarioStatus {
    /// Returns the stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Skip => "skip",
        }
    }
}

/// Outcome of a single scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Scenario that ran.
    pub scenario: ScenarioId,
    /// Scenario family.
    pub group: ScenarioGroup,
    /// Verdict.
    pub status: ScenarioStatus,
    /// Recorded checks, in evaluation order.
    pub checks: Vec<Check>,
    /// Request or decode error that ended the scenario early.
    pub error: Option<String>,
    /// Wall-clock duration in milliseconds.
    pub elapsed_ms: u128,
}

impl ScenarioReport {
    /// Builds a skipped report carrying the gate diagnostic.
    #[must_use]
    pub fn skipped(scenario: ScenarioId, reason: &str) -> Self {
        Self {
            scenario,
            group: scenario.group(),
            status: ScenarioStatus::Skip,
            checks: Vec::new(),
            error: Some(reason.to_string()),
            elapsed_ms: 0,
        }
    }

    /// Renders the failures as one line, empty when the scenario passed.
    #[must_use]
    pub fn failure_summary(&self) -> String {
        let mut out = String::new();
        for check in self.checks.iter().filter(|check| !check.passed) {
            let _ = write!(out, "{} ({}); ", check.label, check.detail);
        }
        if let Some(error) = &self.error {
            out.push_str(error);
        }
        out.trim_end_matches("; ").to_string()
    }

    /// Converts the report into a result for test assertions.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Expectation`] when the scenario failed.
    pub fn into_result(self) -> Result<Self, HarnessError> {
        match self.status {
            ScenarioStatus::Fail => Err(HarnessError::Expectation(format!(
                "{}: {}",
                self.scenario.as_str(),
                self.failure_summary()
            ))),
            ScenarioStatus::Pass | ScenarioStatus::Skip => Ok(self),
        }
    }
}

// ============================================================================
// SECTION: Execution
// ============================================================================

/// Runs one scenario against the shared client.
pub async fn run_scenario(
    scenario: ScenarioId,
    client: &EventClient,
    wait: WaitStrategy,
) -> ScenarioReport {
    let start = Instant::now();
    let outcome = match scenario {
        ScenarioId::PushCriticalEvent => submission::push_critical_event(client).await,
        ScenarioId::PushEventUpdatesStatus => {
            convergence::push_event_updates_status(client, wait).await
        }
        ScenarioId::PushCriticalCreatesIncident => {
            convergence::push_critical_creates_incident(client, wait).await
        }
        ScenarioId::QueueDepthDrains => convergence::queue_depth_drains(client, wait).await,
        ScenarioId::MissingRequiredFields => validation::missing_required_fields(client).await,
        ScenarioId::MissingSource => validation::missing_source(client).await,
        ScenarioId::MissingType => validation::missing_type(client).await,
        ScenarioId::MissingMessage => validation::missing_message(client).await,
        ScenarioId::EmptyMessage => validation::empty_message(client).await,
    };
    let elapsed_ms = start.elapsed().as_millis();
    let report = match outcome {
        Ok(expectations) => {
            let status = if expectations.all_passed() {
                ScenarioStatus::Pass
            } else {
                ScenarioStatus::Fail
            };
            ScenarioReport {
                scenario,
                group: scenario.group(),
                status,
                checks: expectations.checks().to_vec(),
                error: None,
                elapsed_ms,
            }
        }
        Err(err) => ScenarioReport {
            scenario,
            group: scenario.group(),
            status: ScenarioStatus::Fail,
            checks: Vec::new(),
            error: Some(err.to_string()),
            elapsed_ms,
        },
    };
    match report.status {
        ScenarioStatus::Pass => info!(scenario = scenario.as_str(), elapsed_ms, "scenario passed"),
        ScenarioStatus::Fail => warn!(
            scenario = scenario.as_str(),
            failures = %report.failure_summary(),
            "scenario failed"
        ),
        ScenarioStatus::Skip => info!(scenario = scenario.as_str(), "scenario skipped"),
    }
    report
}

// ============================================================================
// SECTION: Correlation Tokens
// ============================================================================

/// Returns `<prefix>-<8 lowercase hex chars>` unique per call.
#[must_use]
pub fn correlation_token(prefix: &str) -> String {
    format!("{prefix}-{}", hex_token(8))
}

/// Returns `len` random lowercase hex characters.
#[must_use]
pub fn hex_token(len: usize) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut rng = rand::thread_rng();
    (0 .. len).map(|_| char::from(HEX[rng.gen_range(0 .. HEX.len())])).collect()
}

/// Shared helper: records the acknowledgement contract for a submission.
pub(crate) fn expect_acknowledged(
    expectations: &mut Expectations,
    reply: &crate::client::HttpReply<crate::wire::SubmissionAck>,
) {
    expectations.status_success("submit.status", reply.status);
    let queued = reply.body.as_ref().is_some_and(|ack| ack.queued);
    expectations.is_true("submit.queued", queued);
    let id = reply.body.as_ref().and_then(|ack| ack.id.as_ref());
    expectations.present("submit.id", id);
}
