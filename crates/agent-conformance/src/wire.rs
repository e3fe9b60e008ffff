// crates/agent-conformance/src/wire.rs
// ============================================================================
// Module: Wire Shapes
// Description: JSON shapes exchanged with the master agent HTTP API.
// Purpose: Decode status snapshots and acknowledgements; encode event payloads.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every type here is owned by the remote service and only consumed by the
//! harness. Decoding is deliberately lenient on optional fields so that a
//! snapshot missing `worldState` surfaces as a failed expectation rather than
//! a decode error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Event severity accepted by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational event.
    Info,
    /// Degraded but not failing.
    Warning,
    /// Failure expected to open an incident.
    Critical,
}

impl Severity {
    /// Returns the wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

/// Infrastructure event submitted to `POST /v0/agent/events`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfraEvent {
    /// Hierarchical source identifier, e.g. `k8s/pod/<namespace>/<name>`.
    pub source: String,
    /// Free-form event classification.
    #[serde(rename = "type")]
    pub kind: String,
    /// Event severity.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Optional raw payload forwarded verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Map<String, Value>>,
}

impl InfraEvent {
    /// Builds an event without a raw payload.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        kind: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            kind: kind.into(),
            severity,
            message: message.into(),
            raw: None,
        }
    }

    /// Attaches a raw payload entry.
    #[must_use]
    pub fn with_raw(mut self, key: impl Into<String>, value: Value) -> Self {
        self.raw.get_or_insert_with(Map::new).insert(key.into(), value);
        self
    }
}

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Synchronous acknowledgement for an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubmissionAck {
    /// True when the event was queued.
    #[serde(default)]
    pub queued: bool,
    /// Opaque identifier assigned by the service.
    #[serde(default)]
    pub id: Option<String>,
}

/// Incident record; structure is opaque to the harness.
pub type Incident = Value;

/// Point-in-time view of the agent's mutable state.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StatusSnapshot {
    /// Whether the agent reports itself as running.
    #[serde(default)]
    pub running: bool,
    /// Aggregate world state; absent while the agent is stopped.
    #[serde(rename = "worldState", default)]
    pub world_state: Option<WorldState>,
    /// Open incidents.
    #[serde(default)]
    pub incidents: Vec<Incident>,
    /// Queue counters.
    #[serde(default)]
    pub queue: QueueStatus,
}

/// Aggregate world-state counters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldState {
    /// Events processed over the service lifetime (non-decreasing).
    #[serde(default)]
    pub total_events: i64,
    /// Currently open incidents.
    #[serde(default)]
    pub active_incidents: i64,
    /// Events waiting to be processed.
    #[serde(default)]
    pub pending_events: i64,
    /// Free-form summary written by the agent.
    #[serde(default)]
    pub summary: String,
    /// Last update timestamp, when reported.
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// Event queue counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct QueueStatus {
    /// Current backlog size.
    #[serde(default)]
    pub depth: i64,
    /// Cumulative submissions processed.
    #[serde(default)]
    pub total: i64,
}
