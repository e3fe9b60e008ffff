// crates/agent-conformance/src/lib.rs
// ============================================================================
// Module: Agent Conformance Library
// Description: Black-box conformance harness for the master agent service.
// Purpose: Submit events, wait for convergence, and assert on observable state.
// Dependencies: reqwest, serde, tokio, tracing
// ============================================================================

//! ## Overview
//! The harness drives an already-running master agent from the outside. It
//! never manages the service: when the agent is unreachable the session
//! [`health::HealthGate`] skips every dependent check instead of failing it.
//!
//! Components:
//! - [`client::EventClient`] submits events and fetches status snapshots.
//! - [`scenarios`] names the submission, convergence, and validation checks.
//! - [`probe`] exercises the tool-call ingress path.
//! - [`a2a`] and [`eval`] replay evaluation datasets against the agent card.
//!
//! Assertions are lower bounds: the service is shared, so no check assumes
//! exclusive access to its counters.

pub mod a2a;
pub mod client;
pub mod config;
pub mod convergence;
pub mod error;
pub mod eval;
pub mod expect;
pub mod health;
pub mod probe;
pub mod scenarios;
pub mod session;
pub mod wire;

#[cfg(test)]
mod test_support;

pub use client::EventClient;
pub use config::HarnessConfig;
pub use convergence::WaitStrategy;
pub use error::HarnessError;
pub use health::GateOutcome;
pub use health::HealthGate;
pub use scenarios::ScenarioId;
pub use scenarios::ScenarioReport;
pub use scenarios::ScenarioStatus;
pub use session::ConformanceSession;
pub use session::SessionReport;
pub use session::SessionStart;
