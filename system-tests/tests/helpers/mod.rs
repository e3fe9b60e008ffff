// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared helpers for live master agent suites.
// Purpose: Provide gated sessions, artifact reporting, and timeout overrides.
// Dependencies: system-tests, agent-conformance
// ============================================================================

//! ## Overview
//! Shared helpers for the live-service suites.
//! Invariants:
//! - An unreachable agent skips the suite with a recorded summary; it never
//!   fails it.
//! - Every test writes `summary.json` and `summary.md`, even on panic.

#![allow(dead_code, reason = "Shared helpers are reused across multiple test suites.")]

pub mod timeouts;
