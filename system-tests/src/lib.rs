// system-tests/src/lib.rs
// ============================================================================
// Module: Conformance System Tests Library
// Description: Shared configuration lookups for live-service system tests.
// Purpose: Resolve harness configuration and fixture locations for test binaries.
// Dependencies: agent-conformance
// ============================================================================

//! ## Overview
//! This crate hosts the live-service suites in `system-tests/tests`. Every
//! suite targets a running master agent; suites are compiled only with the
//! `system-tests` feature and skip cleanly when the Health Gate cannot reach
//! the agent.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod live;
