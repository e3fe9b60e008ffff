// crates/agent-conformance/src/error.rs
// ============================================================================
// Module: Harness Errors
// Description: Error taxonomy for the conformance harness.
// Purpose: Keep failure attribution direct across transport, decode, and expectation failures.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! A single error enum is shared by every harness component. Unreachable
//! services are not represented here: the health gate turns them into a skip
//! outcome before any scenario runs.

use thiserror::Error;

/// Harness errors.
///
/// # Invariants
/// - Variants are stable for CLI error mapping and tests.
/// - String payloads may include untrusted server text.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
    /// Transport failure (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),
    /// Non-success HTTP status where success was required.
    #[error("http status {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Raw response body preview.
        body: String,
    },
    /// Response decoding failure.
    #[error("decode error: {0}")]
    Decode(String),
    /// Protocol-level failure (JSON-RPC error, malformed stream).
    #[error("protocol error: {0}")]
    Protocol(String),
    /// One or more violated expectations.
    #[error("expectation failed: {0}")]
    Expectation(String),
    /// Evaluation dataset failure (read, parse, or scoring threshold).
    #[error("dataset error: {0}")]
    Dataset(String),
}

impl From<reqwest::Error> for HarnessError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
