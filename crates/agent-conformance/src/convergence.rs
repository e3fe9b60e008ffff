// crates/agent-conformance/src/convergence.rs
// ============================================================================
// Module: Convergence Waits
// Description: Wait strategies for asynchronous side effects of the agent.
// Purpose: Bound the wait between a submission and the snapshot it is judged by.
// Dependencies: tokio, tracing
// ============================================================================

//! ## Overview
//! The agent processes submissions on its own schedule. Scenarios wait with a
//! [`WaitStrategy`] and then judge the last snapshot:
//! - [`WaitStrategy::FixedWindow`] sleeps once for the convergence window and
//!   takes a single snapshot.
//! - [`WaitStrategy::PollUntil`] takes snapshots every `interval` until the
//!   predicate holds or `timeout` elapses.
//!
//! Both strategies hand back the final snapshot even when the predicate never
//! held; callers still run their inequality checks on it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;
use std::time::Instant;

use tokio::time::sleep;
use tracing::debug;

use crate::client::EventClient;
use crate::error::HarnessError;
use crate::wire::StatusSnapshot;

// ============================================================================
// SECTION: Types
// ============================================================================

/// How long, and how, to wait for asynchronous processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Sleep once, then take one snapshot.
    FixedWindow(Duration),
    /// Poll until the predicate holds or the timeout elapses.
    PollUntil {
        /// Upper bound on the total wait.
        timeout: Duration,
        /// Delay between snapshots.
        interval: Duration,
    },
}

impl WaitStrategy {
    /// Returns the maximum time the strategy may spend waiting.
    #[must_use]
    pub const fn budget(&self) -> Duration {
        match self {
            Self::FixedWindow(window) => *window,
            Self::PollUntil {
                timeout, ..
            } => *timeout,
        }
    }

    /// Returns a stable label for reports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FixedWindow(_) => "fixed",
            Self::PollUntil {
                ..
            } => "poll",
        }
    }
}

/// Final snapshot plus wait bookkeeping.
#[derive(Debug, Clone)]
pub struct Converged {
    /// Last snapshot observed.
    pub snapshot: StatusSnapshot,
    /// Number of snapshots taken.
    pub polls: u32,
    /// Time spent from the start of the wait to the last snapshot.
    pub elapsed: Duration,
    /// Whether the predicate held on the last snapshot.
    pub predicate_met: bool,
}

// ============================================================================
// SECTION: Waits
// ============================================================================

/// Waits according to `strategy` and returns the final snapshot.
///
/// # Errors
///
/// Returns the first [`HarnessError`] raised by a status request; failed
/// snapshots are not retried.
pub async fn await_convergence<F>(
    client: &EventClient,
    strategy: WaitStrategy,
    predicate: F,
) -> Result<Converged, HarnessError>
where
    F: Fn(&StatusSnapshot) -> bool,
{
    let start = Instant::now();
    match strategy {
        WaitStrategy::FixedWindow(window) => {
            debug!(window_ms = window.as_millis(), "waiting fixed convergence window");
            sleep(window).await;
            let snapshot = client.status().await?;
            let predicate_met = predicate(&snapshot);
            Ok(Converged {
                snapshot,
                polls: 1,
                elapsed: start.elapsed(),
                predicate_met,
            })
        }
        WaitStrategy::PollUntil {
            timeout,
            interval,
        } => {
            let mut polls = 0u32;
            loop {
                let snapshot = client.status().await?;
                polls = polls.saturating_add(1);
                let elapsed = start.elapsed();
                let predicate_met = predicate(&snapshot);
                if predicate_met || elapsed >= timeout {
                    debug!(polls, predicate_met, "convergence polling finished");
                    return Ok(Converged {
                        snapshot,
                        polls,
                        elapsed,
                        predicate_met,
                    });
                }
                sleep(interval.min(timeout.saturating_sub(elapsed))).await;
            }
        }
    }
}

#[cfg(test)]
#[path = "convergence_tests.rs"]
mod tests;
