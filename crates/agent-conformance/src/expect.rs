// crates/agent-conformance/src/expect.rs
// ============================================================================
// Module: Expectations
// Description: Inequality and presence checks over acknowledgements and snapshots.
// Purpose: Assert only bounds that stay true under concurrent use of a shared service.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`Expectations`] collects every check of a scenario so one run reports all
//! violated expectations instead of stopping at the first. Counters are only
//! ever compared against floors or small ceilings; no helper asserts an exact
//! value of shared service state.

use serde::Serialize;

use crate::error::HarnessError;
use crate::wire::StatusSnapshot;

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    /// Short label naming the expectation.
    pub label: String,
    /// Whether the expectation held.
    pub passed: bool,
    /// Observed value and bound, for reports.
    pub detail: String,
}

/// Ordered collection of checks for one scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Expectations {
    /// Checks in evaluation order.
    checks: Vec<Check>,
}

impl Expectations {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            checks: Vec::new(),
        }
    }

    /// Records an arbitrary check.
    pub fn check(&mut self, label: impl Into<String>, passed: bool, detail: impl Into<String>) {
        self.checks.push(Check {
            label: label.into(),
            passed,
            detail: detail.into(),
        });
    }

    /// Requires `actual >= floor`.
    pub fn at_least(&mut self, label: impl Into<String>, actual: i64, floor: i64) {
        self.check(label, actual >= floor, format!("observed {actual}, expected >= {floor}"));
    }

    /// Requires `actual <= ceiling`.
    pub fn at_most(&mut self, label: impl Into<String>, actual: i64, ceiling: i64) {
        self.check(label, actual <= ceiling, format!("observed {actual}, expected <= {ceiling}"));
    }

    /// Requires a boolean to be true.
    pub fn is_true(&mut self, label: impl Into<String>, actual: bool) {
        self.check(label, actual, format!("observed {actual}, expected true"));
    }

    /// Requires an optional value to be present.
    pub fn present<T>(&mut self, label: impl Into<String>, value: Option<&T>) {
        let passed = value.is_some();
        self.check(label, passed, if passed { "present" } else { "missing" });
    }

    /// Requires a 2xx status code.
    pub fn status_success(&mut self, label: impl Into<String>, status: u16) {
        self.check(
            label,
            (200 .. 300).contains(&status),
            format!("observed status {status}, expected 2xx"),
        );
    }

    /// Requires a status in the error range; the exact code is not asserted.
    pub fn status_error(&mut self, label: impl Into<String>, status: u16) {
        self.check(label, status >= 400, format!("observed status {status}, expected >= 400"));
    }

    /// Returns every recorded check.
    #[must_use]
    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Returns the failed checks.
    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|check| !check.passed)
    }

    /// Returns true when every check passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }

    /// Converts the collection into a result listing every failure.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Expectation`] when any check failed.
    pub fn into_result(self) -> Result<Vec<Check>, HarnessError> {
        if self.all_passed() {
            return Ok(self.checks);
        }
        let message = self
            .failures()
            .map(|check| format!("{} ({})", check.label, check.detail))
            .collect::<Vec<_>>()
            .join("; ");
        Err(HarnessError::Expectation(message))
    }
}

// ============================================================================
// SECTION: Snapshot Checks
// ============================================================================

/// Checks `running == true`.
pub fn expect_running(expectations: &mut Expectations, snapshot: &StatusSnapshot) {
    expectations.is_true("status.running", snapshot.running);
}

/// Checks `worldState.totalEvents >= floor`; a missing world state fails.
pub fn expect_total_events_at_least(
    expectations: &mut Expectations,
    snapshot: &StatusSnapshot,
    floor: i64,
) {
    match &snapshot.world_state {
        Some(world) => expectations.at_least("worldState.totalEvents", world.total_events, floor),
        None => expectations.check("worldState.totalEvents", false, "worldState missing"),
    }
}

/// Checks `worldState.activeIncidents >= floor` and a non-empty incident list.
pub fn expect_incidents_open(
    expectations: &mut Expectations,
    snapshot: &StatusSnapshot,
    floor: i64,
) {
    match &snapshot.world_state {
        Some(world) => {
            expectations.at_least("worldState.activeIncidents", world.active_incidents, floor);
        }
        None => expectations.check("worldState.activeIncidents", false, "worldState missing"),
    }
    let listed = i64::try_from(snapshot.incidents.len()).unwrap_or(i64::MAX);
    expectations.at_least("incidents.len", listed, floor);
}

/// Checks the queue is drained to `max_depth` while `total >= min_total`.
pub fn expect_queue_drained(
    expectations: &mut Expectations,
    snapshot: &StatusSnapshot,
    max_depth: i64,
    min_total: i64,
) {
    expectations.at_most("queue.depth", snapshot.queue.depth, max_depth);
    expectations.at_least("queue.total", snapshot.queue.total, min_total);
}

#[cfg(test)]
#[path = "expect_tests.rs"]
mod tests;
