// crates/agent-conformance/src/scenarios/convergence.rs
// ============================================================================
// Module: Convergence Scenarios
// Description: Submit, wait, snapshot, and check lower bounds.
// Purpose: Verify eventual side effects of the agent's own event processing.
// Dependencies: crate convergence, crate expect
// ============================================================================

//! ## Overview
//! Every scenario here follows the same shape: submit one event, wait with the
//! session [`WaitStrategy`], take a fresh snapshot, and check bounds. Floors
//! are 1 rather than an exact count because other submissions may have reached
//! the same service before or during the wait.

use super::expect_acknowledged;
use super::hex_token;
use crate::client::EventClient;
use crate::convergence::WaitStrategy;
use crate::convergence::await_convergence;
use crate::error::HarnessError;
use crate::expect::Expectations;
use crate::expect::expect_incidents_open;
use crate::expect::expect_queue_drained;
use crate::expect::expect_running;
use crate::expect::expect_total_events_at_least;
use crate::wire::InfraEvent;
use crate::wire::Severity;
use crate::wire::StatusSnapshot;

/// Largest queue depth tolerated after the window; concurrent runs may leave
/// one event in flight.
pub const MAX_RESIDUAL_QUEUE_DEPTH: i64 = 1;

/// Pushes a warning event and checks it reaches world state.
///
/// # Errors
///
/// Returns [`HarnessError`] when a request fails or a body cannot be decoded.
pub async fn push_event_updates_status(
    client: &EventClient,
    wait: WaitStrategy,
) -> Result<Expectations, HarnessError> {
    let event = InfraEvent::new(
        "k8s/node/worker-eval-1",
        "node-pressure",
        Severity::Warning,
        "Node worker-eval-1 is experiencing memory pressure",
    );
    let reply = client.submit_event(&event).await?;
    let mut expectations = Expectations::new();
    expectations.status_success("submit.status", reply.status);
    expectations.is_true("submit.queued", reply.body.as_ref().is_some_and(|ack| ack.queued));

    let converged = await_convergence(client, wait, |snapshot| {
        snapshot.running && total_events(snapshot) >= 1
    })
    .await?;
    expect_running(&mut expectations, &converged.snapshot);
    expect_total_events_at_least(&mut expectations, &converged.snapshot, 1);
    Ok(expectations)
}

/// Pushes a uniquely sourced critical event and checks an incident is open.
///
/// # Errors
///
/// Returns [`HarnessError`] when a request fails or a body cannot be decoded.
pub async fn push_critical_creates_incident(
    client: &EventClient,
    wait: WaitStrategy,
) -> Result<Expectations, HarnessError> {
    let name = format!("api-eval-{}", hex_token(6));
    let event = InfraEvent::new(
        format!("k8s/pod/staging/{name}"),
        "pod-crash",
        Severity::Critical,
        format!("Pod {name} in staging is OOMKilled"),
    );
    let reply = client.submit_event(&event).await?;
    let mut expectations = Expectations::new();
    expect_acknowledged(&mut expectations, &reply);

    let converged = await_convergence(client, wait, |snapshot| {
        active_incidents(snapshot) >= 1 && !snapshot.incidents.is_empty()
    })
    .await?;
    expect_incidents_open(&mut expectations, &converged.snapshot, 1);
    Ok(expectations)
}

/// Pushes an info event and checks the queue is drained, not merely accepting.
///
/// The wait requires `worldState.totalEvents` to pass the pre-submission
/// baseline, so poll mode cannot settle on a snapshot taken while nothing
/// new has been processed. On a shared agent another client's event can
/// still satisfy that floor first; the check stays a lower bound.
///
/// # Errors
///
/// Returns [`HarnessError`] when a request fails or a body cannot be decoded.
pub async fn queue_depth_drains(
    client: &EventClient,
    wait: WaitStrategy,
) -> Result<Expectations, HarnessError> {
    let baseline = total_events(&client.status().await?);
    let event = InfraEvent::new(
        "k8s/pod/default/drain-test",
        "pod-restart",
        Severity::Info,
        "Pod drain-test restarted",
    );
    let reply = client.submit_event(&event).await?;
    let mut expectations = Expectations::new();
    expectations.status_success("submit.status", reply.status);

    let floor = baseline.saturating_add(1);
    let converged = await_convergence(client, wait, |snapshot| {
        total_events(snapshot) >= floor && snapshot.queue.depth <= MAX_RESIDUAL_QUEUE_DEPTH
    })
    .await?;
    expect_total_events_at_least(&mut expectations, &converged.snapshot, floor);
    expect_queue_drained(&mut expectations, &converged.snapshot, MAX_RESIDUAL_QUEUE_DEPTH, 1);
    Ok(expectations)
}

/// Reads `worldState.totalEvents`, treating a missing world state as zero.
fn total_events(snapshot: &StatusSnapshot) -> i64 {
    snapshot.world_state.as_ref().map_or(0, |world| world.total_events)
}

/// Reads `worldState.activeIncidents`, treating a missing world state as zero.
fn active_incidents(snapshot: &StatusSnapshot) -> i64 {
    snapshot.world_state.as_ref().map_or(0, |world| world.active_incidents)
}
