// system-tests/tests/suites/http_events.rs
// ============================================================================
// Module: HTTP Event Tests
// Description: Submission and convergence scenarios against the live agent.
// Purpose: Verify acknowledgement, world-state updates, incidents, and queue drain.
// Dependencies: system-tests helpers, agent-conformance
// ============================================================================

//! Live submission and convergence scenarios over the HTTP events API.

use std::ptr;

use agent_conformance::HealthGate;
use agent_conformance::ScenarioId;
use agent_conformance::expect::Expectations;
use agent_conformance::expect::expect_running;
use helpers::artifacts::TestReporter;
use helpers::session::Live;
use helpers::session::acquire;
use helpers::session::run_live_scenario;
use system_tests::live::live_config;

use crate::helpers;

#[tokio::test(flavor = "multi_thread")]
async fn push_critical_event_is_acknowledged() -> Result<(), Box<dyn std::error::Error>> {
    run_live_scenario("push_critical_event_is_acknowledged", ScenarioId::PushCriticalEvent).await
}

#[tokio::test(flavor = "multi_thread")]
async fn push_event_updates_status() -> Result<(), Box<dyn std::error::Error>> {
    run_live_scenario("push_event_updates_status", ScenarioId::PushEventUpdatesStatus).await
}

#[tokio::test(flavor = "multi_thread")]
async fn push_critical_creates_incident() -> Result<(), Box<dyn std::error::Error>> {
    run_live_scenario("push_critical_creates_incident", ScenarioId::PushCriticalCreatesIncident)
        .await
}

#[tokio::test(flavor = "multi_thread")]
async fn queue_depth_drains() -> Result<(), Box<dyn std::error::Error>> {
    run_live_scenario("queue_depth_drains", ScenarioId::QueueDepthDrains).await
}

#[tokio::test(flavor = "multi_thread")]
async fn status_snapshot_reports_running_agent() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("status_snapshot_reports_running_agent")?;
    let Live::Ready(session) = acquire(&mut reporter).await? else {
        return Ok(());
    };
    let snapshot = session.client().status().await?;
    reporter.artifacts().write_json("status.json", &snapshot)?;
    let mut expectations = Expectations::new();
    expect_running(&mut expectations, &snapshot);
    expectations.into_result()?;
    let total = snapshot.world_state.map_or(0, |world| world.total_events);
    reporter.finish(
        "pass",
        vec![format!("totalEvents observed: {total}")],
        vec!["summary.json".to_string(), "summary.md".to_string(), "status.json".to_string()],
    )?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn health_gate_outcome_is_stable_within_process() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("health_gate_outcome_is_stable_within_process")?;
    let config = live_config()?;
    let first = HealthGate::session(&config).await;
    let second = HealthGate::session(&config).await;
    assert!(ptr::eq(first, second), "gate must probe once per process");
    assert_eq!(first, second);
    let note = first.skip_reason().map_or_else(|| "gate passed".to_string(), ToString::to_string);
    reporter.finish("pass", vec![note], Vec::new())?;
    Ok(())
}
