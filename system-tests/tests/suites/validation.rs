// system-tests/tests/suites/validation.rs
// ============================================================================
// Module: Validation Tests
// Description: Malformed submissions against the live events endpoint.
// Purpose: Ensure the agent rejects payloads missing required fields.
// Dependencies: system-tests helpers, agent-conformance
// ============================================================================

//! Live rejection checks for malformed event payloads.

use agent_conformance::ScenarioId;
use helpers::session::run_live_scenario;

use crate::helpers;

#[tokio::test(flavor = "multi_thread")]
async fn source_only_payload_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    run_live_scenario("source_only_payload_is_rejected", ScenarioId::MissingRequiredFields).await
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_source_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    run_live_scenario("missing_source_is_rejected", ScenarioId::MissingSource).await
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_type_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    run_live_scenario("missing_type_is_rejected", ScenarioId::MissingType).await
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_message_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    run_live_scenario("missing_message_is_rejected", ScenarioId::MissingMessage).await
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_message_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    run_live_scenario("empty_message_is_rejected", ScenarioId::EmptyMessage).await
}
