// crates/agent-conformance/src/scenarios/submission.rs
// ============================================================================
// Module: Submission Scenarios
// Description: Synchronous acknowledgement checks for event submission.
// Purpose: Verify "accepted for processing" without waiting for processing.
// Dependencies: crate client, crate wire
// ============================================================================

//! Submission scenarios assert only on the immediate response.

use super::correlation_token;
use super::expect_acknowledged;
use crate::client::EventClient;
use crate::error::HarnessError;
use crate::expect::Expectations;
use crate::wire::InfraEvent;
use crate::wire::Severity;

/// Source used by the critical submission scenario.
pub const CRITICAL_EVENT_SOURCE: &str = "k8s/pod/production/nginx-eval";

/// Builds the critical pod-crash event tagged with a fresh token.
#[must_use]
pub fn critical_pod_crash_event() -> InfraEvent {
    let token = correlation_token("eval");
    InfraEvent::new(
        CRITICAL_EVENT_SOURCE,
        "pod-crash",
        Severity::Critical,
        format!("Pod nginx-eval in production is CrashLoopBackOff (eval {token})"),
    )
}

/// Pushes a critical event and checks status, `queued`, and `id` at once.
///
/// # Errors
///
/// Returns [`HarnessError`] when the request fails or the ack cannot be decoded.
pub async fn push_critical_event(client: &EventClient) -> Result<Expectations, HarnessError> {
    let reply = client.submit_event(&critical_pod_crash_event()).await?;
    let mut expectations = Expectations::new();
    expect_acknowledged(&mut expectations, &reply);
    Ok(expectations)
}
