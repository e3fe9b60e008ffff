// crates/agent-conformance/src/scenarios/validation.rs
// ============================================================================
// Module: Validation Scenarios
// Description: Negative submissions that the service must reject.
// Purpose: Assert malformed payloads yield an error-range status.
// Dependencies: serde_json
// ============================================================================

//! Validation scenarios only require "not success": any status >= 400 passes.

use serde_json::Value;
use serde_json::json;

use crate::client::EventClient;
use crate::error::HarnessError;
use crate::expect::Expectations;

/// Payload carrying only `source`.
#[must_use]
pub fn missing_required_fields_payload() -> Value {
    json!({ "source": "test" })
}

/// Payload without `source`.
#[must_use]
pub fn missing_source_payload() -> Value {
    json!({ "type": "test", "severity": "info", "message": "no source" })
}

/// Payload without `type`.
#[must_use]
pub fn missing_type_payload() -> Value {
    json!({ "source": "test", "severity": "info", "message": "no type" })
}

/// Payload without `message`.
#[must_use]
pub fn missing_message_payload() -> Value {
    json!({ "source": "test", "type": "test", "severity": "info" })
}

/// Payload with an empty `message`.
#[must_use]
pub fn empty_message_payload() -> Value {
    json!({ "source": "test", "type": "test", "message": "" })
}

/// Submits `payload` and requires an error-range status.
async fn expect_rejected(
    client: &EventClient,
    label: &str,
    payload: &Value,
) -> Result<Expectations, HarnessError> {
    let reply = client.submit_raw(payload).await?;
    let mut expectations = Expectations::new();
    expectations.status_error(label, reply.status);
    Ok(expectations)
}

/// Rejects a payload missing `type` and `message`.
///
/// # Errors
///
/// Returns [`HarnessError::Transport`] when the request fails.
pub async fn missing_required_fields(client: &EventClient) -> Result<Expectations, HarnessError> {
    expect_rejected(client, "reject.missing_type_and_message", &missing_required_fields_payload())
        .await
}

/// Rejects a payload missing `source`.
///
/// # Errors
///
/// Returns [`HarnessError::Transport`] when the request fails.
pub async fn missing_source(client: &EventClient) -> Result<Expectations, HarnessError> {
    expect_rejected(client, "reject.missing_source", &missing_source_payload()).await
}

/// Rejects a payload missing `type`.
///
/// # Errors
///
/// Returns [`HarnessError::Transport`] when the request fails.
pub async fn missing_type(client: &EventClient) -> Result<Expectations, HarnessError> {
    expect_rejected(client, "reject.missing_type", &missing_type_payload()).await
}

/// Rejects a payload missing only `message`.
///
/// # Errors
///
/// Returns [`HarnessError::Transport`] when the request fails.
pub async fn missing_message(client: &EventClient) -> Result<Expectations, HarnessError> {
    expect_rejected(client, "reject.missing_message", &missing_message_payload()).await
}

/// Rejects a payload with an empty `message`.
///
/// # Errors
///
/// Returns [`HarnessError::Transport`] when the request fails.
pub async fn empty_message(client: &EventClient) -> Result<Expectations, HarnessError> {
    expect_rejected(client, "reject.empty_message", &empty_message_payload()).await
}
