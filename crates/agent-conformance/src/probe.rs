// crates/agent-conformance/src/probe.rs
// ============================================================================
// Module: Tool-Call Probe
// Description: JSON-RPC client for the agent's tool-call ingress.
// Purpose: Exercise the alternate event path and report what each call returned.
// Dependencies: reqwest, serde, serde_json, tokio, tracing
// ============================================================================

//! ## Overview
//! The probe is diagnostic rather than assertive. Each call returns the
//! JSON-RPC `result` on success and `None` otherwise; non-success statuses,
//! JSON-RPC errors, and transport failures are logged and never raised.
//! [`run_probe`] performs the full walk (list, status, emit, wait, status,
//! recent events) and hands back a [`ProbeReport`] for suites that want to
//! compare the tool-call view with the HTTP snapshot.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use tokio::time::sleep;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::client::preview;
use crate::error::HarnessError;
use crate::scenarios::correlation_token;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// JSON-RPC endpoint path.
pub const MESSAGE_PATH: &str = "/message";
/// Wait between the emit and the second status call.
pub const DEFAULT_PROBE_WAIT: Duration = Duration::from_secs(3);
/// Tool name fragments the probe reports on.
pub const PROBE_TOOL_NEEDLES: [&str; 2] = ["master", "event"];
/// Status tool name.
pub const STATUS_TOOL: &str = "get_master_agent_status";
/// Event emission tool name.
pub const EMIT_TOOL: &str = "emit_event";
/// Recent events tool name.
pub const RECENT_EVENTS_TOOL: &str = "get_recent_events";
/// Limit passed to the recent events tool.
pub const RECENT_EVENTS_LIMIT: u64 = 10;

// ============================================================================
// SECTION: Client
// ============================================================================

/// Recorded JSON-RPC exchange.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeTranscriptEntry {
    /// 1-based position in the transcript.
    pub sequence: u64,
    /// JSON-RPC method.
    pub method: String,
    /// Request envelope.
    pub request: Value,
    /// HTTP status, when a response arrived.
    pub status: Option<u16>,
    /// Response body (JSON when parseable, otherwise a string).
    pub response: Value,
}

/// JSON-RPC client bound to `<base>/message`.
#[derive(Clone)]
pub struct ToolProbeClient {
    /// Full endpoint URL.
    endpoint: String,
    /// Underlying reqwest client.
    client: Client,
    /// Next JSON-RPC request id.
    next_id: Arc<AtomicU64>,
    /// Shared transcript.
    transcript: Arc<Mutex<Vec<ProbeTranscriptEntry>>>,
}

impl ToolProbeClient {
    /// Creates a probe client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transport`] when the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, HarnessError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| HarnessError::Transport(format!("failed to build http client: {err}")))?;
        Ok(Self {
            endpoint: format!("{}{MESSAGE_PATH}", base_url.trim_end_matches('/')),
            client,
            next_id: Arc::new(AtomicU64::new(1)),
            transcript: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Returns the JSON-RPC endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns a snapshot of the transcript entries.
    #[must_use]
    pub fn transcript(&self) -> Vec<ProbeTranscriptEntry> {
        self.transcript.lock().map_or_else(|_| Vec::new(), |entries| entries.clone())
    }

    /// Issues `tools/list`.
    pub async fn list_tools(&self) -> Option<Value> {
        self.rpc("tools/list", json!({})).await
    }

    /// Issues `tools/call` for `name` with `arguments`.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Option<Value> {
        self.rpc("tools/call", json!({ "name": name, "arguments": arguments })).await
    }

    /// Sends one JSON-RPC request and returns its `result`.
    async fn rpc(&self, method: &str, params: Value) -> Option<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(method, endpoint = %self.endpoint, "sending tool-call request");
        let response = match self.client.post(&self.endpoint).json(&request).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(method, endpoint = %self.endpoint, error = %err, "tool-call request failed");
                self.record(method, request, None, Value::String(err.to_string()));
                return None;
            }
        };
        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                warn!(method, status, error = %err, "tool-call response body unreadable");
                self.record(method, request, Some(status), Value::Null);
                return None;
            }
        };
        let body: Value =
            serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.clone()));
        self.record(method, request, Some(status), body.clone());
        if !(200 .. 300).contains(&status) {
            warn!(method, status, body = %preview(&text), "tool-call returned non-success status");
            return None;
        }
        if let Some(error) = body.get("error") {
            warn!(method, error = %error, "tool-call returned a json-rpc error");
            return None;
        }
        let result = body.get("result").cloned();
        if result.is_none() {
            warn!(method, "tool-call response carried no result");
        }
        result
    }

    /// Appends an exchange to the transcript.
    fn record(&self, method: &str, request: Value, status: Option<u16>, response: Value) {
        let Ok(mut guard) = self.transcript.lock() else {
            return;
        };
        let sequence = u64::try_from(guard.len()).unwrap_or(u64::MAX).saturating_add(1);
        guard.push(ProbeTranscriptEntry {
            sequence,
            method: method.to_string(),
            request,
            status,
            response,
        });
    }
}

// ============================================================================
// SECTION: Result Helpers
// ============================================================================

/// Returns the names of listed tools containing any of `needles`.
#[must_use]
pub fn filter_tools(list_result: &Value, needles: &[&str]) -> Vec<String> {
    list_result
        .get("tools")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|tool| tool.get("name").and_then(Value::as_str))
        .filter(|name| needles.iter().any(|needle| name.contains(needle)))
        .map(ToString::to_string)
        .collect()
}

/// Extracts the payload of a tool result.
///
/// `text` content is parsed as JSON when possible and returned as a string
/// otherwise; `json` content is returned as is. Only the first item counts.
#[must_use]
pub fn tool_payload(call_result: &Value) -> Option<Value> {
    let item = call_result.get("content")?.as_array()?.first()?;
    match item.get("type").and_then(Value::as_str) {
        Some("text") => {
            let text = item.get("text")?.as_str()?;
            Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
        }
        Some("json") => item.get("json").cloned(),
        _ => None,
    }
}

/// Returns true when a tool result is flagged as an error.
#[must_use]
pub fn is_tool_error(call_result: &Value) -> bool {
    call_result.get("isError").and_then(Value::as_bool).unwrap_or(false)
}

// ============================================================================
// SECTION: Probe Walk
// ============================================================================

/// Results of every probe step; `None` marks a step that failed.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    /// Endpoint probed.
    pub endpoint: String,
    /// Correlation token embedded in the emitted event message.
    pub token: String,
    /// Raw `tools/list` result.
    pub tools: Option<Value>,
    /// Listed tool names matching [`PROBE_TOOL_NEEDLES`].
    pub matching_tools: Vec<String>,
    /// Status tool result before the emit.
    pub status_before: Option<Value>,
    /// Emit tool result.
    pub emitted: Option<Value>,
    /// Status tool result after the wait.
    pub status_after: Option<Value>,
    /// Recent events tool result.
    pub recent_events: Option<Value>,
}

impl ProbeReport {
    /// Returns `worldState.totalEvents` reported by the status tool after the wait.
    #[must_use]
    pub fn observed_total_events(&self) -> Option<i64> {
        self.status_after.as_ref().and_then(status_total_events)
    }

    /// Returns true when the emit call succeeded at the tool level.
    #[must_use]
    pub fn emit_accepted(&self) -> bool {
        self.emitted.as_ref().is_some_and(|result| !is_tool_error(result))
    }

    /// Returns true when the recent events listing mentions the probe token.
    #[must_use]
    pub fn emitted_event_listed(&self) -> bool {
        self.recent_events
            .as_ref()
            .and_then(tool_payload)
            .is_some_and(|payload| payload.to_string().contains(&self.token))
    }

    /// Counts steps that produced a result.
    #[must_use]
    pub fn completed_steps(&self) -> usize {
        [
            &self.tools,
            &self.status_before,
            &self.emitted,
            &self.status_after,
            &self.recent_events,
        ]
        .iter()
        .filter(|step| step.is_some())
        .count()
    }
}

/// Reads `worldState.totalEvents` from a status tool result.
fn status_total_events(call_result: &Value) -> Option<i64> {
    tool_payload(call_result)?.pointer("/worldState/totalEvents")?.as_i64()
}

/// Builds the probe event arguments.
#[must_use]
pub fn probe_event_arguments(token: &str) -> Value {
    json!({
        "type": "test-event",
        "message": format!("Testing MCP integration - simulated pod crash ({token})"),
        "severity": "warning",
        "source": "mcp-test-client",
    })
}

/// Runs the full probe walk.
pub async fn run_probe(client: &ToolProbeClient, wait: Duration) -> ProbeReport {
    let token = correlation_token("probe");
    let tools = client.list_tools().await;
    let matching_tools =
        tools.as_ref().map(|list| filter_tools(list, &PROBE_TOOL_NEEDLES)).unwrap_or_default();
    let status_before = client.call_tool(STATUS_TOOL, json!({})).await;
    let emitted = client.call_tool(EMIT_TOOL, probe_event_arguments(&token)).await;
    sleep(wait).await;
    let status_after = client.call_tool(STATUS_TOOL, json!({})).await;
    let recent_events =
        client.call_tool(RECENT_EVENTS_TOOL, json!({ "limit": RECENT_EVENTS_LIMIT })).await;
    let report = ProbeReport {
        endpoint: client.endpoint().to_string(),
        token,
        tools,
        matching_tools,
        status_before,
        emitted,
        status_after,
        recent_events,
    };
    info!(
        endpoint = %report.endpoint,
        completed = report.completed_steps(),
        emit_accepted = report.emit_accepted(),
        "tool-call probe finished"
    );
    report
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
