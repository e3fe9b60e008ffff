// crates/agent-conformance/src/a2a.rs
// ============================================================================
// Module: Agent-Card Client
// Description: Agent-card discovery and JSON-RPC conversation client.
// Purpose: Replay user turns against the agent and collect its reply and tool calls.
// Dependencies: reqwest, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! The agent publishes a card at `/.well-known/agent-card.json` naming the
//! JSON-RPC endpoint and whether it streams. [`A2aClient`] sends
//! `message/stream` when streaming is advertised and `message/send`
//! otherwise. Streaming responses are server-sent events whose `data:` lines
//! each carry one JSON-RPC response.
//!
//! Replies are reduced to an [`AgentTurn`]: the concatenated agent text and
//! the ordered tool calls. Text is read from messages, status-update messages,
//! and artifacts; tool calls are data parts tagged as function calls.
//!
//! Security posture: response bodies are untrusted and size-limited.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use tracing::debug;

use crate::client::preview;
use crate::error::HarnessError;
use crate::scenarios::hex_token;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Well-known agent-card path.
pub const AGENT_CARD_PATH: &str = "/.well-known/agent-card.json";
/// Maximum response body size accepted from the agent.
pub const MAX_A2A_RESPONSE_BYTES: usize = 4 * 1024 * 1024;
/// Metadata marker used for function-call data parts.
const FUNCTION_CALL_MARKER: &str = "function_call";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Published agent card; only the fields the harness uses are decoded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AgentCard {
    /// Agent name.
    pub name: String,
    /// Agent description.
    #[serde(default)]
    pub description: String,
    /// JSON-RPC endpoint URL.
    pub url: String,
    /// Advertised capabilities.
    #[serde(default)]
    pub capabilities: AgentCapabilities,
}

/// Capability flags from the agent card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AgentCapabilities {
    /// Whether `message/stream` is supported.
    #[serde(default)]
    pub streaming: bool,
}

/// Tool call observed in an agent reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCall {
    /// Tool name.
    pub name: String,
    /// Tool arguments.
    pub args: Value,
}

/// Reduced agent reply for one user turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentTurn {
    /// Agent text, parts joined with newlines.
    pub text: String,
    /// Tool calls in the order they were reported.
    pub tool_calls: Vec<ToolCall>,
    /// Number of JSON-RPC results folded into this turn.
    pub events: usize,
    /// Conversation context assigned by the agent, when reported.
    pub context_id: Option<String>,
}

impl AgentTurn {
    /// Returns the tool names in order.
    #[must_use]
    pub fn tool_names(&self) -> Vec<&str> {
        self.tool_calls.iter().map(|call| call.name.as_str()).collect()
    }

    /// Folds one JSON-RPC result into the turn.
    fn absorb(&mut self, result: &Value, seen_call_ids: &mut Vec<String>) {
        self.events = self.events.saturating_add(1);
        if self.context_id.is_none() {
            self.context_id = result.get("contextId").and_then(Value::as_str).map(str::to_string);
        }
        for parts in reply_parts(result) {
            for part in parts {
                self.absorb_part(part, seen_call_ids);
            }
        }
    }

    /// Folds one message part into the turn.
    fn absorb_part(&mut self, part: &Value, seen_call_ids: &mut Vec<String>) {
        if let Some(text) = part.get("text").and_then(Value::as_str) {
            if !self.text.is_empty() {
                self.text.push('\n');
            }
            self.text.push_str(text);
            return;
        }
        if !is_function_call(part) {
            return;
        }
        let Some(data) = part.get("data") else {
            return;
        };
        let Some(name) = data.get("name").and_then(Value::as_str) else {
            return;
        };
        if let Some(id) = data.get("id").and_then(Value::as_str) {
            if seen_call_ids.iter().any(|seen| seen == id) {
                return;
            }
            seen_call_ids.push(id.to_string());
        }
        self.tool_calls.push(ToolCall {
            name: name.to_string(),
            args: data.get("args").cloned().unwrap_or_else(|| json!({})),
        });
    }
}

// ============================================================================
// SECTION: Discovery
// ============================================================================

/// Fetches and decodes the agent card published under `base_url`.
///
/// # Errors
///
/// Returns [`HarnessError::Transport`] on network failure,
/// [`HarnessError::Http`] for non-success statuses, and
/// [`HarnessError::Decode`] when the card is malformed.
pub async fn fetch_agent_card(client: &Client, base_url: &str) -> Result<AgentCard, HarnessError> {
    let url = format!("{}{AGENT_CARD_PATH}", base_url.trim_end_matches('/'));
    debug!(url = %url, "fetching agent card");
    let response = client.get(&url).send().await?;
    let status = response.status().as_u16();
    let body = read_limited(response).await?;
    let text = String::from_utf8_lossy(&body);
    if !(200 .. 300).contains(&status) {
        return Err(HarnessError::Http {
            status,
            body: preview(&text),
        });
    }
    serde_json::from_str(&text)
        .map_err(|err| HarnessError::Decode(format!("invalid agent card at {url}: {err}")))
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// JSON-RPC client bound to the endpoint named by an agent card.
pub struct A2aClient {
    /// Discovered agent card.
    card: AgentCard,
    /// Underlying reqwest client.
    client: Client,
    /// Next JSON-RPC request id.
    next_id: AtomicU64,
}

impl A2aClient {
    /// Discovers the agent card under `base_url` and binds to its endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] when the client cannot be built or the card
    /// cannot be fetched.
    pub async fn discover(base_url: &str, timeout: Duration) -> Result<Self, HarnessError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| HarnessError::Transport(format!("failed to build http client: {err}")))?;
        let card = fetch_agent_card(&client, base_url).await?;
        debug!(agent = %card.name, streaming = card.capabilities.streaming, "agent card discovered");
        Ok(Self {
            card,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    /// Returns the discovered card.
    #[must_use]
    pub const fn card(&self) -> &AgentCard {
        &self.card
    }

    /// Sends one user turn and reduces the reply.
    ///
    /// Passing the `context_id` of an earlier turn continues that conversation.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transport`] on network failure,
    /// [`HarnessError::Http`] for non-success statuses, and
    /// [`HarnessError::Protocol`] for JSON-RPC errors or malformed streams.
    pub async fn send_text(
        &self,
        text: &str,
        context_id: Option<&str>,
    ) -> Result<AgentTurn, HarnessError> {
        let method =
            if self.card.capabilities.streaming { "message/stream" } else { "message/send" };
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": {
                "message": {
                    "kind": "message",
                    "role": "user",
                    "messageId": format!("msg-{}", hex_token(12)),
                    "parts": [{ "kind": "text", "text": text }],
                }
            },
        });
        if let Some(context_id) = context_id {
            request["params"]["message"]["contextId"] = Value::String(context_id.to_string());
        }
        let mut http = self.client.post(&self.card.url).json(&request);
        if self.card.capabilities.streaming {
            http = http.header(ACCEPT, "text/event-stream");
        }
        debug!(method, url = %self.card.url, "sending agent message");
        let response = http.send().await?;
        let status = response.status().as_u16();
        let is_sse = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("text/event-stream"));
        let body = read_limited(response).await?;
        if !(200 .. 300).contains(&status) {
            return Err(HarnessError::Http {
                status,
                body: preview(&String::from_utf8_lossy(&body)),
            });
        }
        let envelopes = if is_sse {
            parse_sse_events(&body)?
                .iter()
                .map(|data| decode_envelope(data))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            vec![decode_envelope(&String::from_utf8_lossy(&body))?]
        };
        let mut turn = AgentTurn::default();
        let mut seen_call_ids = Vec::new();
        for envelope in envelopes {
            let result = jsonrpc_result(envelope)?;
            turn.absorb(&result, &mut seen_call_ids);
        }
        Ok(turn)
    }
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Reads a response body up to [`MAX_A2A_RESPONSE_BYTES`].
async fn read_limited(mut response: reqwest::Response) -> Result<Vec<u8>, HarnessError> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len().saturating_add(chunk.len()) > MAX_A2A_RESPONSE_BYTES {
            return Err(HarnessError::Protocol(format!(
                "agent response exceeds {MAX_A2A_RESPONSE_BYTES} bytes"
            )));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Splits an SSE body into event payloads, joining multi-line `data:` fields.
///
/// # Errors
///
/// Returns [`HarnessError::Protocol`] when the body is not UTF-8 or carries no
/// `data:` lines.
pub fn parse_sse_events(body: &[u8]) -> Result<Vec<String>, HarnessError> {
    let text = std::str::from_utf8(body)
        .map_err(|_| HarnessError::Protocol("sse response was not valid utf-8".to_string()))?;
    let mut events = Vec::new();
    let mut data_lines: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.is_empty() {
            if !data_lines.is_empty() {
                events.push(data_lines.join("\n"));
                data_lines.clear();
            }
            continue;
        }
        if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.trim_start());
        }
    }
    if !data_lines.is_empty() {
        events.push(data_lines.join("\n"));
    }
    if events.is_empty() {
        return Err(HarnessError::Protocol("sse response missing data".to_string()));
    }
    Ok(events)
}

/// Decodes one JSON-RPC envelope.
fn decode_envelope(text: &str) -> Result<Value, HarnessError> {
    serde_json::from_str(text)
        .map_err(|err| HarnessError::Protocol(format!("invalid json-rpc response: {err}")))
}

/// Extracts `result` from an envelope, mapping JSON-RPC errors.
fn jsonrpc_result(mut envelope: Value) -> Result<Value, HarnessError> {
    if let Some(error) = envelope.get("error") {
        let message = error.get("message").and_then(Value::as_str).unwrap_or("unknown error");
        return Err(HarnessError::Protocol(format!("agent returned json-rpc error: {message}")));
    }
    envelope
        .get_mut("result")
        .map(Value::take)
        .ok_or_else(|| HarnessError::Protocol("json-rpc response missing result".to_string()))
}

/// Returns the agent-authored part lists carried by one result.
fn reply_parts(result: &Value) -> Vec<&Vec<Value>> {
    let mut candidates: Vec<Option<&Value>> = Vec::new();
    match result.get("kind").and_then(Value::as_str) {
        Some("message") => {
            if result.get("role").and_then(Value::as_str) != Some("user") {
                candidates.push(result.get("parts"));
            }
        }
        Some("status-update") => candidates.push(result.pointer("/status/message/parts")),
        Some("artifact-update") => candidates.push(result.pointer("/artifact/parts")),
        Some("task") => {
            candidates.push(result.pointer("/status/message/parts"));
            if let Some(artifacts) = result.get("artifacts").and_then(Value::as_array) {
                candidates.extend(artifacts.iter().map(|artifact| artifact.get("parts")));
            }
        }
        _ => {}
    }
    candidates.into_iter().flatten().filter_map(Value::as_array).collect()
}

/// Returns true for data parts tagged as function calls.
fn is_function_call(part: &Value) -> bool {
    let tagged = |value: Option<&Value>| {
        value.and_then(Value::as_str).is_some_and(|kind| kind.ends_with(FUNCTION_CALL_MARKER))
    };
    part.get("kind").and_then(Value::as_str) == Some("data")
        && (tagged(part.pointer("/metadata/adk_type")) || tagged(part.pointer("/metadata/type")))
}

#[cfg(test)]
#[path = "a2a_tests.rs"]
mod tests;
