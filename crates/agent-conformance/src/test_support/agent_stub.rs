// crates/agent-conformance/src/test_support/agent_stub.rs
// ============================================================================
// Module: Agent Stub
// Description: In-process stand-in for the master agent service.
// Purpose: Exercise the harness against HTTP, tool-call, and agent-card endpoints.
// Dependencies: axum, tokio, serde_json
// ============================================================================

//! ## Overview
//! The stub accepts events into a pending queue and a background task drains
//! it on a fixed interval, so status snapshots lag submissions the way the
//! real agent's do. Critical events open incidents when processed. The same
//! queue backs `POST /message` tool calls, and `/a2a` answers agent-card
//! conversations with a deterministic reply.

use std::collections::VecDeque;
use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde_json::Value;
use serde_json::json;
use tokio::runtime::Builder;
use tokio::sync::oneshot;
use tokio::time::sleep;

/// Maximum number of recent events retained.
const MAX_RECENT_EVENTS: usize = 100;

/// Stub behavior knobs.
#[derive(Debug, Clone)]
pub struct StubOptions {
    /// Delay between queue drains.
    pub drain_interval: Duration,
    /// Status code served by `GET /v0/agent/status`.
    pub status_code: u16,
    /// Whether the agent reports itself as running.
    pub running: bool,
    /// Status code served by `POST /message`.
    pub message_status: u16,
    /// Whether the agent card advertises streaming.
    pub streaming: bool,
    /// Whether the background task drains the pending queue.
    pub drain: bool,
    /// Whether processed critical events open incidents.
    pub open_incidents: bool,
    /// Whether an absent `message` is rejected; otherwise it is defaulted.
    pub require_message: bool,
}

impl Default for StubOptions {
    fn default() -> Self {
        Self {
            drain_interval: Duration::from_millis(50),
            status_code: 200,
            running: true,
            message_status: 200,
            streaming: true,
            drain: true,
            open_incidents: true,
            require_message: true,
        }
    }
}

/// Mutable agent state shared by handlers and the drain task.
#[derive(Debug, Default)]
struct AgentState {
    /// Events accepted but not yet processed.
    pending: VecDeque<Value>,
    /// Events accepted over the stub lifetime.
    accepted: i64,
    /// Events processed over the stub lifetime.
    processed: i64,
    /// Incidents opened by critical events.
    incidents: Vec<Value>,
    /// Most recent accepted events, oldest first.
    recent: VecDeque<Value>,
    /// Last assigned event sequence.
    next_id: u64,
}

/// Router state.
#[derive(Clone)]
struct StubState {
    /// Behavior knobs.
    options: StubOptions,
    /// Shared agent state.
    agent: Arc<Mutex<AgentState>>,
    /// URL advertised in the agent card.
    card_url: String,
}

/// Handle for the stub server; shuts it down on drop.
pub struct AgentStubHandle {
    /// Base URL without trailing slash.
    base_url: String,
    /// Shutdown trigger for the server thread.
    shutdown: Option<oneshot::Sender<()>>,
    /// Server thread.
    join: Option<thread::JoinHandle<()>>,
    /// Shared agent state.
    agent: Arc<Mutex<AgentState>>,
}

impl AgentStubHandle {
    /// Returns the stub base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the number of events accepted so far.
    pub fn accepted(&self) -> i64 {
        self.agent.lock().map_or(0, |agent| agent.accepted)
    }

    /// Returns the number of events processed so far.
    pub fn processed(&self) -> i64 {
        self.agent.lock().map_or(0, |agent| agent.processed)
    }
}

impl Drop for AgentStubHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Spawns a stub with default options.
pub fn spawn_agent_stub() -> Result<AgentStubHandle, String> {
    spawn_agent_stub_with(StubOptions::default())
}

/// Spawns a stub on an ephemeral local port.
pub fn spawn_agent_stub_with(options: StubOptions) -> Result<AgentStubHandle, String> {
    let listener = StdTcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("agent stub bind failed: {err}"))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("agent stub listener nonblocking failed: {err}"))?;
    let addr =
        listener.local_addr().map_err(|err| format!("agent stub local addr failed: {err}"))?;
    let base_url = format!("http://{addr}");

    let agent = Arc::new(Mutex::new(AgentState::default()));
    let drain = options.drain.then_some((options.drain_interval, options.open_incidents));
    let state = StubState {
        options,
        agent: Arc::clone(&agent),
        card_url: format!("{base_url}/a2a"),
    };
    let app = Router::new()
        .route("/v0/agent/status", get(handle_status))
        .route("/v0/agent/events", post(handle_push))
        .route("/message", post(handle_message))
        .route("/.well-known/agent-card.json", get(handle_card))
        .route("/a2a", post(handle_a2a))
        .with_state(state);
    let drain_agent = Arc::clone(&agent);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let join = thread::spawn(move || {
        let Ok(runtime) = Builder::new_current_thread().enable_all().build() else {
            return;
        };
        runtime.block_on(async move {
            let Ok(listener) = tokio::net::TcpListener::from_std(listener) else {
                return;
            };
            if let Some((interval, open_incidents)) = drain {
                tokio::spawn(drain_loop(drain_agent, interval, open_incidents));
            }
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });
    });
    Ok(AgentStubHandle {
        base_url,
        shutdown: Some(shutdown_tx),
        join: Some(join),
        agent,
    })
}

// ============================================================================
// SECTION: Processing
// ============================================================================

/// Drains the pending queue on a fixed interval.
async fn drain_loop(agent: Arc<Mutex<AgentState>>, interval: Duration, open_incidents: bool) {
    loop {
        sleep(interval).await;
        let Ok(mut state) = agent.lock() else {
            return;
        };
        while let Some(event) = state.pending.pop_front() {
            state.processed += 1;
            let critical = event.get("severity").and_then(Value::as_str) == Some("critical");
            if open_incidents && critical {
                let id = format!("inc-{}", state.incidents.len() + 1);
                state.incidents.push(json!({
                    "id": id,
                    "severity": "critical",
                    "source": event.get("source").cloned().unwrap_or(Value::Null),
                    "summary": event.get("message").cloned().unwrap_or(Value::Null),
                    "status": "open",
                }));
            }
        }
    }
}

/// Validates an event payload and fills defaults.
///
/// With `require_message` off, an absent `message` defaults; an empty one is
/// still rejected.
fn normalize_event(
    body: &Value,
    default_source: Option<&str>,
    require_message: bool,
) -> Result<Value, String> {
    let field = |name: &str| body.get(name).and_then(Value::as_str).filter(|value| !value.is_empty());
    let source = field("source").or(default_source).ok_or("source is required")?;
    let kind = field("type").ok_or("type is required")?;
    let message = match body.get("message") {
        None if !require_message => "no message",
        _ => field("message").ok_or("message is required")?,
    };
    let severity = field("severity").unwrap_or("info");
    if !matches!(severity, "info" | "warning" | "critical") {
        return Err("severity must be info, warning, or critical".to_string());
    }
    Ok(json!({
        "source": source,
        "type": kind,
        "severity": severity,
        "message": message,
    }))
}

/// Queues a normalized event and returns its id.
fn enqueue(agent: &mut AgentState, mut event: Value) -> String {
    agent.next_id += 1;
    let id = format!("evt-{}", agent.next_id);
    if let Some(map) = event.as_object_mut() {
        map.insert("id".to_string(), Value::String(id.clone()));
    }
    agent.accepted += 1;
    agent.recent.push_back(event.clone());
    while agent.recent.len() > MAX_RECENT_EVENTS {
        agent.recent.pop_front();
    }
    agent.pending.push_back(event);
    id
}

/// Renders the world-state block.
fn world_state(agent: &AgentState) -> Value {
    json!({
        "lastUpdated": "2026-01-01T00:00:00Z",
        "summary": format!("{} events processed", agent.processed),
        "totalEvents": agent.processed,
        "pendingEvents": agent.pending.len(),
        "activeIncidents": agent.incidents.len(),
    })
}

// ============================================================================
// SECTION: HTTP API
// ============================================================================

/// `GET /v0/agent/status`.
async fn handle_status(State(state): State<StubState>) -> Response {
    if state.options.status_code != 200 {
        let status = StatusCode::from_u16(state.options.status_code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, "stub status failure").into_response();
    }
    let agent = state.agent.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    let mut body = json!({
        "running": state.options.running,
        "incidents": agent.incidents,
        "queue": { "depth": agent.pending.len(), "total": agent.accepted },
    });
    if state.options.running {
        body["worldState"] = world_state(&agent);
    }
    Json(body).into_response()
}

/// `POST /v0/agent/events`.
async fn handle_push(State(state): State<StubState>, Json(body): Json<Value>) -> Response {
    if !state.options.running {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": "agent not running" })))
            .into_response();
    }
    match normalize_event(&body, None, state.options.require_message) {
        Ok(event) => {
            let mut agent = state.agent.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let id = enqueue(&mut agent, event);
            (StatusCode::ACCEPTED, Json(json!({ "queued": true, "id": id }))).into_response()
        }
        Err(message) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
        }
    }
}

// ============================================================================
// SECTION: Tool Calls
// ============================================================================

/// `POST /message` JSON-RPC endpoint.
async fn handle_message(State(state): State<StubState>, Json(request): Json<Value>) -> Response {
    if state.options.message_status != 200 {
        let status = StatusCode::from_u16(state.options.message_status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, "stub tool failure").into_response();
    }
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request.get("method").and_then(Value::as_str).unwrap_or_default();
    let params = request.get("params").cloned().unwrap_or(Value::Null);
    let result = match method {
        "tools/list" => json!({
            "tools": [
                { "name": "get_master_agent_status", "description": "Agent status" },
                { "name": "emit_event", "description": "Queue an event" },
                { "name": "get_recent_events", "description": "Recent events" },
                { "name": "list_agents", "description": "Registry listing" },
            ]
        }),
        "tools/call" => call_tool(&state, &params),
        _ => {
            return Json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": "method not found" },
            }))
            .into_response();
        }
    };
    Json(json!({ "jsonrpc": "2.0", "id": id, "result": result })).into_response()
}

/// Dispatches one `tools/call`.
fn call_tool(state: &StubState, params: &Value) -> Value {
    let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
    let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
    let mut agent = state.agent.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    match name {
        "get_master_agent_status" => {
            let status = json!({
                "running": state.options.running,
                "worldState": world_state(&agent),
                "queueDepth": agent.pending.len(),
                "queueTotal": agent.processed,
            });
            text_result(&status.to_string(), false)
        }
        "emit_event" => {
            let normalized =
                normalize_event(&arguments, Some("mcp-client"), state.options.require_message);
            match normalized {
                Ok(event) => {
                    let id = enqueue(&mut agent, event);
                    text_result(&format!("Event emitted successfully\n\nEvent ID: {id}"), false)
                }
                Err(message) => text_result(&message, true),
            }
        }
        "get_recent_events" => {
            let limit = arguments
                .get("limit")
                .and_then(Value::as_u64)
                .and_then(|limit| usize::try_from(limit).ok())
                .filter(|limit| *limit >= 1)
                .unwrap_or(20)
                .min(MAX_RECENT_EVENTS);
            let skip = agent.recent.len().saturating_sub(limit);
            let events: Vec<Value> = agent.recent.iter().skip(skip).cloned().collect();
            text_result(&Value::Array(events).to_string(), false)
        }
        other => text_result(&format!("unknown tool {other}"), true),
    }
}

/// Builds a text tool result.
fn text_result(text: &str, is_error: bool) -> Value {
    json!({ "content": [{ "type": "text", "text": text }], "isError": is_error })
}

// ============================================================================
// SECTION: Agent Card
// ============================================================================

/// `GET /.well-known/agent-card.json`.
async fn handle_card(State(state): State<StubState>) -> Response {
    Json(json!({
        "name": "master-agent",
        "description": "Infrastructure triage agent",
        "url": state.card_url,
        "version": "0.1.0",
        "capabilities": { "streaming": state.options.streaming },
    }))
    .into_response()
}

/// `POST /a2a` JSON-RPC endpoint for `message/send` and `message/stream`.
async fn handle_a2a(Json(request): Json<Value>) -> Response {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request.get("method").and_then(Value::as_str).unwrap_or_default();
    let user_text = request
        .pointer("/params/message/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();
    let context_id = request
        .pointer("/params/message/contextId")
        .and_then(Value::as_str)
        .unwrap_or("ctx-1")
        .to_string();
    let reply = format!("Triage summary: {user_text}");
    let mut calls = vec![function_call_part("call-1", "get_master_agent_status")];
    if user_text.to_lowercase().contains("event") {
        calls.push(function_call_part("call-2", "get_recent_events"));
    }
    match method {
        "message/send" => {
            let mut parts = calls;
            parts.push(json!({ "kind": "text", "text": reply }));
            Json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "kind": "message", "role": "agent", "messageId": "m-1",
                    "contextId": context_id, "parts": parts,
                },
            }))
            .into_response()
        }
        "message/stream" => {
            let events = [
                json!({ "jsonrpc": "2.0", "id": id, "result": {
                    "kind": "status-update", "taskId": "task-1", "contextId": context_id, "final": false,
                    "status": { "state": "working", "message": {
                        "kind": "message", "role": "agent", "messageId": "m-1", "parts": calls,
                    }},
                }}),
                json!({ "jsonrpc": "2.0", "id": id, "result": {
                    "kind": "artifact-update", "taskId": "task-1",
                    "artifact": { "artifactId": "a-1", "parts": [{ "kind": "text", "text": reply }] },
                }}),
                json!({ "jsonrpc": "2.0", "id": id, "result": {
                    "kind": "status-update", "taskId": "task-1", "final": true,
                    "status": { "state": "completed" },
                }}),
            ];
            let body: String = events.iter().map(|event| format!("data: {event}\n\n")).collect();
            ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
        }
        _ => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32601, "message": "method not found" },
        }))
        .into_response(),
    }
}

/// Builds a function-call data part.
fn function_call_part(id: &str, name: &str) -> Value {
    json!({
        "kind": "data",
        "data": { "id": id, "name": name, "args": {} },
        "metadata": { "adk_type": "function_call" },
    })
}
