// crates/agent-conformance/src/client.rs
// ============================================================================
// Module: HTTP Event Client
// Description: Thin client bound to the master agent HTTP API.
// Purpose: Submit events and fetch status snapshots with transcripts.
// Dependencies: reqwest, serde_json, tracing
// ============================================================================

//! ## Overview
//! [`EventClient`] is bound to one base URL and one request timeout. It never
//! retries: a single failed call is a single failure, so attribution stays
//! direct. Every exchange is appended to an in-memory transcript that test
//! suites persist as an artifact.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::Client;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::HarnessError;
use crate::wire::InfraEvent;
use crate::wire::StatusSnapshot;
use crate::wire::SubmissionAck;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Status snapshot endpoint.
pub const STATUS_PATH: &str = "/v0/agent/status";
/// Event submission endpoint.
pub const EVENTS_PATH: &str = "/v0/agent/events";
/// Maximum characters of a response body kept in error messages.
const MAX_BODY_PREVIEW_CHARS: usize = 2_048;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Recorded request/response pair.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    /// 1-based position in the transcript.
    pub sequence: u64,
    /// HTTP method.
    pub method: String,
    /// Request path relative to the base URL.
    pub path: String,
    /// JSON request body, when one was sent.
    pub request: Option<Value>,
    /// HTTP status, when a response arrived.
    pub status: Option<u16>,
    /// Response body (JSON when parseable, otherwise a string).
    pub response: Value,
    /// Transport error message, when the request failed.
    pub error: Option<String>,
}

/// Status code plus body of a submission response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply<T> {
    /// HTTP status code.
    pub status: u16,
    /// Decoded body; `None` when the status was not a success.
    pub body: Option<T>,
    /// Raw response text.
    pub raw: String,
}

impl<T> HttpReply<T> {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns true when the status is in the error range (>= 400).
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.status >= 400
    }
}

/// HTTP client for the master agent event API.
#[derive(Clone)]
pub struct EventClient {
    /// Base URL without trailing slash.
    base_url: String,
    /// Underlying reqwest client carrying the request timeout.
    client: Client,
    /// Shared transcript of every exchange.
    transcript: Arc<Mutex<Vec<TranscriptEntry>>>,
}

// ============================================================================
// SECTION: Client
// ============================================================================

impl EventClient {
    /// Creates a client bound to `base_url` with a fixed request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transport`] when the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, HarnessError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| HarnessError::Transport(format!("failed to build http client: {err}")))?;
        let base_url: String = base_url.into();
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            transcript: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns a snapshot of the transcript entries.
    #[must_use]
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.transcript.lock().map_or_else(|_| Vec::new(), |entries| entries.clone())
    }

    /// Submits a well-formed event.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transport`] on network failure and
    /// [`HarnessError::Decode`] when a success body is not an acknowledgement.
    pub async fn submit_event(
        &self,
        event: &InfraEvent,
    ) -> Result<HttpReply<SubmissionAck>, HarnessError> {
        let body = serde_json::to_value(event)
            .map_err(|err| HarnessError::Decode(format!("event serialization failed: {err}")))?;
        let (status, raw) = self.send(Method::POST, EVENTS_PATH, Some(body)).await?;
        let mut reply = HttpReply {
            status,
            body: None,
            raw,
        };
        if reply.is_success() {
            let ack: SubmissionAck = serde_json::from_str(&reply.raw).map_err(|err| {
                HarnessError::Decode(format!("invalid submission acknowledgement: {err}"))
            })?;
            reply.body = Some(ack);
        }
        Ok(reply)
    }

    /// Submits an arbitrary JSON body, used for malformed payloads.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transport`] on network failure.
    pub async fn submit_raw(&self, body: &Value) -> Result<HttpReply<Value>, HarnessError> {
        let (status, raw) = self.send(Method::POST, EVENTS_PATH, Some(body.clone())).await?;
        let decoded = serde_json::from_str(&raw).ok();
        let is_success = (200 .. 300).contains(&status);
        Ok(HttpReply {
            status,
            body: if is_success { decoded } else { None },
            raw,
        })
    }

    /// Fetches a fresh status snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Http`] for non-success statuses,
    /// [`HarnessError::Transport`] on network failure, and
    /// [`HarnessError::Decode`] when the body is not a snapshot.
    pub async fn status(&self) -> Result<StatusSnapshot, HarnessError> {
        let (status, raw) = self.send(Method::GET, STATUS_PATH, None).await?;
        if !(200 .. 300).contains(&status) {
            return Err(HarnessError::Http {
                status,
                body: preview(&raw),
            });
        }
        serde_json::from_str(&raw)
            .map_err(|err| HarnessError::Decode(format!("invalid status snapshot: {err}")))
    }

    /// Issues the status request and only checks for a success status.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transport`] on connect failure or timeout and
    /// [`HarnessError::Http`] for non-success statuses.
    pub async fn ping(&self) -> Result<u16, HarnessError> {
        let (status, raw) = self.send(Method::GET, STATUS_PATH, None).await?;
        if (200 .. 300).contains(&status) {
            Ok(status)
        } else {
            Err(HarnessError::Http {
                status,
                body: preview(&raw),
            })
        }
    }

    /// Sends one request and returns the status plus raw body text.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<(u16, String), HarnessError> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = &body {
            request = request.json(body);
        }
        debug!(method = %method, url = %url, "sending agent api request");
        let outcome = match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                response.text().await.map(|text| (status, text))
            }
            Err(err) => Err(err),
        };
        match outcome {
            Ok((status, text)) => {
                debug!(status, url = %url, "agent api responded");
                let response =
                    serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.clone()));
                self.record(method.as_str(), path, body, Some(status), response, None);
                Ok((status, text))
            }
            Err(err) => {
                let message = err.to_string();
                self.record(method.as_str(), path, body, None, Value::Null, Some(message.clone()));
                Err(HarnessError::Transport(format!("{method} {url} failed: {message}")))
            }
        }
    }

    /// Appends an exchange to the transcript.
    fn record(
        &self,
        method: &str,
        path: &str,
        request: Option<Value>,
        status: Option<u16>,
        response: Value,
        error: Option<String>,
    ) {
        let Ok(mut guard) = self.transcript.lock() else {
            return;
        };
        let sequence = u64::try_from(guard.len()).unwrap_or(u64::MAX).saturating_add(1);
        guard.push(TranscriptEntry {
            sequence,
            method: method.to_string(),
            path: path.to_string(),
            request,
            status,
            response,
            error,
        });
    }
}

/// Truncates a body for inclusion in error messages.
pub(crate) fn preview(raw: &str) -> String {
    raw.trim().chars().take(MAX_BODY_PREVIEW_CHARS).collect()
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
