// crates/agent-conformance/src/eval.rs
// ============================================================================
// Module: Agent Evaluation
// Description: Dataset-driven conversation replay with scored expectations.
// Purpose: Score tool-call trajectories and responses against thresholds.
// Dependencies: serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! An evaluation set is a JSON file of cases; each case is a conversation of
//! user turns with optional expectations. [`Evaluator::evaluate`] replays
//! every case `num_runs` times through an [`A2aClient`] and scores each turn:
//! - trajectory: 1.0 when the ordered tool names equal the expected names,
//!   0.0 otherwise;
//! - response: unigram overlap F1 between expected and actual text.
//!
//! A case passes when each metric's mean over its scored turns meets the
//! threshold. Turns without an expectation for a metric are not scored for it.
//! Request failures fail the case that hit them; dataset read and parse
//! failures are returned as errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use tracing::warn;

use crate::a2a::A2aClient;
use crate::error::HarnessError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default trajectory threshold (exact ordered match required).
pub const DEFAULT_TRAJECTORY_THRESHOLD: f64 = 1.0;
/// Default response-match threshold.
pub const DEFAULT_RESPONSE_THRESHOLD: f64 = 0.8;
/// Dataset file suffix.
pub const DATASET_SUFFIX: &str = ".test.json";
/// Datasets shipped with the system-tests fixtures.
pub const DEFAULT_DATASETS: [&str; 2] = ["triage_basic.test.json", "multi_event.test.json"];

// ============================================================================
// SECTION: Dataset Types
// ============================================================================

/// Evaluation set file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EvalSet {
    /// Stable set identifier.
    pub eval_set_id: String,
    /// Cases in replay order.
    pub eval_cases: Vec<EvalCase>,
}

/// One conversation to replay.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EvalCase {
    /// Stable case identifier.
    pub eval_id: String,
    /// User turns in order.
    pub conversation: Vec<EvalTurn>,
}

/// One user turn and its expectations.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EvalTurn {
    /// Text sent to the agent.
    pub user_content: String,
    /// Reference response, when the turn is response-scored.
    #[serde(default)]
    pub expected_response: Option<String>,
    /// Ordered tool names, when the turn is trajectory-scored.
    #[serde(default)]
    pub expected_tool_calls: Option<Vec<String>>,
}

/// Pass thresholds per metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvalCriteria {
    /// Minimum mean trajectory score.
    pub trajectory_threshold: f64,
    /// Minimum mean response score.
    pub response_threshold: f64,
}

impl Default for EvalCriteria {
    fn default() -> Self {
        Self {
            trajectory_threshold: DEFAULT_TRAJECTORY_THRESHOLD,
            response_threshold: DEFAULT_RESPONSE_THRESHOLD,
        }
    }
}

// ============================================================================
// SECTION: Report Types
// ============================================================================

/// Scores for one replayed turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnScore {
    /// Text sent to the agent.
    pub user_content: String,
    /// Agent text.
    pub actual_response: String,
    /// Tool names the agent reported.
    pub actual_tool_calls: Vec<String>,
    /// Trajectory score, when expected tool calls were given.
    pub trajectory: Option<f64>,
    /// Response score, when an expected response was given.
    pub response: Option<f64>,
}

/// Outcome of one case run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseResult {
    /// Case identifier.
    pub eval_id: String,
    /// 1-based run number.
    pub run: u32,
    /// Per-turn scores for the turns that completed.
    pub turns: Vec<TurnScore>,
    /// Mean trajectory score over scored turns.
    pub trajectory: Option<f64>,
    /// Mean response score over scored turns.
    pub response: Option<f64>,
    /// Whether every metric met its threshold.
    pub passed: bool,
    /// Request failure that ended the case early.
    pub error: Option<String>,
}

/// Outcome of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetReport {
    /// Evaluation set identifier.
    pub eval_set_id: String,
    /// Dataset file.
    pub path: PathBuf,
    /// Runs per case.
    pub num_runs: u32,
    /// Thresholds applied.
    pub criteria: EvalCriteria,
    /// Case results, grouped by run.
    pub cases: Vec<CaseResult>,
}

impl DatasetReport {
    /// Returns true when every case run passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.cases.iter().all(|case| case.passed)
    }

    /// Returns the failing case runs.
    pub fn failures(&self) -> impl Iterator<Item = &CaseResult> {
        self.cases.iter().filter(|case| !case.passed)
    }

    /// Converts the report into a result for test assertions.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Dataset`] naming every failing case run.
    pub fn into_result(self) -> Result<Self, HarnessError> {
        if self.passed() {
            return Ok(self);
        }
        let failed = self
            .failures()
            .map(describe_failure)
            .collect::<Vec<_>>()
            .join("; ");
        Err(HarnessError::Dataset(format!("{}: {failed}", self.eval_set_id)))
    }
}

/// Renders one failing case run.
fn describe_failure(case: &CaseResult) -> String {
    if let Some(error) = &case.error {
        return format!("{} run {}: {error}", case.eval_id, case.run);
    }
    format!(
        "{} run {}: trajectory {}, response {}",
        case.eval_id,
        case.run,
        format_score(case.trajectory),
        format_score(case.response)
    )
}

/// Formats an optional score for messages.
fn format_score(score: Option<f64>) -> String {
    score.map_or_else(|| "n/a".to_string(), |score| format!("{score:.3}"))
}

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Reads and parses an evaluation set.
///
/// # Errors
///
/// Returns [`HarnessError::Dataset`] when the file cannot be read or parsed,
/// or when it holds no cases.
pub fn load_eval_set(path: &Path) -> Result<EvalSet, HarnessError> {
    let bytes = fs::read(path).map_err(|err| {
        HarnessError::Dataset(format!("failed to read {}: {err}", path.display()))
    })?;
    let set: EvalSet = serde_json::from_slice(&bytes).map_err(|err| {
        HarnessError::Dataset(format!("invalid dataset {}: {err}", path.display()))
    })?;
    if set.eval_cases.is_empty() {
        return Err(HarnessError::Dataset(format!("dataset {} has no cases", path.display())));
    }
    Ok(set)
}

/// Expands a file or directory into dataset paths, sorted by name.
///
/// # Errors
///
/// Returns [`HarnessError::Dataset`] when the directory cannot be listed or
/// holds no `*.test.json` files.
pub fn dataset_paths(path: &Path) -> Result<Vec<PathBuf>, HarnessError> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let entries = fs::read_dir(path).map_err(|err| {
        HarnessError::Dataset(format!("failed to list {}: {err}", path.display()))
    })?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| {
            HarnessError::Dataset(format!("failed to list {}: {err}", path.display()))
        })?;
        let candidate = entry.path();
        let is_dataset = candidate
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(DATASET_SUFFIX));
        if is_dataset {
            paths.push(candidate);
        }
    }
    if paths.is_empty() {
        return Err(HarnessError::Dataset(format!(
            "no {DATASET_SUFFIX} files under {}",
            path.display()
        )));
    }
    paths.sort();
    Ok(paths)
}

// ============================================================================
// SECTION: Scoring
// ============================================================================

/// Returns 1.0 when `actual` equals `expected` in order, 0.0 otherwise.
#[must_use]
pub fn trajectory_score(expected: &[String], actual: &[String]) -> f64 {
    if expected == actual { 1.0 } else { 0.0 }
}

/// Returns the unigram overlap F1 between `expected` and `actual`.
///
/// Tokens are lowercase alphanumeric runs. Two empty texts score 1.0; one
/// empty text scores 0.0.
#[must_use]
pub fn response_score(expected: &str, actual: &str) -> f64 {
    let expected_tokens = tokenize(expected);
    let actual_tokens = tokenize(actual);
    if expected_tokens.is_empty() && actual_tokens.is_empty() {
        return 1.0;
    }
    if expected_tokens.is_empty() || actual_tokens.is_empty() {
        return 0.0;
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in &expected_tokens {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }
    let mut overlap = 0usize;
    for token in &actual_tokens {
        if let Some(count) = counts.get_mut(token.as_str())
            && *count > 0
        {
            *count -= 1;
            overlap += 1;
        }
    }
    if overlap == 0 {
        return 0.0;
    }
    let precision = ratio(overlap, actual_tokens.len());
    let recall = ratio(overlap, expected_tokens.len());
    2.0 * precision * recall / (precision + recall)
}

/// Splits text into lowercase alphanumeric tokens.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Divides two counts as floating point.
#[allow(clippy::cast_precision_loss, reason = "Token counts stay far below 2^52.")]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    numerator as f64 / denominator as f64
}

/// Returns the mean of the present scores.
fn mean(scores: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let present: Vec<f64> = scores.flatten().collect();
    if present.is_empty() {
        return None;
    }
    Some(present.iter().sum::<f64>() / ratio(present.len(), 1))
}

// ============================================================================
// SECTION: Evaluator
// ============================================================================

/// Replays datasets through an agent-card client.
pub struct Evaluator {
    /// Conversation client.
    client: A2aClient,
    /// Pass thresholds.
    criteria: EvalCriteria,
}

impl Evaluator {
    /// Creates an evaluator over an existing client.
    #[must_use]
    pub const fn new(client: A2aClient, criteria: EvalCriteria) -> Self {
        Self {
            client,
            criteria,
        }
    }

    /// Discovers the agent card under `a2a_url` and uses default thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] when discovery fails.
    pub async fn discover(a2a_url: &str, timeout: Duration) -> Result<Self, HarnessError> {
        let client = A2aClient::discover(a2a_url, timeout).await?;
        Ok(Self::new(client, EvalCriteria::default()))
    }

    /// Returns the thresholds in use.
    #[must_use]
    pub const fn criteria(&self) -> EvalCriteria {
        self.criteria
    }

    /// Replays every case of the dataset at `path` `num_runs` times.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Dataset`] when `num_runs` is zero or the
    /// dataset cannot be loaded. Scoring failures are reported, not raised.
    pub async fn evaluate(
        &self,
        path: &Path,
        num_runs: u32,
    ) -> Result<DatasetReport, HarnessError> {
        if num_runs == 0 {
            return Err(HarnessError::Dataset("num_runs must be positive".to_string()));
        }
        let set = load_eval_set(path)?;
        let mut cases = Vec::with_capacity(set.eval_cases.len());
        for run in 1 ..= num_runs {
            for case in &set.eval_cases {
                cases.push(self.run_case(case, run).await);
            }
        }
        let report = DatasetReport {
            eval_set_id: set.eval_set_id,
            path: path.to_path_buf(),
            num_runs,
            criteria: self.criteria,
            cases,
        };
        info!(
            eval_set = %report.eval_set_id,
            passed = report.passed(),
            cases = report.cases.len(),
            "evaluation dataset finished"
        );
        Ok(report)
    }

    /// Replays one case as a single conversation.
    async fn run_case(&self, case: &EvalCase, run: u32) -> CaseResult {
        let mut turns = Vec::with_capacity(case.conversation.len());
        let mut context_id: Option<String> = None;
        let mut error = None;
        for turn in &case.conversation {
            match self.client.send_text(&turn.user_content, context_id.as_deref()).await {
                Ok(reply) => {
                    if context_id.is_none() {
                        context_id.clone_from(&reply.context_id);
                    }
                    let actual_tool_calls: Vec<String> =
                        reply.tool_names().into_iter().map(str::to_string).collect();
                    turns.push(TurnScore {
                        user_content: turn.user_content.clone(),
                        trajectory: turn
                            .expected_tool_calls
                            .as_ref()
                            .map(|expected| trajectory_score(expected, &actual_tool_calls)),
                        response: turn
                            .expected_response
                            .as_ref()
                            .map(|expected| response_score(expected, &reply.text)),
                        actual_response: reply.text,
                        actual_tool_calls,
                    });
                }
                Err(err) => {
                    warn!(eval_id = %case.eval_id, run, error = %err, "evaluation turn failed");
                    error = Some(err.to_string());
                    break;
                }
            }
        }
        let trajectory = mean(turns.iter().map(|turn| turn.trajectory));
        let response = mean(turns.iter().map(|turn| turn.response));
        let passed = error.is_none()
            && trajectory.is_none_or(|score| score >= self.criteria.trajectory_threshold)
            && response.is_none_or(|score| score >= self.criteria.response_threshold);
        CaseResult {
            eval_id: case.eval_id.clone(),
            run,
            turns,
            trajectory,
            response,
            passed,
            error,
        }
    }
}

#[cfg(test)]
#[path = "eval_tests.rs"]
mod tests;
