// system-tests/tests/suites/a2a_eval.rs
// ============================================================================
// Module: Agent Evaluation Tests
// Description: Replays bundled datasets through the live agent card.
// Purpose: Score tool trajectories and responses against dataset thresholds.
// Dependencies: system-tests helpers, agent-conformance
// ============================================================================

//! Live evaluation of the triage datasets. Gated like the HTTP suites.

use std::time::Duration;

use agent_conformance::eval::Evaluator;
use helpers::artifacts::TestReporter;
use helpers::session::Live;
use helpers::session::acquire_with_config;
use helpers::timeouts::within;
use system_tests::live::eval_fixtures_dir;
use system_tests::live::live_config;

use crate::helpers;

/// Budget for one dataset, including agent think time.
const DATASET_BUDGET: Duration = Duration::from_secs(300);

async fn evaluate_dataset(test_name: &str, file_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new(test_name)?;
    let config = live_config()?;
    let a2a_url = config.a2a_url.clone();
    let timeout = config.request_timeout;
    let dataset = config.eval_dir.clone().unwrap_or_else(eval_fixtures_dir).join(file_name);
    let Live::Ready(_session) = acquire_with_config(&mut reporter, config).await? else {
        return Ok(());
    };

    let evaluator = Evaluator::discover(&a2a_url, timeout).await?;
    let report = within(DATASET_BUDGET, evaluator.evaluate(&dataset, 1)).await??;
    reporter.artifacts().write_json("eval_report.json", &report)?;
    let notes = report
        .cases
        .iter()
        .map(|case| {
            format!("{} run {}: {}", case.eval_id, case.run, if case.passed { "pass" } else { "fail" })
        })
        .collect();
    reporter.finish(
        if report.passed() { "pass" } else { "fail" },
        notes,
        vec!["summary.json".to_string(), "summary.md".to_string(), "eval_report.json".to_string()],
    )?;
    report.into_result()?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn triage_basic() -> Result<(), Box<dyn std::error::Error>> {
    evaluate_dataset("a2a_triage_basic", "triage_basic.test.json").await
}

#[tokio::test(flavor = "multi_thread")]
async fn multi_event() -> Result<(), Box<dyn std::error::Error>> {
    evaluate_dataset("a2a_multi_event", "multi_event.test.json").await
}
