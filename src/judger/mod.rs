//! Judger module for processing one submission
//!
//! Drives validation, compilation and sequential per-test execution, then
//! aggregates a submission verdict:
//! `Validating -> Compiling -> (Executing -> Checking)* -> Aggregating`.

pub mod classify;
#[cfg(test)]
pub(crate) mod testing;

use tracing::info;

use crate::checker::Checker;
use crate::compiler::compile;
use crate::config::JudgeConfig;
use crate::core::utils::non_empty_truncated;
use crate::core::{
    validate_and_resolve_limits, JudgeRequest, JudgeResponse, ResolvedLimits, TestCase,
    TestRunResult, Verdict,
};
use crate::error::{JudgeError, Result};
use crate::executer::{ExecutionLimits, ExecutionOutcome, ExecutionSpec};
use crate::languages::LanguageAdapter;
use crate::sandbox::Sandbox;
use classify::{map_runtime_to_verdict, runtime_message};

fn create_work_dir(config: &JudgeConfig) -> Result<tempfile::TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("judge-");
    let dir = match &config.work_root {
        Some(root) => builder.tempdir_in(root)?,
        None => builder.tempdir()?,
    };
    Ok(dir)
}

/// Judge one request end to end.
///
/// Only protocol-level problems (invalid request or limits, sandbox
/// infrastructure failure) are errors; everything the submission does ends
/// up as a verdict in the response.
pub async fn process_judge_request(
    request: &JudgeRequest,
    sandbox: &dyn Sandbox,
    config: &JudgeConfig,
) -> Result<JudgeResponse> {
    request.validate()?;

    let limits = request
        .limits
        .as_ref()
        .ok_or_else(|| JudgeError::InvalidRequest("limits are required".into()))?;
    let limits = validate_and_resolve_limits(request.language, limits)?;
    let checker = Checker::from_spec(request.checker.as_ref());
    let adapter = request.language.adapter();

    info!(
        "Judging submission {}: language={}, tests={}, sandbox={}, time_ms={}, memory_mb={}, output_bytes={}, checker={:?}",
        request.submission_id,
        request.language,
        request.tests.len(),
        sandbox.name(),
        limits.time_ms,
        limits.memory_mb(),
        limits.output_bytes,
        checker
    );

    // Removed on drop, on every exit path
    let work_dir = create_work_dir(config)?;
    adapter.write_source(work_dir.path(), &request.source)?;

    let compile_result = compile(sandbox, adapter, work_dir.path(), &limits, config).await?;
    if let Some(result) = &compile_result {
        if !result.verdict.is_accepted() {
            info!("Submission {} failed to compile", request.submission_id);
            return Ok(JudgeResponse {
                submission_id: request.submission_id.clone(),
                verdict: Verdict::CompileError,
                message: Some(result.message.clone()),
                compile: compile_result,
                tests: vec![],
                time_ms: 0,
                memory_kb: None,
            });
        }
    }

    let mut results = Vec::with_capacity(request.tests.len());
    let mut overall_verdict = Verdict::Accepted;
    let mut total_time_ms = 0u64;
    let mut peak_memory_kb: Option<u64> = None;

    for test in &request.tests {
        let outcome = run_test(sandbox, adapter, work_dir.path(), test, &limits).await?;

        total_time_ms += outcome.time_ms;
        peak_memory_kb = match (peak_memory_kb, outcome.memory_kb) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };

        let result = judge_test(request, test, outcome, checker, config);
        info!(
            "Test {}: verdict={}, time_ms={}, memory_kb={:?}",
            test.id, result.verdict, result.time_ms, result.memory_kb
        );

        overall_verdict = overall_verdict.worsen(result.verdict);
        let stop = !request.run_all && !result.verdict.is_accepted();
        results.push(result);

        if stop {
            break;
        }
    }

    info!(
        "Judge summary: submission_id={}, verdict={}, tests_run={}/{}, time_ms={}, memory_kb={:?}",
        request.submission_id,
        overall_verdict,
        results.len(),
        request.tests.len(),
        total_time_ms,
        peak_memory_kb
    );

    Ok(JudgeResponse {
        submission_id: request.submission_id.clone(),
        verdict: overall_verdict,
        compile: compile_result,
        tests: results,
        time_ms: total_time_ms,
        memory_kb: peak_memory_kb,
        message: None,
    })
}

async fn run_test(
    sandbox: &dyn Sandbox,
    adapter: &dyn LanguageAdapter,
    work_dir: &std::path::Path,
    test: &TestCase,
    limits: &ResolvedLimits,
) -> Result<ExecutionOutcome> {
    let limits = ExecutionLimits::from(*limits)
        .with_address_space_bonus(adapter.address_space_bonus_mb());
    let spec = ExecutionSpec::new(work_dir)
        .with_command(adapter.run_plan().argv)
        .with_limits(limits)
        .with_stdin(test.input.as_str());

    sandbox.exec(&spec).await
}

/// Classify, check and build the per-test result. Hidden tests never get
/// their details attached unless the request is in debug mode.
fn judge_test(
    request: &JudgeRequest,
    test: &TestCase,
    outcome: ExecutionOutcome,
    checker: Checker,
    config: &JudgeConfig,
) -> TestRunResult {
    let mut verdict = map_runtime_to_verdict(&outcome);
    if verdict.is_accepted() && !checker.check(&outcome.stdout, &test.output) {
        verdict = Verdict::WrongAnswer;
    }
    let message = runtime_message(&outcome, verdict);

    let reveal = !test.hidden || request.debug;
    let (input, expected, actual, stderr) = if reveal {
        (
            Some(test.input.clone()),
            Some(test.output.clone()),
            Some(outcome.stdout),
            non_empty_truncated(&outcome.stderr, config.diagnostic_bytes),
        )
    } else {
        (None, None, None, None)
    };

    TestRunResult {
        id: test.id.clone(),
        verdict,
        time_ms: outcome.time_ms,
        memory_kb: outcome.memory_kb,
        message,
        input,
        expected,
        actual,
        stderr,
    }
}
