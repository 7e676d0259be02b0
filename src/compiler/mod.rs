//! Compiler module - Source code compilation
//!
//! Runs a language's compile plan through the sandbox with limits relaxed
//! relative to the per-test run limits, and maps the outcome to a compile
//! verdict. Languages without a compile plan skip this stage.

use std::path::Path;
use tracing::{debug, info};

use crate::config::JudgeConfig;
use crate::core::utils::non_empty_truncated;
use crate::core::{CompileResult, ResolvedLimits, Verdict};
use crate::error::Result;
use crate::executer::{ExecutionLimits, ExecutionOutcome, ExecutionSpec};
use crate::languages::LanguageAdapter;
use crate::sandbox::Sandbox;

/// Compile-stage limits: never tighter than the run limits, with extra
/// time and output headroom for verbose compilers
pub fn compile_limits(run: &ResolvedLimits, config: &JudgeConfig) -> ExecutionLimits {
    ExecutionLimits {
        time_ms: run.time_ms.max(config.compile_time_ms),
        memory_bytes: run.memory_bytes.max(config.compile_memory_mb * 1024 * 1024),
        output_bytes: run.output_bytes.max(config.compile_output_kb * 1024),
        address_space_bonus_mb: 0,
    }
}

fn compile_verdict(outcome: &ExecutionOutcome) -> (Verdict, &'static str) {
    if outcome.timed_out {
        (Verdict::CompileError, "Compilation timed out")
    } else if outcome.output_limit_exceeded {
        (Verdict::CompileError, "Compilation output limit exceeded")
    } else if !outcome.is_success() {
        (Verdict::CompileError, "Compilation error")
    } else {
        (Verdict::Accepted, "Compilation OK")
    }
}

/// Compile the submission in `work_dir`.
///
/// Returns `None` when the language has no compile step.
pub async fn compile(
    sandbox: &dyn Sandbox,
    adapter: &dyn LanguageAdapter,
    work_dir: &Path,
    run_limits: &ResolvedLimits,
    config: &JudgeConfig,
) -> Result<Option<CompileResult>> {
    let plan = match adapter.compile_plan() {
        Some(plan) => plan,
        None => return Ok(None),
    };

    let limits = compile_limits(run_limits, config)
        .with_address_space_bonus(adapter.address_space_bonus_mb());
    debug!("Compiling with {:?} under {:?}", plan.argv, limits);

    let spec = ExecutionSpec::new(work_dir)
        .with_command(plan.argv)
        .with_limits(limits);
    let outcome = sandbox.exec(&spec).await?;

    let (verdict, message) = compile_verdict(&outcome);
    info!(
        "Compilation finished: verdict={}, time_ms={}, exit_code={:?}",
        verdict, outcome.time_ms, outcome.exit_code
    );

    Ok(Some(CompileResult {
        verdict,
        time_ms: outcome.time_ms,
        memory_kb: outcome.memory_kb,
        message: message.to_string(),
        stdout: non_empty_truncated(&outcome.stdout, config.diagnostic_bytes),
        stderr: non_empty_truncated(&outcome.stderr, config.diagnostic_bytes),
    }))
}
