//! Sandbox module - isolation backends
//!
//! This module hides the isolation tool behind the narrow `Sandbox` trait:
//! spawn one command with limits, feed stdin, return exit status, captured
//! output and peak memory. It handles:
//! - nsjail argument construction and invocation
//! - Host-side backstops (wall-clock kill, output byte cap)
//! - Best-effort peak memory reporting
//!
//! The sandbox module does NOT:
//! - Interpret verdicts (that's the judger's job)
//! - Know about languages or compilation
//! - Compare outputs

pub mod direct;
pub mod memory;
pub mod nsjail;
pub mod process;

use async_trait::async_trait;
use std::os::unix::process::ExitStatusExt;
use tracing::warn;

use crate::config::{JudgeConfig, SandboxBackend};
use crate::error::Result;
use crate::executer::{ExecutionOutcome, ExecutionSpec};

// Re-exports for convenience
pub use direct::DirectSandbox;
pub use memory::{CgroupMemoryReporter, MemoryReporter, NoMemoryReporter};
pub use nsjail::NsjailSandbox;
use process::ProcessReport;

/// One isolated execution of a command
#[async_trait]
pub trait Sandbox: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run `spec` to completion. Only infrastructure failures are errors;
    /// whatever the program does is reported in the outcome.
    async fn exec(&self, spec: &ExecutionSpec) -> Result<ExecutionOutcome>;
}

/// Build the backend selected by configuration
pub fn create_sandbox(config: &JudgeConfig) -> Box<dyn Sandbox> {
    match config.backend {
        SandboxBackend::Nsjail => Box::new(NsjailSandbox::new(
            config.clone(),
            Box::new(CgroupMemoryReporter::new(&config.memory_peak_file)),
        )),
        SandboxBackend::Direct => {
            warn!("Using the direct sandbox backend: submissions run WITHOUT isolation");
            Box::new(DirectSandbox::new(config.clone(), Box::new(NoMemoryReporter)))
        }
    }
}

pub(crate) fn outcome_from_report(report: ProcessReport, memory_kb: Option<u64>) -> ExecutionOutcome {
    ExecutionOutcome {
        exit_code: report.status.code(),
        signal: report.status.signal(),
        stdout: String::from_utf8_lossy(&report.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&report.stderr).into_owned(),
        timed_out: report.timed_out,
        output_limit_exceeded: report.output_limit_exceeded,
        time_ms: report.elapsed.as_millis() as u64,
        memory_kb,
    }
}
