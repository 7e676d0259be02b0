//! Direct backend
//!
//! Runs the command straight in the work directory with rlimits applied in
//! the child before exec. There is no namespace or filesystem isolation, so
//! this is meant for development hosts without nsjail and for tests, never
//! for untrusted code.

use async_trait::async_trait;
use nix::sys::resource::{setrlimit, Resource};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::memory::MemoryReporter;
use super::process::run_supervised;
use super::{outcome_from_report, Sandbox};
use crate::config::JudgeConfig;
use crate::error::{JudgeError, Result};
use crate::executer::{ExecutionOutcome, ExecutionSpec};

const MB: u64 = 1024 * 1024;

pub struct DirectSandbox {
    config: JudgeConfig,
    memory: Box<dyn MemoryReporter>,
}

impl DirectSandbox {
    pub fn new(config: JudgeConfig, memory: Box<dyn MemoryReporter>) -> Self {
        Self { config, memory }
    }
}

/// rlimits applied to the child, mirroring the nsjail overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChildRlimits {
    cpu_secs: u64,
    address_space_bytes: u64,
    file_size_bytes: u64,
}

impl ChildRlimits {
    fn for_spec(config: &JudgeConfig, spec: &ExecutionSpec) -> Self {
        let time_limit_secs = spec.limits.time_ms.div_ceil(1000).max(1);
        Self {
            cpu_secs: time_limit_secs + 1,
            address_space_bytes: config
                .address_space_mb(spec.limits.memory_bytes, spec.limits.address_space_bonus_mb)
                * MB,
            file_size_bytes: spec.limits.output_bytes.div_ceil(MB).max(1) * MB,
        }
    }
}

#[async_trait]
impl Sandbox for DirectSandbox {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn exec(&self, spec: &ExecutionSpec) -> Result<ExecutionOutcome> {
        let (program, args) = spec.command.split_first().ok_or_else(|| {
            JudgeError::Sandbox(anyhow::anyhow!("No command specified for execution"))
        })?;

        let rlimits = ChildRlimits::for_spec(&self.config, spec);
        debug!("Running {:?} directly with {:?}", spec.command, rlimits);

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(&spec.work_dir)
            .env_clear()
            .env("PATH", "/usr/local/bin:/usr/bin:/bin")
            .env("HOME", &spec.work_dir)
            .env("LANG", "C.UTF-8");

        // SAFETY: setrlimit is async-signal-safe and the closure touches no
        // shared state
        unsafe {
            command.pre_exec(move || {
                setrlimit(Resource::RLIMIT_CPU, rlimits.cpu_secs, rlimits.cpu_secs)?;
                setrlimit(
                    Resource::RLIMIT_AS,
                    rlimits.address_space_bytes,
                    rlimits.address_space_bytes,
                )?;
                setrlimit(
                    Resource::RLIMIT_FSIZE,
                    rlimits.file_size_bytes,
                    rlimits.file_size_bytes,
                )?;
                Ok(())
            });
        }

        self.memory.reset().await;

        let deadline = Duration::from_millis(spec.limits.time_ms + self.config.time_grace_ms);
        let report = run_supervised(
            command,
            spec.stdin_bytes(),
            deadline,
            spec.limits.output_bytes,
        )
        .await
        .map_err(JudgeError::Sandbox)?;

        let memory_kb = self.memory.peak_kb().await;
        Ok(outcome_from_report(report, memory_kb))
    }
}
