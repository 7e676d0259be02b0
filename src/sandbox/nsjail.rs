//! nsjail backend
//!
//! Baseline isolation (namespaces, mounts, seccomp) comes from the static
//! config file; per-run limits and the work-directory bind mount are passed
//! as command-line overrides.

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::memory::MemoryReporter;
use super::process::run_supervised;
use super::{outcome_from_report, Sandbox};
use crate::config::JudgeConfig;
use crate::error::{JudgeError, Result};
use crate::executer::{ExecutionOutcome, ExecutionSpec};

/// Mount point of the work directory inside the jail
pub const SANDBOX_WORK_DIR: &str = "/work";

const MB: u64 = 1024 * 1024;

pub struct NsjailSandbox {
    config: JudgeConfig,
    memory: Box<dyn MemoryReporter>,
}

impl NsjailSandbox {
    pub fn new(config: JudgeConfig, memory: Box<dyn MemoryReporter>) -> Self {
        Self { config, memory }
    }
}

/// Build the nsjail argument vector for one run
pub fn build_nsjail_args(config: &JudgeConfig, spec: &ExecutionSpec) -> Vec<String> {
    let limits = &spec.limits;
    let time_limit_secs = limits.time_ms.div_ceil(1000).max(1);
    // One extra CPU second so a CPU-bound program hits the wall-clock limit
    // (reported as TLE) rather than RLIMIT_CPU
    let cpu_limit_secs = time_limit_secs + 1;
    let fsize_mb = limits.output_bytes.div_ceil(MB).max(1);

    let mut args = Vec::new();
    if let Some(base_config) = &config.nsjail_config {
        args.push("--config".to_string());
        args.push(base_config.display().to_string());
    }

    args.extend([
        "--time_limit".to_string(),
        time_limit_secs.to_string(),
        "--rlimit_cpu".to_string(),
        cpu_limit_secs.to_string(),
        "--rlimit_as".to_string(),
        config
            .address_space_mb(limits.memory_bytes, limits.address_space_bonus_mb)
            .to_string(),
        "--rlimit_fsize".to_string(),
        fsize_mb.to_string(),
        "--bindmount".to_string(),
        format!("{}:{}:rw", spec.work_dir.display(), SANDBOX_WORK_DIR),
        "--cwd".to_string(),
        SANDBOX_WORK_DIR.to_string(),
        "--".to_string(),
    ]);
    args.extend(spec.command.iter().cloned());
    args
}

#[async_trait]
impl Sandbox for NsjailSandbox {
    fn name(&self) -> &'static str {
        "nsjail"
    }

    async fn exec(&self, spec: &ExecutionSpec) -> Result<ExecutionOutcome> {
        if spec.command.is_empty() {
            return Err(JudgeError::Sandbox(anyhow::anyhow!(
                "No command specified for execution"
            )));
        }

        let args = build_nsjail_args(&self.config, spec);
        debug!("Running nsjail with args: {:?}", args);

        let mut command = Command::new(&self.config.nsjail_path);
        command.args(&args);

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
