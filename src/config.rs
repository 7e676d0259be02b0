//! Judge configuration
//!
//! Loaded once from environment variables (after `.env`, if present).

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{JudgeError, Result};

/// Which sandbox backend runs the submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxBackend {
    /// nsjail isolation (production)
    Nsjail,
    /// Direct execution with rlimits only, for development hosts without nsjail
    Direct,
}

impl FromStr for SandboxBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "nsjail" => Ok(SandboxBackend::Nsjail),
            "direct" => Ok(SandboxBackend::Direct),
            other => Err(format!("unknown sandbox backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JudgeConfig {
    pub backend: SandboxBackend,
    /// Path to the nsjail binary
    pub nsjail_path: PathBuf,
    /// Base nsjail config (namespaces, mounts, seccomp policy)
    pub nsjail_config: Option<PathBuf>,
    /// Peak-memory accounting file of the judge cgroup
    pub memory_peak_file: PathBuf,
    /// Parent of the per-submission work directories
    pub work_root: Option<PathBuf>,
    /// Host-side backstop grace beyond the time limit
    pub time_grace_ms: u64,
    /// Address-space margin added on top of the memory limit
    pub as_overhead_mb: u64,
    /// Hard ceiling of the address-space limit
    pub as_ceiling_mb: u64,
    pub compile_time_ms: u64,
    pub compile_memory_mb: u64,
    pub compile_output_kb: u64,
    /// Cap on compiler output and stderr echoed in responses
    pub diagnostic_bytes: usize,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            backend: SandboxBackend::Nsjail,
            nsjail_path: PathBuf::from("/usr/bin/nsjail"),
            nsjail_config: None,
            memory_peak_file: PathBuf::from("/sys/fs/cgroup/judge/memory.peak"),
            work_root: None,
            time_grace_ms: 250,
            as_overhead_mb: 512,
            as_ceiling_mb: 2048,
            compile_time_ms: 15_000,
            compile_memory_mb: 1024,
            compile_output_kb: 256,
            diagnostic_bytes: 8192,
        }
    }
}

fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| JudgeError::Config(format!("invalid {}='{}': {}", name, raw, e))),
        _ => Ok(default),
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

impl JudgeConfig {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            backend: env_parse("JUDGE_SANDBOX", defaults.backend)?,
            nsjail_path: env_path("NSJAIL_PATH").unwrap_or(defaults.nsjail_path),
            nsjail_config: env_path("NSJAIL_CONFIG"),
            memory_peak_file: env_path("JUDGE_MEMORY_PEAK_FILE")
                .unwrap_or(defaults.memory_peak_file),
            work_root: env_path("JUDGE_WORK_ROOT"),
            time_grace_ms: env_parse("JUDGE_TIME_GRACE_MS", defaults.time_grace_ms)?,
            as_overhead_mb: env_parse("JUDGE_AS_OVERHEAD_MB", defaults.as_overhead_mb)?,
            as_ceiling_mb: env_parse("JUDGE_AS_CEILING_MB", defaults.as_ceiling_mb)?,
            compile_time_ms: env_parse("JUDGE_COMPILE_TIME_MS", defaults.compile_time_ms)?,
            compile_memory_mb: env_parse("JUDGE_COMPILE_MEMORY_MB", defaults.compile_memory_mb)?,
            compile_output_kb: env_parse("JUDGE_COMPILE_OUTPUT_KB", defaults.compile_output_kb)?,
            diagnostic_bytes: env_parse("JUDGE_DIAGNOSTIC_BYTES", defaults.diagnostic_bytes)?,
        };

        if config.as_ceiling_mb == 0 {
            return Err(JudgeError::Config("JUDGE_AS_CEILING_MB must be positive".into()));
        }

        Ok(config)
    }

    /// Address-space limit in MB for a memory limit in bytes plus a
    /// per-language bonus, capped at the ceiling
    pub fn address_space_mb(&self, memory_bytes: u64, bonus_mb: u64) -> u64 {
        let memory_mb = memory_bytes.div_ceil(1024 * 1024);
        (memory_mb + self.as_overhead_mb + bonus_mb).min(self.as_ceiling_mb)
    }
}
