//! Execution vocabulary shared by sandbox backends, the compiler and the judger

use nix::sys::signal::Signal;
use std::path::PathBuf;

use crate::core::limits::ResolvedLimits;

/// Exit code reported by nsjail (and shells) for a child killed by SIGKILL
pub const KILLED_EXIT_CODE: i32 = 128 + Signal::SIGKILL as i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    /// Wall-clock limit in milliseconds
    pub time_ms: u64,
    pub memory_bytes: u64,
    /// Cap on combined stdout + stderr
    pub output_bytes: u64,
    /// Address space granted on top of the usual margin, for runtimes that
    /// reserve far more virtual memory than they touch
    pub address_space_bonus_mb: u64,
}

impl ExecutionLimits {
    pub fn with_address_space_bonus(mut self, bonus_mb: u64) -> Self {
        self.address_space_bonus_mb = bonus_mb;
        self
    }
}

impl From<ResolvedLimits> for ExecutionLimits {
    fn from(limits: ResolvedLimits) -> Self {
        Self {
            time_ms: limits.time_ms,
            memory_bytes: limits.memory_bytes,
            output_bytes: limits.output_bytes,
            address_space_bonus_mb: 0,
        }
    }
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            time_ms: 1000,
            memory_bytes: 256 * 1024 * 1024,
            output_bytes: 64 * 1024,
            address_space_bonus_mb: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionSpec {
    /// Host work directory, mounted read-write as the program's cwd
    pub work_dir: PathBuf,
    pub command: Vec<String>,
    pub limits: ExecutionLimits,
    pub stdin: Option<String>,
}

impl ExecutionSpec {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            command: vec![],
            limits: ExecutionLimits::default(),
            stdin: None,
        }
    }

    pub fn with_command(mut self, command: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    /// Bytes to feed on stdin: `None` closes stdin immediately, otherwise the
    /// content is newline-terminated
    pub fn stdin_bytes(&self) -> Option<Vec<u8>> {
        match self.stdin.as_deref() {
            None | Some("") => None,
            Some(s) => {
                let mut bytes = s.as_bytes().to_vec();
                if !s.ends_with('\n') {
                    bytes.push(b'\n');
                }
                Some(bytes)
            }
        }
    }
}

/// Raw outcome of one sandboxed run, before any verdict interpretation
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutcome {
    /// Exit code, `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    /// Terminating signal number, if any
    pub signal: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Killed by the host-side wall-clock backstop
    pub timed_out: bool,
    /// Killed because combined output passed the cap
    pub output_limit_exceeded: bool,
    /// Wall-clock time from spawn to exit
    pub time_ms: u64,
    /// Peak memory, `None` when the accounting file was unreadable
    pub memory_kb: Option<u64>,
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0) && !self.timed_out && !self.output_limit_exceeded
    }

    /// Killed with SIGKILL, either directly or as reported by the sandbox
    pub fn was_killed(&self) -> bool {
        self.exit_code == Some(KILLED_EXIT_CODE) || self.signal == Some(Signal::SIGKILL as i32)
    }

    /// Signal that ended the program, decoding the `128 + n` exit convention
    pub fn terminating_signal(&self) -> Option<Signal> {
        let raw = match (self.signal, self.exit_code) {
            (Some(sig), _) => sig,
            (None, Some(code)) if code > 128 && code < 128 + 65 => code - 128,
            _ => return None,
        };
        Signal::try_from(raw).ok()
    }
}
