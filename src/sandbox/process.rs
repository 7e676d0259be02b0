//! Child process supervision shared by every sandbox backend
//!
//! Streams stdout/stderr incrementally under a combined byte cap and enforces
//! a host-side wall-clock deadline. Both are backstops: the isolation tool is
//! expected to enforce its own limits first, but a slow or misbehaving one
//! can never hang the judge.

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, warn};

const READ_CHUNK: usize = 8192;

/// What the supervisor observed about one child
#[derive(Debug)]
pub struct ProcessReport {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub timed_out: bool,
    pub output_limit_exceeded: bool,
    pub elapsed: Duration,
}

/// Output buffers sharing one byte budget
struct OutputCapture {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    cap: usize,
    exceeded: bool,
}

enum Stream {
    Stdout,
    Stderr,
}

impl OutputCapture {
    fn new(cap: u64) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            cap: usize::try_from(cap).unwrap_or(usize::MAX),
            exceeded: false,
        }
    }

    fn total(&self) -> usize {
        self.stdout.len() + self.stderr.len()
    }

    /// Append a chunk; returns `false` once the combined total passes the cap.
    /// Bytes past the cap are dropped.
    fn push(&mut self, stream: Stream, chunk: &[u8]) -> bool {
        if self.exceeded {
            return false;
        }

        let room = self.cap.saturating_sub(self.total());
        let (kept, over) = if chunk.len() > room {
            (&chunk[..room], true)
        } else {
            (chunk, false)
        };

        match stream {
            Stream::Stdout => self.stdout.extend_from_slice(kept),
            Stream::Stderr => self.stderr.extend_from_slice(kept),
        }

        if over {
            self.exceeded = true;
        }
        !over
    }
}

/// SIGKILL the child's whole process group
fn kill_group(pid: Option<u32>) {
    let Some(pid) = pid else {
        return;
    };
    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!("Failed to kill process group {}: {}", pid, e),
    }
}

/// Spawn `command` and supervise it until it exits.
///
/// The child becomes the leader of a new process group so that a forced
/// kill also reaches anything it spawned.
pub async fn run_supervised(
    mut command: Command,
    stdin: Option<Vec<u8>>,
    deadline: Duration,
    output_cap: u64,
) -> Result<ProcessReport> {
    command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .kill_on_drop(true);

    let started = Instant::now();
    let mut child = command.spawn().context("Failed to spawn sandboxed process")?;
    let pid = child.id();

    let stdin_task = match (stdin, child.stdin.take()) {
        (Some(bytes), Some(mut pipe)) => Some(tokio::spawn(async move {
            // The program may exit without consuming its input
            if let Err(e) = pipe.write_all(&bytes).await {
                debug!("Stopped writing stdin: {}", e);
            }
        })),
        _ => None,
    };

    let mut stdout = child.stdout.take().context("Child stdout was not captured")?;
    let mut stderr = child.stderr.take().context("Child stderr was not captured")?;

    let mut capture = OutputCapture::new(output_cap);
    let mut out_buf = [0u8; READ_CHUNK];
    let mut err_buf = [0u8; READ_CHUNK];
    let mut out_open = true;
    let mut err_open = true;

    let mut status: Option<ExitStatus> = None;
    let mut elapsed = Duration::ZERO;
    let mut timed_out = false;
    let mut killed = false;

    let timer = tokio::time::sleep(deadline);
    tokio::pin!(timer);
    let mut timer_fired = false;

    loop {
        if status.is_some() && (killed || (!out_open && !err_open)) {
            break;
        }

        tokio::select! {
            read = stdout.read(&mut out_buf), if out_open => match read {
                Ok(0) | Err(_) => out_open = false,
                Ok(n) => {
                    if !capture.push(Stream::Stdout, &out_buf[..n]) && !killed {
                        killed = true;
                        kill_group(pid);
                    }
                }
            },
            read = stderr.read(&mut err_buf), if err_open => match read {
                Ok(0) | Err(_) => err_open = false,
                Ok(n) => {
                    if !capture.push(Stream::Stderr, &err_buf[..n]) && !killed {
                        killed = true;
                        kill_group(pid);
                    }
                }
            },
            exit = child.wait(), if status.is_none() => {
                elapsed = started.elapsed();
                status = Some(exit.context("Failed to wait for sandboxed process")?);
            },
            _ = &mut timer, if !timer_fired => {
                timer_fired = true;
                if status.is_none() {
                    debug!("Wall-clock backstop fired after {:?}", deadline);
                    timed_out = true;
                    killed = true;
                    kill_group(pid);
                } else {
                    // Exited, but a descendant still holds the pipes open
                    break;
                }
            },
        }
    }

    if out_open || err_open {
        kill_group(pid);
    }
    if let Some(task) = stdin_task {
        task.abort();
    }

    let status = status.context("Sandboxed process exit status missing")?;

    Ok(ProcessReport {
        status,
        output_limit_exceeded: capture.exceeded,
        stdout: capture.stdout,
        stderr: capture.stderr,
        timed_out,
        elapsed,
    })
}
