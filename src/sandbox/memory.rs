//! Peak memory reporting
//!
//! Memory numbers are diagnostic only. A reporter that cannot read its
//! source answers `None` and never fails the run.
//!
//! The cgroup counter is shared by everything attributed to the cgroup, so
//! it is only meaningful while one sandboxed process runs at a time.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[async_trait]
pub trait MemoryReporter: Send + Sync {
    /// Best-effort reset of the peak counter before a run
    async fn reset(&self) {}

    /// Peak resident memory in KB since the last reset
    async fn peak_kb(&self) -> Option<u64>;
}

/// Reads a cgroup peak-memory file (`memory.peak` on cgroup v2,
/// `memory.max_usage_in_bytes` on v1), both reported in bytes
pub struct CgroupMemoryReporter {
    path: PathBuf,
}

impl CgroupMemoryReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn parse_peak_bytes(content: &str) -> Option<u64> {
    content.trim().parse::<u64>().ok()
}

#[async_trait]
impl MemoryReporter for CgroupMemoryReporter {
    async fn reset(&self) {
        // Writable on cgroup v1 and on recent v2 kernels; older ones refuse.
        // Never create the file: a missing counter must stay missing.
        let result = match OpenOptions::new().write(true).open(&self.path).await {
            Ok(mut file) => file.write_all(b"0").await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            debug!("Could not reset {:?}: {}", self.path, e);
        }
    }

    async fn peak_kb(&self) -> Option<u64> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => {
                let peak = parse_peak_bytes(&content).map(|bytes| bytes / 1024);
                if peak.is_none() {
                    debug!("Unparseable memory accounting in {:?}", self.path);
                }
                peak
            }
            Err(e) => {
                debug!("Memory accounting unavailable at {:?}: {}", self.path, e);
                None
            }
        }
    }
}

/// Reporter for backends without memory accounting
pub struct NoMemoryReporter;

#[async_trait]
impl MemoryReporter for NoMemoryReporter {
    async fn peak_kb(&self) -> Option<u64> {
        None
    }
}
