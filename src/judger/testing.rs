//! In-memory sandbox for orchestration tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{JudgeError, Result};
use crate::executer::{ExecutionOutcome, ExecutionSpec};
use crate::sandbox::Sandbox;

/// Replays prepared outcomes in order and records every spec it was given
pub struct ScriptedSandbox {
    outcomes: Mutex<VecDeque<ExecutionOutcome>>,
    specs: Mutex<Vec<ExecutionSpec>>,
}

impl ScriptedSandbox {
    pub fn new(outcomes: Vec<ExecutionOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            specs: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded(&self) -> Vec<ExecutionSpec> {
        self.specs.lock().unwrap().clone()
    }
}

/// Clean exit printing `stdout`
pub fn exited_ok(stdout: &str) -> ExecutionOutcome {
    ExecutionOutcome {
        exit_code: Some(0),
        stdout: stdout.to_string(),
        time_ms: 10,
        memory_kb: Some(1024),
        ..Default::default()
    }
}

#[async_trait]
impl Sandbox for ScriptedSandbox {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn exec(&self, spec: &ExecutionSpec) -> Result<ExecutionOutcome> {
        self.specs.lock().unwrap().push(spec.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| JudgeError::Sandbox(anyhow::anyhow!("script exhausted")))
    }
}
