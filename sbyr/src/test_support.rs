//! Test-only helpers: scripted jobs and document fixtures.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::core::types::{RunResult, Status};
use crate::io::job::{Job, JobOutcome, JobRequest};

/// One recorded job invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub config: Vec<String>,
    pub workdir: PathBuf,
    pub setup_only: bool,
}

/// Job double that replays queued outcomes and records every request.
#[derive(Debug, Default)]
pub struct ScriptedJob {
    outcomes: RefCell<VecDeque<JobOutcome>>,
    requests: RefCell<Vec<SeenRequest>>,
}

impl ScriptedJob {
    pub fn new(outcomes: Vec<JobOutcome>) -> Self {
        Self {
            outcomes: RefCell::new(outcomes.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Scripted job that finishes every task with the given results.
    pub fn finishing(results: Vec<RunResult>) -> Self {
        Self::new(results.into_iter().map(JobOutcome::Finished).collect())
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.requests.borrow().clone()
    }
}

impl Job for ScriptedJob {
    fn run(&self, request: &JobRequest) -> Result<JobOutcome> {
        self.requests.borrow_mut().push(SeenRequest {
            config: request.config.to_vec(),
            workdir: request.workdir.to_path_buf(),
            setup_only: request.setup_only,
        });
        self.outcomes
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("scripted job exhausted"))
    }
}

/// Deterministic result with the retcode bit implied by the status.
pub fn result(status: Status, log: &str) -> RunResult {
    RunResult {
        status,
        retcode: status.retcode_bit(),
        elapsed_secs: 1,
        log: log.to_string(),
    }
}

/// Write a `.sby` document under `dir` and return its path.
pub fn write_document(dir: &Path, name: &str, doc: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, doc).expect("write document");
    path
}
