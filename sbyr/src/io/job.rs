//! Job boundary: the opaque engine run for one task.
//!
//! The runner only cares that a job consumes a resolved configuration and a
//! prepared workdir and yields a [`RunResult`]. Verification semantics live
//! behind this trait. Abort is a value, not a panic or process exit: the
//! orchestrator decides whether an aborted job is fatal (strict mode) or
//! just another finished task.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::core::types::{RunResult, Status};
use crate::io::process::run_command_with_timeout;
use crate::retcode;

/// Everything a job needs for one task.
#[derive(Debug)]
pub struct JobRequest<'a> {
    /// Resolved configuration lines for this task.
    pub config: &'a [String],
    /// Prepared working directory.
    pub workdir: &'a Path,
    /// Prepare the workdir only; do not invoke the engine.
    pub setup_only: bool,
}

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job ran to completion (whatever the verdict).
    Finished(RunResult),
    /// The job gave up early; the partial result carries whatever return
    /// code it had already recorded.
    Aborted(RunResult),
}

impl JobOutcome {
    pub fn result(&self) -> &RunResult {
        match self {
            JobOutcome::Finished(result) | JobOutcome::Aborted(result) => result,
        }
    }

    pub fn into_result(self) -> RunResult {
        match self {
            JobOutcome::Finished(result) | JobOutcome::Aborted(result) => result,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, JobOutcome::Aborted(_))
    }
}

/// One external engine run per task.
pub trait Job {
    fn run(&self, request: &JobRequest) -> Result<JobOutcome>;
}

/// Process-backed job: writes `config.sby` into the workdir and invokes the
/// engine executable once with the workdir as its argument. Tool path
/// overrides are exported as `SBYR_TOOL_<NAME>` environment variables.
#[derive(Debug, Clone)]
pub struct EngineJob {
    pub command: String,
    pub tool_paths: BTreeMap<String, String>,
    pub timeout: Duration,
    pub output_limit_bytes: usize,
}

impl Job for EngineJob {
    fn run(&self, request: &JobRequest) -> Result<JobOutcome> {
        let start = Instant::now();
        let mut log = String::new();

        let config_path = request.workdir.join("config.sby");
        let mut contents = request.config.join("\n");
        contents.push('\n');
        fs::write(&config_path, contents)
            .with_context(|| format!("write {}", config_path.display()))?;
        log_line(&mut log, "Wrote resolved configuration to 'config.sby'.");

        if request.setup_only {
            debug!(workdir = %request.workdir.display(), "setup only, engine not invoked");
            return Ok(JobOutcome::Finished(RunResult {
                status: Status::Unknown,
                retcode: retcode::PASS,
                elapsed_secs: start.elapsed().as_secs(),
                log,
            }));
        }

        let mut cmd = Command::new(&self.command);
        cmd.arg(request.workdir);
        for (tool, path) in &self.tool_paths {
            cmd.env(format!("SBYR_TOOL_{}", tool.to_uppercase()), path);
        }

        info!(engine = %self.command, workdir = %request.workdir.display(), "invoking engine");
        let output = match run_command_with_timeout(cmd, self.timeout, self.output_limit_bytes) {
            Ok(output) => output,
            Err(err) => {
                log_line(&mut log, &format!("Engine invocation failed: {err:#}"));
                return Ok(JobOutcome::Aborted(RunResult {
                    status: Status::Error,
                    retcode: retcode::ERROR,
                    elapsed_secs: start.elapsed().as_secs(),
                    log,
                }));
            }
        };

        log.push_str(&String::from_utf8_lossy(&output.stdout));
        log.push_str(&String::from_utf8_lossy(&output.stderr));

        let status = if output.timed_out {
            Status::Timeout
        } else if let Some(status) = sentinel_status(request.workdir) {
            status
        } else if output.status.success() {
            Status::Pass
        } else {
            Status::Error
        };

        Ok(JobOutcome::Finished(RunResult {
            status,
            retcode: status.retcode_bit(),
            elapsed_secs: start.elapsed().as_secs(),
            log,
        }))
    }
}

/// Verdict left by the engine as a sentinel file, if any.
fn sentinel_status(workdir: &Path) -> Option<Status> {
    crate::core::types::SENTINELS
        .into_iter()
        .find(|name| workdir.join(name).exists())
        .and_then(Status::from_sentinel)
}

fn log_line(log: &mut String, line: &str) {
    log.push_str(line);
    log.push('\n');
}
