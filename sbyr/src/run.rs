//! Orchestration for one invocation: resolve, prepare, run, report.
//!
//! Tasks execute strictly one after another; the only state shared between
//! them is the immutable document text. Each task's failure is isolated and
//! contributes its return-code bits to the process exit status.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::core::preprocess::resolve;
use crate::core::types::RunResult;
use crate::retcode;
use crate::io::job::{Job, JobRequest};
use crate::io::report::{ReportNames, write_reports};
use crate::io::workdir::{WorkdirOptions, prepare};

/// Where the document came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A `<name>.sby` file; workdir names derive from its stem.
    File(PathBuf),
    /// An existing workdir holding `config.sby`; the directory is reused.
    Dir(PathBuf),
    /// Document read from stdin; runs happen in a temporary workdir unless
    /// a workdir was given explicitly.
    Stdin,
}

impl Source {
    /// Path of the document file, when there is one.
    pub fn document_path(&self) -> Option<PathBuf> {
        match self {
            Source::File(path) => Some(path.clone()),
            Source::Dir(dir) => Some(dir.join("config.sby")),
            Source::Stdin => None,
        }
    }

    /// Document path with its extension dropped; basis for derived workdir
    /// names.
    fn derived_stem(&self) -> Option<PathBuf> {
        match self {
            Source::File(path) => Some(path.with_extension("")),
            Source::Dir(_) | Source::Stdin => None,
        }
    }

    fn is_reuse(&self) -> bool {
        matches!(self, Source::Dir(_))
    }
}

/// Options for one invocation, built from the parsed command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub source: Source,
    /// Fixed workdir path; only valid with a single effective task.
    pub workdir: Option<PathBuf>,
    pub backup: bool,
    pub force: bool,
    pub tmpdir: bool,
    /// Treat a job abort as fatal for the whole invocation.
    pub strict: bool,
    /// Prepare workdirs and configurations without running the engine.
    pub setup: bool,
}

/// Run every selected task in order; returns the aggregate return code.
pub fn run_all(
    doc: &str,
    tasks: &[Option<String>],
    opts: &RunOptions,
    job: &dyn Job,
) -> Result<i32> {
    let mut codes = Vec::with_capacity(tasks.len());
    for task in tasks {
        codes.push(run_task(doc, task.as_deref(), opts, job)?);
    }
    Ok(retcode::aggregate(codes))
}

/// Run a single task end to end; returns its return code.
pub fn run_task(doc: &str, task: Option<&str>, opts: &RunOptions, job: &dyn Job) -> Result<i32> {
    debug!(task = task.unwrap_or("<unnamed>"), "running task");

    // Resolve before any filesystem effects: a malformed document must not
    // create, remove, or back up directories.
    let resolved = resolve(doc, task)?;

    let workdir_opts = WorkdirOptions {
        explicit: opts.workdir.clone(),
        derived_stem: opts.source.derived_stem(),
        backup: opts.backup,
        force: opts.force,
        tmpdir: opts.tmpdir,
        reuse: opts.source.is_reuse(),
    };
    let workdir = prepare(task, &workdir_opts)?;
    let names = report_names(&opts.source, opts.workdir.as_deref(), workdir.path(), task);
    let outcome = job.run(&JobRequest {
        config: &resolved.config,
        workdir: workdir.path(),
        setup_only: opts.setup,
    })?;

    if outcome.is_aborted() && opts.strict {
        bail!(
            "job aborted for task '{}' (rc={})",
            task.unwrap_or("<unnamed>"),
            outcome.result().retcode
        );
    }
    let result = outcome.into_result();

    let mut log = String::new();
    for line in &workdir.early_log {
        log.push_str(line);
        log.push('\n');
    }
    log.push_str(&result.log);
    if opts.setup {
        log.push_str(&format!("SETUP COMPLETE (rc={})\n", result.retcode));
    } else {
        log.push_str(&format!(
            "DONE ({}, rc={})\n",
            result.status.as_str(),
            result.retcode
        ));
    }
    let log_path = workdir.path().join("logfile.txt");
    fs::write(&log_path, &log).with_context(|| format!("write {}", log_path.display()))?;

    if !workdir.is_temporary() && !opts.setup {
        let full = RunResult { log, ..result.clone() };
        write_reports(workdir.path(), &names, &full)?;
    }

    // Reports (if any) have been read out of the directory by now; a
    // temporary workdir can go.
    workdir.cleanup()?;

    info!(
        task = task.unwrap_or("<unnamed>"),
        status = result.status.as_str(),
        retcode = result.retcode,
        "task finished"
    );
    Ok(result.retcode)
}

/// JUnit naming rules: suite from the document stem (or the fixed workdir,
/// or `stdin`), case from the task, file stem from the workdir when reusing.
fn report_names(
    source: &Source,
    fixed_workdir: Option<&Path>,
    workdir: &Path,
    task: Option<&str>,
) -> ReportNames {
    let suite = match source.document_path() {
        Some(doc) => doc
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stdin".to_string()),
        None => match fixed_workdir {
            Some(dir) => dir.display().to_string(),
            None => "stdin".to_string(),
        },
    };
    let case = task.unwrap_or("default").to_string();

    let file_stem = if source.is_reuse() {
        workdir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "junit".to_string())
    } else if let Source::File(path) = source {
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "junit".to_string());
        match task {
            Some(task) => format!("{stem}_{task}"),
            None => stem,
        }
    } else if let Some(task) = task {
        task.to_string()
    } else {
        "junit".to_string()
    };

    ReportNames {
        suite,
        case,
        file_stem,
    }
}
