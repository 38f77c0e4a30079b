//! Workdir lifecycle: one isolated directory per (document, task) run.
//!
//! Evaluated in a fixed order so destructive steps cannot race each other:
//! backup (never overwrites), then force removal, then exactly one of
//! reuse / refuse-existing / fresh-create. Temporary directories are removed
//! after the run regardless of outcome.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::core::types::SENTINELS;

/// Workdir policy for one invocation.
#[derive(Debug, Clone, Default)]
pub struct WorkdirOptions {
    /// Fixed path from the command line, if any.
    pub explicit: Option<PathBuf>,
    /// Document path without its extension; basis for derived workdir names.
    /// `None` when the document came from stdin.
    pub derived_stem: Option<PathBuf>,
    /// Move an existing directory aside before anything else.
    pub backup: bool,
    /// Remove an existing directory instead of refusing to run.
    pub force: bool,
    /// Treat the workdir as temporary and remove it after the run.
    pub tmpdir: bool,
    /// The invocation was pointed at a pre-existing directory; use it as-is.
    pub reuse: bool,
}

/// A prepared working directory.
#[derive(Debug)]
pub struct Workdir {
    path: PathBuf,
    temporary: bool,
    temp: Option<TempDir>,
    /// Lifecycle messages emitted before the job's own log exists; the
    /// runner prepends them to `logfile.txt`.
    pub early_log: Vec<String>,
}

impl Workdir {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// Remove the directory if it was temporary. Missing or undeletable
    /// directories are tolerated; the run outcome is already decided.
    pub fn cleanup(self) -> Result<()> {
        if !self.temporary {
            return Ok(());
        }
        info!(path = %self.path.display(), "removing temporary workdir");
        match self.temp {
            Some(temp) => temp.close().context("remove temporary workdir")?,
            None => {
                if let Err(err) = fs::remove_dir_all(&self.path) {
                    warn!(path = %self.path.display(), err = %err, "failed to remove workdir");
                }
            }
        }
        Ok(())
    }
}

/// Prepare the working directory for one task.
pub fn prepare(task: Option<&str>, opts: &WorkdirOptions) -> Result<Workdir> {
    let mut early_log = Vec::new();

    let path = opts.explicit.clone().or_else(|| {
        if opts.tmpdir {
            return None;
        }
        opts.derived_stem.as_ref().map(|stem| match task {
            Some(task) => PathBuf::from(format!("{}_{task}", stem.display())),
            None => stem.clone(),
        })
    });

    let Some(path) = path else {
        let temp = TempDir::new().context("create temporary workdir")?;
        debug!(path = %temp.path().display(), "created temporary workdir");
        return Ok(Workdir {
            path: temp.path().to_path_buf(),
            temporary: true,
            temp: Some(temp),
            early_log,
        });
    };

    if opts.backup && path.exists() {
        let backup_path = next_backup_path(&path);
        early_log.push(format!(
            "Moving directory '{}' to '{}'.",
            path.display(),
            backup_path.display()
        ));
        info!(from = %path.display(), to = %backup_path.display(), "backing up workdir");
        fs::rename(&path, &backup_path)
            .with_context(|| format!("backup {} to {}", path.display(), backup_path.display()))?;
    }

    if opts.force && !opts.reuse {
        early_log.push(format!("Removing directory '{}'.", path.display()));
        if let Err(err) = fs::remove_dir_all(&path) {
            // Removing a directory that is not there is not an error.
            debug!(path = %path.display(), err = %err, "force removal skipped");
        }
    }

    if opts.reuse {
        if opts.force {
            clear_sentinels(&path)?;
        } else if let Some(name) = existing_sentinel(&path) {
            bail!(
                "directory '{}' holds a finished run ({name}); use --force to re-run",
                path.display()
            );
        }
    } else if path.is_dir() {
        bail!("directory '{}' already exists", path.display());
    } else {
        fs::create_dir_all(&path)
            .with_context(|| format!("create workdir {}", path.display()))?;
        debug!(path = %path.display(), "created workdir");
    }

    Ok(Workdir {
        path,
        temporary: opts.tmpdir,
        temp: None,
        early_log,
    })
}

/// Lowest-numbered unused `.bakNNN` sibling of `path`.
fn next_backup_path(path: &Path) -> PathBuf {
    let mut idx = 0;
    loop {
        let candidate = PathBuf::from(format!("{}.bak{idx:03}", path.display()));
        if !candidate.exists() {
            return candidate;
        }
        idx += 1;
    }
}

fn existing_sentinel(path: &Path) -> Option<&'static str> {
    SENTINELS.into_iter().find(|name| path.join(name).exists())
}

/// Drop outcome sentinels from a previous run before re-running in place.
fn clear_sentinels(path: &Path) -> Result<()> {
    for name in SENTINELS {
        let sentinel = path.join(name);
        if sentinel.exists() {
            fs::remove_file(&sentinel)
                .with_context(|| format!("remove sentinel {}", sentinel.display()))?;
        }
    }
    Ok(())
}
