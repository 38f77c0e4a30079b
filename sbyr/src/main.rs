//! Front-end runner for Yosys-based formal verification flows.
//!
//! Resolves one `.sby` document into per-task configurations, prepares a
//! working directory per task, drives the external engine, and exits with
//! the bitwise OR of all per-task return codes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;

use sbyr::core::preprocess::resolve;
use sbyr::core::select::{check_workdir_override, select_tasks};
use sbyr::io::config::load_config;
use sbyr::io::job::EngineJob;
use sbyr::logging;
use sbyr::run::{RunOptions, Source, run_all};

#[derive(Parser)]
#[command(
    name = "sbyr",
    version,
    about = "Front-end runner for Yosys-based formal verification flows"
)]
struct Cli {
    /// `.sby` document to run, or an existing workdir to re-run. The
    /// document is read from stdin when omitted.
    source: Option<PathBuf>,

    /// Task names to run (defaults to every task declared in the document).
    tasks: Vec<String>,

    /// Set the workdir name. Default: document stem, plus `_<task>`.
    #[arg(short = 'd', long, value_name = "DIR")]
    workdir: Option<PathBuf>,

    /// Remove the workdir if it already exists.
    #[arg(short = 'f', long)]
    force: bool,

    /// Back up the workdir if it already exists.
    #[arg(short = 'b', long)]
    backup: bool,

    /// Run in a temporary workdir (removed when finished).
    #[arg(short = 't', long)]
    tmpdir: bool,

    /// Add a task name (useful when the document is read from stdin).
    #[arg(short = 'T', long = "task", value_name = "NAME")]
    added_tasks: Vec<String>,

    /// Treat a job abort as fatal for the whole invocation.
    #[arg(short = 'E', long)]
    strict: bool,

    /// Change directory before starting tasks.
    #[arg(short = 'c', long, value_name = "DIR")]
    chdir: Option<PathBuf>,

    /// Executable to use for yosys.
    #[arg(long, value_name = "PATH")]
    yosys: Option<String>,

    /// Executable to use for abc.
    #[arg(long, value_name = "PATH")]
    abc: Option<String>,

    /// Executable to use for smtbmc.
    #[arg(long, value_name = "PATH")]
    smtbmc: Option<String>,

    /// Executable to use for suprove.
    #[arg(long, value_name = "PATH")]
    suprove: Option<String>,

    /// Executable to use for aigbmc.
    #[arg(long, value_name = "PATH")]
    aigbmc: Option<String>,

    /// Executable to use for avy.
    #[arg(long, value_name = "PATH")]
    avy: Option<String>,

    /// Executable to use for btormc.
    #[arg(long, value_name = "PATH")]
    btormc: Option<String>,

    /// Print the resolved configuration and exit.
    #[arg(long)]
    dumpcfg: bool,

    /// Print the list of tasks and exit.
    #[arg(long)]
    dumptasks: bool,

    /// Set up the working directory and exit without running the engine.
    #[arg(long)]
    setup: bool,
}

fn main() {
    logging::init();
    match run(Cli::parse()) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let source = classify_source(&cli)?;
    let workdir = match &source {
        Source::Dir(dir) => Some(dir.clone()),
        Source::File(_) | Source::Stdin => cli.workdir.clone(),
    };

    let doc = match source.document_path() {
        Some(path) => {
            fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?
        }
        None => std::io::read_to_string(std::io::stdin()).context("read document from stdin")?,
    };

    // Positional task names take precedence over -T additions.
    let explicit = if cli.tasks.is_empty() {
        cli.added_tasks.clone()
    } else {
        cli.tasks.clone()
    };

    if cli.dumpcfg {
        if explicit.len() > 1 {
            bail!("--dumpcfg accepts at most one task");
        }
        let resolved = resolve(&doc, explicit.first().map(String::as_str))?;
        for line in resolved.config {
            println!("{line}");
        }
        return Ok(0);
    }

    let tasks = select_tasks(&explicit, &doc)?;

    if cli.dumptasks {
        for task in tasks.into_iter().flatten() {
            println!("{task}");
        }
        return Ok(0);
    }

    check_workdir_override(tasks.len(), workdir.is_some())?;

    if let Some(dir) = &cli.chdir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("change directory to {}", dir.display()))?;
    }

    let cfg = load_config(Path::new("sbyr.toml"))?;
    let mut tool_paths = cfg.tools.clone();
    let overrides = [
        ("yosys", &cli.yosys),
        ("abc", &cli.abc),
        ("smtbmc", &cli.smtbmc),
        ("suprove", &cli.suprove),
        ("aigbmc", &cli.aigbmc),
        ("avy", &cli.avy),
        ("btormc", &cli.btormc),
    ];
    for (tool, path) in overrides {
        if let Some(path) = path {
            tool_paths.insert(tool.to_string(), path.clone());
        }
    }

    let job = EngineJob {
        command: cfg.engine.command.clone(),
        tool_paths,
        timeout: Duration::from_secs(cfg.engine.timeout_secs),
        output_limit_bytes: cfg.engine.output_limit_bytes,
    };

    let opts = RunOptions {
        source,
        workdir,
        backup: cli.backup,
        force: cli.force,
        tmpdir: cli.tmpdir,
        strict: cli.strict,
        setup: cli.setup,
    };
    run_all(&doc, &tasks, &opts, &job)
}

/// Decide whether the positional source is a document, a reusable workdir,
/// or absent (stdin), and reject option combinations that make no sense for
/// a reused directory.
fn classify_source(cli: &Cli) -> Result<Source> {
    let Some(path) = &cli.source else {
        return Ok(Source::Stdin);
    };
    if path.is_dir() {
        if !cli.tasks.is_empty() || !cli.added_tasks.is_empty() {
            bail!("cannot select tasks when running in an existing directory");
        }
        if cli.setup {
            bail!("cannot use --setup with an existing directory");
        }
        if cli.backup {
            bail!("cannot use --backup with an existing directory");
        }
        return Ok(Source::Dir(path.clone()));
    }
    if path.extension().and_then(|ext| ext.to_str()) != Some("sby") {
        bail!("document '{}' does not have a .sby extension", path.display());
    }
    Ok(Source::File(path.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_source_and_tasks() {
        let cli = Cli::parse_from(["sbyr", "proj.sby", "taskA", "taskB"]);
        assert_eq!(cli.source, Some(PathBuf::from("proj.sby")));
        assert_eq!(cli.tasks, vec!["taskA", "taskB"]);
        assert!(!cli.force);
    }

    #[test]
    fn parse_flags() {
        let cli = Cli::parse_from([
            "sbyr", "-f", "-b", "-t", "-E", "-d", "work", "-T", "extra", "proj.sby",
        ]);
        assert!(cli.force && cli.backup && cli.tmpdir && cli.strict);
        assert_eq!(cli.workdir, Some(PathBuf::from("work")));
        assert_eq!(cli.added_tasks, vec!["extra"]);
    }

    #[test]
    fn parse_tool_overrides_and_modes() {
        let cli = Cli::parse_from(["sbyr", "--yosys", "/opt/yosys", "--dumpcfg", "proj.sby"]);
        assert_eq!(cli.yosys.as_deref(), Some("/opt/yosys"));
        assert!(cli.dumpcfg);
        assert!(!cli.dumptasks);
    }

    #[test]
    fn non_sby_extension_is_rejected() {
        let cli = Cli::parse_from(["sbyr", "proj.txt"]);
        let err = classify_source(&cli).unwrap_err();
        assert!(err.to_string().contains(".sby extension"));
    }

    #[test]
    fn stdin_source_when_omitted() {
        let cli = Cli::parse_from(["sbyr", "-T", "taskA"]);
        assert_eq!(classify_source(&cli).expect("classify"), Source::Stdin);
    }
}
