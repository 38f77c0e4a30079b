//! Task selection: which tasks one invocation runs, and in what order.

use anyhow::{Result, bail};

use crate::core::preprocess::resolve;

/// Effective ordered task set. `None` entries stand for the implicit
/// unnamed task of a document without a `[tasks]` section.
pub type TaskSet = Vec<Option<String>>;

/// Decide the tasks to run.
///
/// Explicit names are taken verbatim, in order, without validating them
/// against the document; an unknown name simply resolves with an empty tag
/// context. With no explicit names, a discovery pass enumerates the
/// `[tasks]` section; an empty task list yields one unnamed task.
pub fn select_tasks(explicit: &[String], doc: &str) -> Result<TaskSet> {
    if !explicit.is_empty() {
        return Ok(explicit.iter().cloned().map(Some).collect());
    }
    let discovered = resolve(doc, None)?.tasks;
    if discovered.is_empty() {
        return Ok(vec![None]);
    }
    Ok(discovered.into_iter().map(Some).collect())
}

/// A fixed workdir path can only receive one task's artifacts.
pub fn check_workdir_override(task_count: usize, workdir_fixed: bool) -> Result<()> {
    if workdir_fixed && task_count != 1 {
        bail!("exactly one task is required when a workdir is specified");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
[tasks]
taskA fast
taskB slow
";

    #[test]
    fn explicit_names_pass_through_unvalidated() {
        let tasks =
            select_tasks(&["zeta".to_string(), "taskA".to_string()], DOC).expect("select");
        assert_eq!(
            tasks,
            vec![Some("zeta".to_string()), Some("taskA".to_string())]
        );
    }

    #[test]
    fn discovery_enumerates_declared_tasks() {
        let tasks = select_tasks(&[], DOC).expect("select");
        assert_eq!(
            tasks,
            vec![Some("taskA".to_string()), Some("taskB".to_string())]
        );
    }

    #[test]
    fn no_tasks_section_means_one_unnamed_task() {
        let tasks = select_tasks(&[], "[options]\nmode bmc\n").expect("select");
        assert_eq!(tasks, vec![None]);
    }

    #[test]
    fn duplicate_declarations_run_twice() {
        let doc = "\
[tasks]
a
a
";
        let tasks = select_tasks(&[], doc).expect("select");
        assert_eq!(tasks, vec![Some("a".to_string()), Some("a".to_string())]);
    }

    #[test]
    fn fixed_workdir_requires_single_task() {
        check_workdir_override(1, true).expect("one task is fine");
        check_workdir_override(3, false).expect("no override is fine");
        assert!(check_workdir_override(2, true).is_err());
        assert!(check_workdir_override(0, true).is_err());
    }
}
