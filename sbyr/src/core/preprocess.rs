//! Document preprocessing: one raw `.sby` document in, one task's resolved
//! configuration out.
//!
//! The preprocessor scans the whole document once per resolution. It parses
//! the `[tasks]` section, filters tag-conditional lines against the task
//! being resolved, and expands embedded template blocks. Task discovery is a
//! side effect of every pass: the task list is accumulated whether or not a
//! specific task was requested.
//!
//! Expansion is queue-driven rather than recursive: lines produced by a
//! template block are pushed in front of the remaining input, so deeply
//! nested generation cannot grow the call stack.

use std::collections::{HashSet, VecDeque};

use anyhow::Result;

use crate::core::tags::{TagMatch, TagTable, match_line};
use crate::core::template::{TEMPLATE_BEGIN, TEMPLATE_END, expand};

/// Output of one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Filtered and expanded configuration lines.
    pub config: Vec<String>,
    /// Task names in `[tasks]` order, duplicates preserved.
    pub tasks: Vec<String>,
}

/// Resolve `doc` for `task`, or run in discovery mode when `task` is `None`.
///
/// In discovery mode the `[tasks]` section is preserved verbatim in the
/// output; when resolving a task it is consumed and replaced by the tag
/// context it declares.
pub fn resolve(doc: &str, task: Option<&str>) -> Result<Resolved> {
    let mut pp = Preprocessor {
        task,
        config: Vec::new(),
        tasks: Vec::new(),
        tags_all: TagTable::default(),
        tags_active: HashSet::new(),
        in_tasks_section: false,
        template: None,
        in_block: false,
        skip_block: false,
    };

    let mut queue: VecDeque<String> = doc
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect();

    while let Some(line) = queue.pop_front() {
        for (idx, generated) in pp.handle(&line)?.into_iter().enumerate() {
            queue.insert(idx, generated);
        }
    }

    Ok(Resolved {
        config: pp.config,
        tasks: pp.tasks,
    })
}

/// Explicit state machine for one resolution pass (one instance per call to
/// [`resolve`]).
struct Preprocessor<'a> {
    task: Option<&'a str>,
    config: Vec<String>,
    tasks: Vec<String>,
    tags_all: TagTable,
    tags_active: HashSet<String>,
    in_tasks_section: bool,
    /// Accumulating template body, when inside a template block.
    template: Option<String>,
    /// Inside a tag-governed block, waiting for the `--` terminator.
    in_block: bool,
    /// The current tag-governed block is inactive and its lines drop.
    skip_block: bool,
}

impl Preprocessor<'_> {
    /// Process one line; returns lines generated by template expansion, to
    /// be handled before the rest of the input.
    fn handle(&mut self, line: &str) -> Result<Vec<String>> {
        // Template accumulation captures lines verbatim, unfiltered.
        if let Some(body) = self.template.as_mut() {
            if line == TEMPLATE_END {
                let body = self.template.take().unwrap_or_default();
                return expand(&body, self.task, &self.tags_active);
            }
            body.push_str(line);
            body.push('\n');
            return Ok(Vec::new());
        }
        if line == TEMPLATE_BEGIN {
            self.template = Some(String::new());
            return Ok(Vec::new());
        }

        // A new section header closes the [tasks] section before the line
        // itself is handled.
        if self.in_tasks_section && line.starts_with('[') {
            self.in_tasks_section = false;
        }

        if self.in_block && line == "--" {
            self.in_block = false;
            self.skip_block = false;
            return Ok(Vec::new());
        }

        let mut skip_line = false;
        let mut current = line;
        match match_line(line, &self.tags_all, &self.tags_active)? {
            TagMatch::Line { keep, rest } => {
                skip_line = !keep;
                current = rest;
            }
            TagMatch::Block { keep } => {
                self.in_block = true;
                self.skip_block = !keep;
                skip_line = true;
            }
            TagMatch::Plain => {}
        }

        if skip_line || self.skip_block {
            return Ok(Vec::new());
        }

        if self.in_tasks_section {
            self.record_task_line(current);
        } else if current == "[tasks]" {
            if self.task.is_none() {
                self.config.push(current.to_string());
            }
            self.in_tasks_section = true;
        } else {
            self.config.push(current.to_string());
        }
        Ok(Vec::new())
    }

    fn record_task_line(&mut self, line: &str) {
        // Discovery mode keeps the section verbatim, comments included.
        if self.task.is_none() {
            self.config.push(line.to_string());
        }
        if line.starts_with('#') {
            return;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(first) = tokens.first() else {
            return;
        };
        self.tasks.push((*first).to_string());
        let resolving = self.task == Some(*first);
        for token in &tokens {
            if resolving {
                self.tags_active.insert((*token).to_string());
            }
            self.tags_all.declare(token);
        }
    }
}
