//! Tag matching for task-conditional document lines.
//!
//! A line may be governed by one declared tag: `tag: rest` keeps `rest` iff
//! the tag is active, `~tag: rest` iff it is not. A bare `tag:` / `~tag:`
//! opens a block that runs until a line equal to `--`.
//!
//! Tags are tried in declaration order and the first prefix match wins, so
//! only one tag ever governs a line. Tag names that are prefixes of each
//! other (e.g. `fast` and `fast2`) can therefore shadow one another; this is
//! a correctness requirement on the document, not something the matcher
//! enforces.

use std::collections::HashSet;

use anyhow::{Result, bail};

/// All tags ever declared in the `[tasks]` section, in first-appearance
/// order with duplicates dropped.
#[derive(Debug, Clone, Default)]
pub struct TagTable {
    names: Vec<String>,
}

impl TagTable {
    /// Record a declared tag, keeping declaration order.
    pub fn declare(&mut self, name: &str) {
        if !self.names.iter().any(|n| n == name) {
            self.names.push(name.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// How a line relates to the declared tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMatch<'a> {
    /// Single-line directive: keep `rest` iff `keep` is set.
    Line { keep: bool, rest: &'a str },
    /// Block opener: include lines up to the `--` terminator iff `keep`.
    Block { keep: bool },
    /// No declared tag governs this line.
    Plain,
}

/// Match `line` against the declared tags.
///
/// Fails on a malformed specifier: a line whose first token ends with `:`
/// and starts at column zero, yet names no declared tag. Silently passing
/// such a line through would hide a typo in a task condition.
pub fn match_line<'a>(
    line: &'a str,
    all: &TagTable,
    active: &HashSet<String>,
) -> Result<TagMatch<'a>> {
    for tag in all.iter() {
        let (rest, satisfied) = if let Some(rest) = strip_tag_prefix(line, tag) {
            (rest, active.contains(tag))
        } else if let Some(rest) = line
            .strip_prefix('~')
            .and_then(|l| strip_tag_prefix(l, tag))
        {
            (rest, !active.contains(tag))
        } else {
            continue;
        };

        let rest = rest.trim_start();
        if rest.is_empty() {
            return Ok(TagMatch::Block { keep: satisfied });
        }
        return Ok(TagMatch::Line {
            keep: satisfied,
            rest,
        });
    }

    if !all.is_empty()
        && let Some(token) = line.split_whitespace().next()
        && token.ends_with(':')
        && token.chars().next() == line.chars().next()
    {
        bail!("invalid task specifier {token:?}");
    }

    Ok(TagMatch::Plain)
}

fn strip_tag_prefix<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    line.strip_prefix(tag)?.strip_prefix(':')
}
