//! Generated configuration lines via embedded templates.
//!
//! A `--pycode-begin--` / `--pycode-end--` block carries a minijinja
//! template instead of arbitrary host code. The template sees exactly two
//! bindings: `task` (the task being resolved, or none in discovery mode)
//! and `tags` (the active tag set). Rendered output is split into lines and
//! fed back through the preprocessor, so generated lines may themselves be
//! tag directives or further template blocks.

use std::collections::HashSet;

use anyhow::{Context, Result};
use minijinja::{Environment, context};

/// Block delimiter lines, fixed by the document syntax.
pub const TEMPLATE_BEGIN: &str = "--pycode-begin--";
pub const TEMPLATE_END: &str = "--pycode-end--";

/// Render a template block body into configuration lines.
///
/// `tags` is exposed sorted so rendering is deterministic regardless of set
/// iteration order.
pub fn expand(body: &str, task: Option<&str>, tags: &HashSet<String>) -> Result<Vec<String>> {
    let mut sorted_tags: Vec<&str> = tags.iter().map(String::as_str).collect();
    sorted_tags.sort_unstable();

    let env = Environment::new();
    let rendered = env
        .render_str(
            body,
            context! {
                task => task,
                tags => sorted_tags,
            },
        )
        .context("render template block")?;

    // Block tags leave a trailing newline behind; don't let it turn into a
    // spurious empty configuration line.
    Ok(rendered
        .trim_end_matches('\n')
        .lines()
        .map(str::to_string)
        .collect())
}
