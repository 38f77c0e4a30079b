//! Persisted run reports: the `status` line, a machine-readable
//! `status.json`, and a JUnit-style XML document.
//!
//! These are product artifacts read by CI systems; they are written with
//! explicit error contexts and never go through the tracing layer.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::types::RunResult;
use crate::retcode;

/// Naming for the XML report, derived from the document, workdir, and task.
#[derive(Debug, Clone)]
pub struct ReportNames {
    /// Test-suite name (document stem, workdir name, or `stdin`).
    pub suite: String,
    /// Test-case name (task name or `default`).
    pub case: String,
    /// Report file stem; the document lands at `<stem>.xml`.
    pub file_stem: String,
}

/// Write all report artifacts for one finished task into its workdir.
pub fn write_reports(workdir: &Path, names: &ReportNames, result: &RunResult) -> Result<()> {
    let status_path = workdir.join("status");
    fs::write(
        &status_path,
        format!(
            "{} {} {}\n",
            result.status.as_str(),
            result.retcode,
            result.elapsed_secs
        ),
    )
    .with_context(|| format!("write {}", status_path.display()))?;

    let json_path = workdir.join("status.json");
    let mut json = serde_json::to_string_pretty(result).context("serialize status record")?;
    json.push('\n');
    fs::write(&json_path, json).with_context(|| format!("write {}", json_path.display()))?;

    let xml_path = workdir.join(format!("{}.xml", names.file_stem));
    fs::write(&xml_path, junit_document(names, result))
        .with_context(|| format!("write {}", xml_path.display()))?;
    Ok(())
}

fn junit_document(names: &ReportNames, result: &RunResult) -> String {
    let errors = i32::from(result.retcode == retcode::ERROR);
    let failures = i32::from(result.retcode != 0 && errors == 0);
    let status = result.status.as_str();
    let time = result.elapsed_secs;
    let suite = xml_escape(&names.suite);
    let case = xml_escape(&names.case);

    let mut doc = String::new();
    let _ = writeln!(doc, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        doc,
        r#"<testsuites disabled="0" errors="{errors}" failures="{failures}" tests="1" time="{time}">"#
    );
    let _ = writeln!(
        doc,
        r#"<testsuite disabled="0" errors="{errors}" failures="{failures}" name="{suite}" skipped="0" tests="1" time="{time}">"#
    );
    let _ = writeln!(doc, "<properties>");
    let _ = writeln!(
        doc,
        r#"<property name="os" value="{}"/>"#,
        std::env::consts::OS
    );
    let _ = writeln!(doc, "</properties>");
    let _ = writeln!(
        doc,
        r#"<testcase classname="{suite}" name="{case}" status="{status}" time="{time}">"#
    );
    if errors != 0 {
        let _ = writeln!(doc, r#"<error message="{status}" type="{status}"/>"#);
    }
    if failures != 0 {
        let _ = writeln!(doc, r#"<failure message="{status}" type="{status}"/>"#);
    }
    let _ = write!(doc, "<system-out>{}", xml_escape(&result.log));
    doc.push_str("</system-out></testcase></testsuite></testsuites>\n");
    doc
}

/// Escape the XML-reserved characters in embedded log text. The ampersand
/// must go first or it would re-escape the other entities.
pub fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
