//! Lifecycle tests driving `run_all` with a scripted job: task iteration,
//! workdir handling, report artifacts, and return-code aggregation.

use std::fs;

use sbyr::core::types::Status;
use sbyr::io::job::JobOutcome;
use sbyr::run::{RunOptions, Source, run_all};
use sbyr::test_support::{ScriptedJob, result, write_document};

const DOC: &str = "\
[tasks]
taskA fast
taskB slow

[options]
fast: use_fast_mode
~fast: use_slow_mode
";

fn options(source: Source) -> RunOptions {
    RunOptions {
        source,
        workdir: None,
        backup: false,
        force: false,
        tmpdir: false,
        strict: false,
        setup: false,
    }
}

fn tasks(names: &[&str]) -> Vec<Option<String>> {
    names.iter().map(|n| Some((*n).to_string())).collect()
}

#[test]
fn aggregate_retcode_is_bitwise_or() {
    let temp = tempfile::tempdir().expect("tempdir");
    let doc_path = write_document(temp.path(), "proj.sby", DOC);

    let job = ScriptedJob::finishing(vec![
        result(Status::Pass, "all good\n"),
        result(Status::Fail, "counterexample\n"),
    ]);
    let code = run_all(
        DOC,
        &tasks(&["taskA", "taskB"]),
        &options(Source::File(doc_path)),
        &job,
    )
    .expect("run");
    assert_eq!(code, 2);
}

#[test]
fn each_task_gets_its_own_resolved_config_and_workdir() {
    let temp = tempfile::tempdir().expect("tempdir");
    let doc_path = write_document(temp.path(), "proj.sby", DOC);

    let job = ScriptedJob::finishing(vec![result(Status::Pass, ""), result(Status::Pass, "")]);
    run_all(
        DOC,
        &tasks(&["taskA", "taskB"]),
        &options(Source::File(doc_path)),
        &job,
    )
    .expect("run");

    let requests = job.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].config.contains(&"use_fast_mode".to_string()));
    assert!(!requests[0].config.contains(&"use_slow_mode".to_string()));
    assert!(requests[1].config.contains(&"use_slow_mode".to_string()));
    assert_eq!(requests[0].workdir, temp.path().join("proj_taskA"));
    assert_eq!(requests[1].workdir, temp.path().join("proj_taskB"));
}

#[test]
fn reports_and_log_are_written_per_task() {
    let temp = tempfile::tempdir().expect("tempdir");
    let doc_path = write_document(temp.path(), "proj.sby", DOC);

    let job = ScriptedJob::finishing(vec![result(Status::Pass, "engine says hi\n")]);
    run_all(
        DOC,
        &tasks(&["taskA"]),
        &options(Source::File(doc_path)),
        &job,
    )
    .expect("run");

    let workdir = temp.path().join("proj_taskA");
    let status = fs::read_to_string(workdir.join("status")).expect("status");
    assert_eq!(status, "PASS 0 1\n");

    let log = fs::read_to_string(workdir.join("logfile.txt")).expect("log");
    assert!(log.contains("engine says hi"));
    assert!(log.ends_with("DONE (PASS, rc=0)\n"));

    let xml = fs::read_to_string(workdir.join("proj_taskA.xml")).expect("xml");
    assert!(xml.contains(r#"name="proj""#));
    assert!(xml.contains(r#"name="taskA""#));
    assert!(xml.contains("engine says hi"));
}

#[test]
fn failing_task_does_not_stop_the_batch() {
    let temp = tempfile::tempdir().expect("tempdir");
    let doc_path = write_document(temp.path(), "proj.sby", DOC);

    let job = ScriptedJob::finishing(vec![
        result(Status::Fail, "bad\n"),
        result(Status::Pass, "good\n"),
    ]);
    let code = run_all(
        DOC,
        &tasks(&["taskA", "taskB"]),
        &options(Source::File(doc_path)),
        &job,
    )
    .expect("run");
    assert_eq!(code, 2);
    assert_eq!(job.requests().len(), 2);
}

#[test]
fn abort_is_isolated_per_task_by_default() {
    let temp = tempfile::tempdir().expect("tempdir");
    let doc_path = write_document(temp.path(), "proj.sby", DOC);

    let job = ScriptedJob::new(vec![
        JobOutcome::Aborted(result(Status::Error, "gave up\n")),
        JobOutcome::Finished(result(Status::Pass, "")),
    ]);
    let code = run_all(
        DOC,
        &tasks(&["taskA", "taskB"]),
        &options(Source::File(doc_path)),
        &job,
    )
    .expect("run");
    assert_eq!(code, 16);
    assert_eq!(job.requests().len(), 2);

    // The aborted task still produced its reports.
    let xml = fs::read_to_string(temp.path().join("proj_taskA").join("proj_taskA.xml"))
        .expect("xml");
    assert!(xml.contains(r#"<error message="ERROR" type="ERROR"/>"#));
}

#[test]
fn strict_mode_makes_abort_fatal() {
    let temp = tempfile::tempdir().expect("tempdir");
    let doc_path = write_document(temp.path(), "proj.sby", DOC);

    let job = ScriptedJob::new(vec![
        JobOutcome::Aborted(result(Status::Error, "gave up\n")),
        JobOutcome::Finished(result(Status::Pass, "")),
    ]);
    let mut opts = options(Source::File(doc_path));
    opts.strict = true;

    let err = run_all(DOC, &tasks(&["taskA", "taskB"]), &opts, &job).unwrap_err();
    assert!(err.to_string().contains("job aborted"));
    // The batch stops at the aborted task.
    assert_eq!(job.requests().len(), 1);
}

#[test]
fn temporary_workdir_is_removed_after_the_run() {
    let temp = tempfile::tempdir().expect("tempdir");
    let doc_path = write_document(temp.path(), "proj.sby", DOC);

    let job = ScriptedJob::finishing(vec![result(Status::Pass, "")]);
    let mut opts = options(Source::File(doc_path));
    opts.tmpdir = true;

    let code = run_all(DOC, &tasks(&["taskA"]), &opts, &job).expect("run");
    assert_eq!(code, 0);

    // The derived path was never used and the actual workdir is gone.
    assert!(!temp.path().join("proj_taskA").exists());
    let requests = job.requests();
    assert!(!requests[0].workdir.exists());
}

#[test]
fn setup_mode_prepares_without_reports() {
    let temp = tempfile::tempdir().expect("tempdir");
    let doc_path = write_document(temp.path(), "proj.sby", DOC);

    let job = ScriptedJob::finishing(vec![result(Status::Pass, "")]);
    let mut opts = options(Source::File(doc_path));
    opts.setup = true;

    run_all(DOC, &tasks(&["taskA"]), &opts, &job).expect("run");

    assert!(job.requests()[0].setup_only);
    let workdir = temp.path().join("proj_taskA");
    assert!(!workdir.join("status").exists());
    assert!(!workdir.join("proj_taskA.xml").exists());
    let log = fs::read_to_string(workdir.join("logfile.txt")).expect("log");
    assert!(log.ends_with("SETUP COMPLETE (rc=0)\n"));
}

#[test]
fn unnamed_task_uses_plain_document_stem() {
    let temp = tempfile::tempdir().expect("tempdir");
    let doc = "[options]\nmode bmc\n";
    let doc_path = write_document(temp.path(), "plain.sby", doc);

    let job = ScriptedJob::finishing(vec![result(Status::Pass, "")]);
    run_all(doc, &[None], &options(Source::File(doc_path)), &job).expect("run");

    let workdir = temp.path().join("plain");
    assert!(workdir.join("status").exists());
    let xml = fs::read_to_string(workdir.join("plain.xml")).expect("xml");
    assert!(xml.contains(r#"name="default""#));
}

#[test]
fn fixed_workdir_is_used_verbatim() {
    let temp = tempfile::tempdir().expect("tempdir");
    let doc_path = write_document(temp.path(), "proj.sby", DOC);
    let fixed = temp.path().join("custom");

    let job = ScriptedJob::finishing(vec![result(Status::Pass, "")]);
    let mut opts = options(Source::File(doc_path));
    opts.workdir = Some(fixed.clone());

    run_all(DOC, &tasks(&["taskA"]), &opts, &job).expect("run");
    assert_eq!(job.requests()[0].workdir, fixed);
    assert!(fixed.join("status").exists());
}
