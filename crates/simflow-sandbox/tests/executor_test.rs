//! Integration tests for the sandbox executor.
//!
//! The interpreter is stood in for by `sh -c`, which ignores the preamble on
//! stdin unless the command reads it.

#![cfg(unix)]

use std::time::{Duration, Instant};

use simflow_sandbox::{
    Bootstrap, ExecutionStatus, ExecutorConfig, RunDirectory, SandboxExecutor, TIMEOUT_MARKER,
};

fn shell(command: &str) -> SandboxExecutor {
    SandboxExecutor::new(
        ExecutorConfig::new()
            .with_interpreter("sh", vec!["-c".to_string(), command.to_string()])
            .with_kill_grace(Duration::from_millis(500)),
    )
}

#[tokio::test]
async fn test_completed_run_captures_output() {
    let tmp = tempfile::tempdir().unwrap();
    let executor = shell("echo hello; echo oops >&2");

    let output = executor
        .run("disp(1)", tmp.path(), Duration::from_secs(10))
        .await
        .unwrap();

    assert_eq!(output.status, ExecutionStatus::Completed);
    assert_eq!(output.stdout, "hello\n");
    assert_eq!(output.stderr, "oops\n");
}

#[tokio::test]
async fn test_preamble_precedes_script_on_stdin() {
    let tmp = tempfile::tempdir().unwrap();
    let executor = shell("cat");

    let output = executor
        .run("plot(1:10);", tmp.path(), Duration::from_secs(10))
        .await
        .unwrap();

    assert_eq!(output.status, ExecutionStatus::Completed);
    let preamble = Bootstrap::default().render();
    assert!(output.stdout.starts_with(&preamble));
    assert!(output.stdout.ends_with("plot(1:10);\n"));
}

#[tokio::test]
async fn test_script_saved_without_preamble() {
    let tmp = tempfile::tempdir().unwrap();
    let work_dir = tmp.path().join("nested").join("run");
    let executor = shell("true");

    executor
        .run("x = 1;", &work_dir, Duration::from_secs(10))
        .await
        .unwrap();

    let saved = std::fs::read_to_string(work_dir.join("script.m")).unwrap();
    assert_eq!(saved, "x = 1;");
}

#[tokio::test]
async fn test_runs_in_work_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let executor = shell("echo frame > frame_1.png");

    let output = executor
        .run("", tmp.path(), Duration::from_secs(10))
        .await
        .unwrap();

    assert_eq!(output.status, ExecutionStatus::Completed);
    assert!(tmp.path().join("frame_1.png").is_file());
}

#[tokio::test]
async fn test_nonzero_exit() {
    let tmp = tempfile::tempdir().unwrap();
    let executor = shell("echo 'error: undefined near line 1' >&2; exit 3");

    let output = executor
        .run("bad()", tmp.path(), Duration::from_secs(10))
        .await
        .unwrap();

    assert_eq!(output.status, ExecutionStatus::NonZeroExit(3));
    assert!(output.stderr.contains("undefined near line 1"));
    assert!(!output.stderr.contains(TIMEOUT_MARKER));
}

#[tokio::test]
async fn test_timeout_kills_and_keeps_partial_output() {
    let tmp = tempfile::tempdir().unwrap();
    let executor = shell("echo started; exec sleep 30");

    let start = Instant::now();
    let output = executor
        .run("while true; end", tmp.path(), Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(output.status, ExecutionStatus::TimedOut);
    assert!(start.elapsed() < Duration::from_secs(10));
    assert_eq!(output.stdout, "started\n");
    assert!(output.stderr.contains(TIMEOUT_MARKER));
}

#[tokio::test]
async fn test_timeout_kills_interpreter_descendants() {
    let tmp = tempfile::tempdir().unwrap();
    // The subshell outlives a plain kill of `sh`; only a group kill stops it.
    let executor = shell("echo started; (sleep 2; touch survivor) & sleep 30");

    let start = Instant::now();
    let output = executor
        .run("disp(1)", tmp.path(), Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(output.status, ExecutionStatus::TimedOut);
    assert!(output.stderr.contains(TIMEOUT_MARKER));
    // Nothing holds the pipes open, so the drain does not wait out the grace.
    assert!(start.elapsed() < Duration::from_secs(5));

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(
        !tmp.path().join("survivor").exists(),
        "a descendant of the interpreter survived the timeout"
    );
}

#[tokio::test]
async fn test_missing_interpreter_is_launch_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let executor = SandboxExecutor::new(
        ExecutorConfig::new().with_interpreter("simflow-no-such-interpreter", vec![]),
    );

    let output = executor
        .run("disp(1)", tmp.path(), Duration::from_secs(10))
        .await
        .unwrap();

    assert_eq!(output.status, ExecutionStatus::LaunchFailed);
    assert!(output.stderr.contains("command not found"));
    assert!(!output.stderr.contains(TIMEOUT_MARKER));
    assert!(output.stdout.is_empty());
}

#[tokio::test]
async fn test_env_vars_are_passed() {
    let tmp = tempfile::tempdir().unwrap();
    let executor = SandboxExecutor::new(
        ExecutorConfig::new()
            .with_interpreter(
                "sh",
                vec!["-c".to_string(), "printf %s \"$GNUTERM\"".to_string()],
            )
            .add_env("GNUTERM", "dumb"),
    );

    let output = executor
        .run("", tmp.path(), Duration::from_secs(10))
        .await
        .unwrap();
    assert_eq!(output.stdout, "dumb");
}

#[tokio::test]
async fn test_concurrent_runs_are_isolated() {
    let tmp = tempfile::tempdir().unwrap();
    let a = RunDirectory::create(tmp.path()).unwrap();
    let b = RunDirectory::create(tmp.path()).unwrap();
    let executor = shell("touch frame_1.png; ls");

    let (out_a, out_b) = tokio::join!(
        executor.run("", a.path(), Duration::from_secs(10)),
        executor.run("", b.path(), Duration::from_secs(10)),
    );
    let (out_a, out_b) = (out_a.unwrap(), out_b.unwrap());

    assert_eq!(out_a.status, ExecutionStatus::Completed);
    assert_eq!(out_b.status, ExecutionStatus::Completed);
    assert!(a.path().join("frame_1.png").is_file());
    assert!(b.path().join("frame_1.png").is_file());
    assert_eq!(out_a.stdout, out_b.stdout);
    assert_eq!(std::fs::read_dir(a.path()).unwrap().count(), 2);
}
