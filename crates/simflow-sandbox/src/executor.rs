//! Script execution with a hard wall-clock timeout.

use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::config::ExecutorConfig;
use crate::error::{SandboxError, SandboxResult};

/// Text appended to stderr when a run is killed for exceeding its timeout.
pub const TIMEOUT_MARKER: &str = "TimeoutExpired";

// ─────────────────────────────────────────────────────────────────────────────
// Results
// ─────────────────────────────────────────────────────────────────────────────

/// How a script run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// The interpreter exited with status 0.
    Completed,
    /// The interpreter exited with a non-zero status (-1 when killed by a signal).
    NonZeroExit(i32),
    /// The interpreter could not be started.
    LaunchFailed,
    /// The run exceeded its timeout and was killed.
    TimedOut,
}

impl ExecutionStatus {
    /// Check if the script ran to a successful exit.
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionStatus::Completed)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Completed => write!(f, "completed"),
            ExecutionStatus::NonZeroExit(code) => write!(f, "exited with status {code}"),
            ExecutionStatus::LaunchFailed => write!(f, "failed to launch"),
            ExecutionStatus::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Captured output of one run.
#[derive(Debug, Clone)]
pub struct ExecutionOutput {
    /// Everything the interpreter wrote to stdout.
    pub stdout: String,
    /// Everything the interpreter wrote to stderr, plus any diagnostics
    /// added by the executor.
    pub stderr: String,
    /// How the run ended.
    pub status: ExecutionStatus,
    /// Wall-clock time from launch to exit or kill.
    pub elapsed: Duration,
}

// ─────────────────────────────────────────────────────────────────────────────
// Executor
// ─────────────────────────────────────────────────────────────────────────────

/// Runs scripts through the configured interpreter.
///
/// Safe to share between concurrent runs; each call owns its own process
/// and working directory.
#[derive(Debug, Clone)]
pub struct SandboxExecutor {
    config: ExecutorConfig,
}

impl SandboxExecutor {
    /// Create an executor with the given configuration.
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute `script` with `work_dir` as the current directory.
    ///
    /// The script is saved to the work dir as written, then fed to the
    /// interpreter's stdin behind the bootstrap preamble. Errors are
    /// returned only when the work dir cannot be prepared; everything the
    /// interpreter does is reported through [`ExecutionStatus`].
    pub async fn run(
        &self,
        script: &str,
        work_dir: &Path,
        timeout: Duration,
    ) -> SandboxResult<ExecutionOutput> {
        tokio::fs::create_dir_all(work_dir)
            .await
            .map_err(|source| SandboxError::WorkDir {
                path: work_dir.to_path_buf(),
                source,
            })?;

        let script_path = work_dir.join(&self.config.script_file);
        tokio::fs::write(&script_path, script)
            .await
            .map_err(|source| SandboxError::ScriptWrite {
                path: script_path.clone(),
                source,
            })?;

        let mut input = self.config.bootstrap.render();
        input.push_str(script);
        input.push('\n');

        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args)
            .current_dir(work_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout can take down helpers the
        // interpreter started (e.g. gnuplot) along with it.
        #[cfg(unix)]
        cmd.process_group(0);
        for (key, value) in &self.config.env_vars {
            cmd.env(key, value);
        }

        tracing::info!(
            program = %self.config.program,
            work_dir = %work_dir.display(),
            timeout_secs = timeout.as_secs_f64(),
            script_bytes = script.len(),
            "Launching interpreter"
        );

        let start = Instant::now();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(program = %self.config.program, error = %e, "Interpreter launch failed");
                return Ok(ExecutionOutput {
                    stdout: String::new(),
                    stderr: launch_failure_message(&self.config.program, &e),
                    status: ExecutionStatus::LaunchFailed,
                    elapsed: start.elapsed(),
                });
            }
        };

        let stdout_buf = Arc::new(Mutex::new(Vec::new()));
        let stderr_buf = Arc::new(Mutex::new(Vec::new()));
        let stdout_task = child
            .stdout
            .take()
            .map(|pipe| spawn_reader(pipe, Arc::clone(&stdout_buf)));
        let stderr_task = child
            .stderr
            .take()
            .map(|pipe| spawn_reader(pipe, Arc::clone(&stderr_buf)));

        let stdin_task = child.stdin.take().map(|mut stdin| {
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    if e.kind() == std::io::ErrorKind::BrokenPipe {
                        tracing::warn!("Interpreter closed stdin before reading the whole script");
                    } else {
                        tracing::warn!(error = %e, "Failed to write script to interpreter");
                    }
                }
            })
        });

        let status = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(exit)) if exit.success() => ExecutionStatus::Completed,
            Ok(Ok(exit)) => ExecutionStatus::NonZeroExit(exit.code().unwrap_or(-1)),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Failed to wait for interpreter");
                ExecutionStatus::NonZeroExit(-1)
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs_f64(),
                    "Script timed out, killing interpreter"
                );
                #[cfg(unix)]
                if let Some(pid) = child.id() {
                    kill_process_group(pid);
                }
                if let Err(e) = child.kill().await {
                    tracing::warn!(error = %e, "Failed to kill interpreter");
                }
                ExecutionStatus::TimedOut
            }
        };
        let elapsed = start.elapsed();

        if let Some(handle) = stdin_task {
            handle.abort();
        }

        // Descendants may still hold the pipes open; bound the drain.
        let deadline = tokio::time::Instant::now() + self.config.kill_grace;
        drain(stdout_task, deadline).await;
        drain(stderr_task, deadline).await;

        let stdout = String::from_utf8_lossy(&stdout_buf.lock()).into_owned();
        let mut stderr = String::from_utf8_lossy(&stderr_buf.lock()).into_owned();

        if status == ExecutionStatus::TimedOut {
            if !stderr.is_empty() && !stderr.ends_with('\n') {
                stderr.push('\n');
            }
            stderr.push_str(&format!(
                "{TIMEOUT_MARKER}: script exceeded the {timeout:?} time limit and was terminated.\n"
            ));
        }

        tracing::info!(
            %status,
            elapsed_ms = elapsed.as_millis() as u64,
            stdout_bytes = stdout.len(),
            stderr_bytes = stderr.len(),
            "Interpreter finished"
        );

        Ok(ExecutionOutput {
            stdout,
            stderr,
            status,
            elapsed,
        })
    }
}

/// Copy a pipe into a shared buffer chunk by chunk, so whatever was read
/// survives even if the task is aborted.
fn spawn_reader<R>(mut pipe: R, sink: Arc<Mutex<Vec<u8>>>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut chunk = [0u8; 8192];
        loop {
            match pipe.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => sink.lock().extend_from_slice(&chunk[..n]),
                Err(e) => {
                    tracing::debug!(error = %e, "Output pipe read failed");
                    break;
                }
            }
        }
    })
}

async fn drain(task: Option<JoinHandle<()>>, deadline: tokio::time::Instant) {
    if let Some(mut handle) = task
        && tokio::time::timeout_at(deadline, &mut handle).await.is_err()
    {
        tracing::debug!("Output reader still busy after grace period, abandoning");
        handle.abort();
    }
}

/// SIGKILL every process in the group led by `pgid`.
#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: kill(2) takes plain integers and touches no memory of ours.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            tracing::warn!(pgid, error = %err, "Failed to kill interpreter process group");
        }
    }
}

fn launch_failure_message(program: &str, err: &std::io::Error) -> String {
    if err.kind() == std::io::ErrorKind::NotFound {
        format!(
            "Error: '{program}' command not found. Is it installed and on your PATH?"
        )
    } else {
        format!("Error: failed to launch '{program}': {err}")
    }
}
