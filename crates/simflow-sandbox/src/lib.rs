//! Isolated, time-bounded script execution.
//!
//! This crate runs an externally supplied script through an interpreter
//! inside a directory owned by a single run, and reports what happened
//! without ever panicking on the script's behalf.
//!
//! # Guarantees
//!
//! - **Headless**: a bootstrap preamble picks a rendering toolkit and hides
//!   figures before the caller's script runs
//! - **Bounded**: a hard wall-clock timeout; the process is killed and reaped
//! - **Distinguishable failures**: a missing interpreter is
//!   [`ExecutionStatus::LaunchFailed`], a timeout is
//!   [`ExecutionStatus::TimedOut`] *and* leaves [`TIMEOUT_MARKER`] in stderr
//! - **Isolated**: every run gets a fresh [`RunDirectory`]
//!
//! # Example
//!
//! ```no_run
//! use simflow_sandbox::{ExecutorConfig, RunDirectory, SandboxExecutor};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let run_dir = RunDirectory::create("test_runs")?;
//!     let executor = SandboxExecutor::new(ExecutorConfig::default());
//!
//!     let output = executor
//!         .run("disp(42)", run_dir.path(), Duration::from_secs(30))
//!         .await?;
//!     println!("{:?}: {}", output.status, output.stdout);
//!     Ok(())
//! }
//! ```

mod bootstrap;
mod config;
mod error;
mod executor;
mod interpreter;
mod run_dir;

pub use bootstrap::Bootstrap;
pub use config::ExecutorConfig;
pub use error::{SandboxError, SandboxResult};
pub use executor::{ExecutionOutput, ExecutionStatus, SandboxExecutor, TIMEOUT_MARKER};
pub use interpreter::InterpreterStatus;
pub use run_dir::RunDirectory;
