//! simflow - turn a plain-language request into a simulation run.
//!
//! Main entry point for the simflow CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

mod commands;

use commands::{check, run};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// simflow - generate, run and animate numerical simulations from plain language
#[derive(Parser)]
#[command(name = "simflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Extra config file, merged over the discovered ones
    #[arg(long, global = true, env = "SIMFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline for one request
    Run(run::RunArgs),

    /// Check that the interpreter and text-transform backend are usable
    Check(check::CheckArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.verbose);

    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
        config_file: cli.config,
    };

    match cli.command {
        Commands::Run(args) => run::run(args, &ctx).await,
        Commands::Check(args) => check::run(args, &ctx).await,
    }
}

/// Console (human-readable, stderr) + daily-rolling JSON file.
fn init_tracing(verbose: bool) -> Option<WorkerGuard> {
    use tracing_subscriber::prelude::*;

    let filter = if verbose {
        "simflow=debug,simflow_pipeline=debug,simflow_sandbox=debug,simflow_artifact=debug,simflow_llm=debug,simflow_config=debug,info"
    } else {
        "simflow=info,simflow_pipeline=info,simflow_sandbox=info,simflow_artifact=info,simflow_llm=info,warn"
    };

    let log_dir = simflow_config::xdg_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("simflow.log")
        .build(&log_dir);

    let (file_layer, guard) = match appender {
        Ok(appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "simflow=trace,simflow_pipeline=trace,simflow_sandbox=trace,simflow_artifact=trace,simflow_llm=trace,simflow_config=trace,info",
                ));
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("warning: file logging disabled ({}): {e}", log_dir.display());
            (None, None)
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(file_layer)
        .init();

    guard
}
