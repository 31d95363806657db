//! Run command - drive one request through the pipeline.

use anyhow::{Result, bail};
use clap::Args;
use futures::StreamExt;
use simflow_config::{PipelineSection, SandboxSection};
use simflow_pipeline::{SharedState, StageEvent, StageFailure, build_pipeline};

use super::{Context, build_transform};

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// The request, in plain language
    #[arg(required = true, num_args = 1..)]
    pub request: Vec<String>,

    /// Interpreter timeout in seconds (overrides `[sandbox].timeout_secs`)
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Send the request through the acknowledgement stage first
    #[arg(long)]
    pub acknowledge: bool,
}

/// Run the run command.
pub async fn run(args: RunArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx.load_config()?;

    if let Some(secs) = args.timeout {
        config.sandbox = Some(SandboxSection {
            timeout_secs: secs,
            ..config.sandbox()
        });
    }
    if args.acknowledge {
        config.pipeline = Some(PipelineSection {
            acknowledge: true,
            ..config.pipeline()
        });
    }

    let request = args.request.join(" ");
    let graph = build_pipeline(&config, build_transform(&config)?)?;
    tracing::info!(stages = graph.len(), "Starting run");

    let mut events = graph.execute(SharedState::new(request));
    let mut step = 0;

    while let Some(event) = events.next().await {
        match event {
            StageEvent::Completed { stage, update } => {
                step += 1;
                tracing::debug!(stage = %stage, fields = ?update.fields(), "Stage completed");
                if !ctx.json_output {
                    println!("Step {step}: {stage} completed.");
                }
            }
            StageEvent::Finished(state) => {
                print_finished(&state, ctx)?;
                return Ok(());
            }
            StageEvent::Failed(failure) => {
                print_failure(&failure, ctx)?;
                bail!("run failed at stage '{}'", failure.stage);
            }
        }
    }

    bail!("pipeline ended without a result")
}

fn print_finished(state: &SharedState, ctx: &Context) -> Result<()> {
    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(state)?);
        return Ok(());
    }

    println!();
    if let Some(ref summary) = state.summary {
        println!("{summary}");
    }
    if let Some(ref animation) = state.animation {
        println!();
        println!("Animation: {}", animation.display());
    } else if let Some(ref run_dir) = state.run_dir
        && ctx.verbose
    {
        println!();
        println!("Run directory: {}", run_dir.display());
    }
    Ok(())
}

fn print_failure(failure: &StageFailure, ctx: &Context) -> Result<()> {
    if ctx.json_output {
        let body = serde_json::json!({
            "stage": failure.stage,
            "kind": failure.kind().to_string(),
            "error": failure.error.to_string(),
            "run_dir": failure.error.run_dir(),
            "stderr": failure.error.stderr(),
            "state": failure.state,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    eprint!("{}", failure_report(failure));
    Ok(())
}

/// Plain-text description of a failed run: the error, where the run
/// directory is, and whatever the interpreter wrote to stderr.
fn failure_report(failure: &StageFailure) -> String {
    let mut report = format!(
        "Error in {} ({}): {}\n",
        failure.stage,
        failure.kind(),
        failure.error
    );
    if let Some(run_dir) = failure.error.run_dir() {
        report.push_str(&format!("Run directory: {}\n", run_dir.display()));
    }
    if let Some(stderr) = failure.error.stderr()
        && !stderr.trim().is_empty()
    {
        report.push('\n');
        report.push_str(stderr.trim_end());
        report.push('\n');
    }
    report
}
