use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use seeclaw_pilot::config::{self, Overrides};
use seeclaw_pilot::errors::PilotResult;
use seeclaw_pilot::scenario::{self, Scenario};

/// Drive the desktop with a vision model through tool calls.
#[derive(Debug, Parser)]
#[command(name = "seeclaw-pilot", version, about)]
struct Cli {
    /// Scenario file. Without it the built-in demo task runs.
    #[arg(requires = "scenario_index")]
    scenario_file: Option<PathBuf>,

    /// Number of the `=== SCENARIO <n> ===` block to run.
    scenario_index: Option<u32>,

    /// Explicit config.toml (otherwise searched next to the binary, in the
    /// working directory and in the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Screenshots kept in the conversation (0 = none).
    #[arg(long, alias = "keep_screens")]
    keep_screens: Option<usize>,

    /// Maximum number of model requests.
    #[arg(long, alias = "max_steps")]
    max_steps: Option<u32>,

    /// Directory for persisted screenshots.
    #[arg(long, alias = "dump_dir")]
    dump_dir: Option<PathBuf>,

    /// Do not write screenshots to disk.
    #[arg(long)]
    no_dump: bool,
}

async fn run(cli: Cli) -> PilotResult<()> {
    let mut cfg = config::load_config(cli.config.as_deref())?;
    cfg.apply(&Overrides {
        keep_screens: cli.keep_screens,
        max_steps: cli.max_steps,
        dump_dir: cli.dump_dir,
        no_dump: cli.no_dump,
    });

    let scenario = match (&cli.scenario_file, cli.scenario_index) {
        (Some(path), Some(index)) => scenario::load_scenario(path, index)?,
        _ => {
            tracing::info!("no scenario file given; running built-in task");
            Scenario::builtin()?
        }
    };

    let outcome = seeclaw_pilot::run(cfg, scenario).await?;
    tracing::info!(
        run_id = %outcome.run_id,
        reason = ?outcome.stop_reason,
        steps = outcome.steps,
        requests = outcome.model_requests,
        transcript_len = outcome.transcript_len,
        elapsed_ms = (outcome.finished_at - outcome.started_at).num_milliseconds(),
        "done"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();
    seeclaw_pilot::init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            eprintln!("seeclaw-pilot: {e}");
            ExitCode::FAILURE
        }
    }
}
