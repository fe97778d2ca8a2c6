use anyhow::Context;
use clap::Parser;
use env_logger::Builder;
use log::{LevelFilter, info, warn};

use sionna_delay_bridge::bridge::BridgeHandle;
use sionna_delay_bridge::progress::{ComparisonSummary, load_comparison_log};
use sionna_delay_bridge::propagation::DelayModel;
use sionna_delay_bridge::error::{BridgeError, DelayError};
use sionna_delay_bridge::scenario::{Scenario, ScenarioConfig, ScenarioReport};

mod options;

use options::{Cli, Command, RunArgs};

/// Combine the simulation outcome with the bridge shutdown result.
///
/// An aborted simulation is the error reported; a shutdown failure on top of
/// it is only logged.
fn settle(outcome: Result<ScenarioReport, DelayError>, shutdown: Result<(), BridgeError>) -> anyhow::Result<ScenarioReport> {
    match (outcome, shutdown) {
        (Ok(report), Ok(())) => Ok(report),
        (Ok(_), Err(e)) => Err(anyhow::Error::new(e).context("shutting down channel bridge")),
        (Err(e), shutdown) => {
            if let Err(shutdown_err) = shutdown {
                warn!("Channel bridge shutdown failed: {}", shutdown_err);
            }
            Err(anyhow::Error::new(e).context("simulation aborted"))
        }
    }
}

fn run(args: &RunArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ScenarioConfig::load(path).with_context(|| format!("loading scenario {}", path.display()))?,
        None => ScenarioConfig::default(),
    };
    args.apply(&mut config);
    config.validate().context("invalid scenario")?;

    // Configure the bridge before any model or node exists.
    let bridge = BridgeHandle::new();
    bridge.configure(config.bridge.clone()).context("configuring channel bridge")?;

    let mut model = DelayModel::from_config(&config.delay, Some(bridge.clone())).context("building delay model")?;
    let streams = model.assign_streams(config.seed as i64);
    info!("Delay model: {} ({} random streams)", model.name(), streams);

    let mut scenario = Scenario::new(&config);
    let outcome = scenario.run(&mut model);

    // Release the service even when the run aborted.
    let comparison = {
        let mut guard = bridge.lock();
        let records = guard.progress_mut().drain();
        ComparisonSummary::from_records(&records)
    };
    let report = settle(outcome, bridge.shutdown())?;
    info!("{}", report);
    if comparison.samples > 0 {
        info!("Baseline vs external: {}", comparison);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Logging setup
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter(Some("sionna_delay_bridge"), LevelFilter::Debug)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => run(&args),
        Command::Summarize { log } => {
            let summary = load_comparison_log(&log).with_context(|| format!("reading {}", log.display()))?;
            println!("{}", summary);
            Ok(())
        }
    }
}
