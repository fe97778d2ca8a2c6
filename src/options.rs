use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use sionna_delay_bridge::propagation::DelayModelConfig;
use sionna_delay_bridge::scenario::ScenarioConfig;

/// Propagation delays for mobile nodes, optionally from an external channel simulator.
#[derive(Parser, Debug)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a base station + UE scenario.
    Run(RunArgs),
    /// Summarize a progress log written by a verbose run.
    Summarize {
        /// Progress log file.
        log: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Scenario file (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use and enable the external channel simulator.
    #[arg(long)]
    pub sionna: Option<bool>,

    /// Channel simulator server address.
    #[arg(long = "sionna-server-ip")]
    pub server_ip: Option<String>,

    /// Channel simulator server port.
    #[arg(long = "sionna-port")]
    pub port: Option<u16>,

    /// Set to true if the channel simulator runs on this machine.
    #[arg(long = "sionna-local-machine")]
    pub local_machine: Option<bool>,

    /// Log baseline and external delays side by side.
    #[arg(long = "sionna-verbose")]
    pub verbose: Option<bool>,

    /// Progress log file for comparison records.
    #[arg(long)]
    pub progress_log: Option<PathBuf>,

    /// Propagation speed override (m/s) for the constant-speed model.
    #[arg(long)]
    pub speed: Option<f64>,

    /// Seed for placement and random streams.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of UEs.
    #[arg(long)]
    pub ue_count: Option<usize>,

    /// Simulated duration (s).
    #[arg(long)]
    pub duration: Option<f64>,
}

impl RunArgs {
    /// Apply command-line overrides on top of a loaded scenario.
    pub fn apply(&self, config: &mut ScenarioConfig) {
        if let Some(enabled) = self.sionna {
            config.bridge.enabled = enabled;
        }
        if let Some(server_ip) = &self.server_ip {
            config.bridge.server_address = server_ip.clone();
        }
        if let Some(port) = self.port {
            config.bridge.port = port;
        }
        if let Some(local_machine) = self.local_machine {
            config.bridge.local_machine = local_machine;
        }
        if let Some(verbose) = self.verbose {
            config.bridge.verbose = verbose;
        }
        if let Some(path) = &self.progress_log {
            config.bridge.progress_log = Some(path.clone());
        }
        if let Some(new_speed) = self.speed {
            match &mut config.delay {
                DelayModelConfig::ConstantSpeed { speed } => *speed = new_speed,
                DelayModelConfig::Random { .. } => {
                    log::warn!("--speed {} ignored: scenario uses the random delay model", new_speed);
                }
            }
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(ue_count) = self.ue_count {
            config.ue_count = ue_count;
        }
        if let Some(duration) = self.duration {
            config.duration_secs = duration;
        }
    }
}
