//! waterlab-sim: host simulator for the purification rig.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimulatedRig        LogEventSink      ConsoleFrames           │
//! │  (Sensor+Actuator)   (EventSink)       (FrameSink)             │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            MachineService (pure logic)                 │    │
//! │  │  FSM · Power profile · Safety · Water mover            │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use waterlab::adapters::console::ConsoleFrames;
use waterlab::adapters::log_sink::LogEventSink;
use waterlab::adapters::sim::SimulatedRig;
use waterlab::app::commands::AppCommand;
use waterlab::app::service::MachineService;
use waterlab::config::{MachineConfig, PowerMode};

#[derive(Parser)]
#[command(
    name = "waterlab-sim",
    version,
    about = "Simulate the water-purification rig controller"
)]
struct Cli {
    /// Control cycles to run
    #[arg(long, default_value_t = 100)]
    cycles: u64,

    /// Wall-clock pause between cycles
    #[arg(long, default_value_t = 0.0)]
    seconds_per_cycle: f64,

    /// Draw the tanks after every cycle
    #[arg(long)]
    graphics: bool,

    /// Start with the battery override on
    #[arg(long)]
    infinite_energy: bool,

    /// Override the configured power profile
    #[arg(long, value_enum)]
    power_mode: Option<Mode>,

    /// Machine configuration: JSON, or postcard bytes for a `.bin` file
    /// (defaults to the reference rig)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    High,
    Mid,
    Low,
}

impl From<Mode> for PowerMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::High => PowerMode::High,
            Mode::Mid => PowerMode::Mid,
            Mode::Low => PowerMode::Low,
        }
    }
}

fn load_config(cli: &Cli) -> Result<MachineConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            if path.extension().is_some_and(|ext| ext == "bin") {
                MachineConfig::from_bytes(&bytes)
                    .with_context(|| format!("decoding {}", path.display()))?
            } else {
                serde_json::from_slice(&bytes)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
        }
        None => MachineConfig::default(),
    };
    if let Some(mode) = cli.power_mode {
        config.power_mode = mode.into();
    }
    config.validate().context("invalid machine configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut service = MachineService::new(config).context("building the rig")?;
    let mut rig = SimulatedRig::new();
    let mut sink = LogEventSink::new();
    let mut frames = ConsoleFrames::new(std::io::stdout());

    service.start(&mut sink);
    if cli.infinite_energy {
        service.handle_command(AppCommand::ToggleInfiniteEnergy, &mut rig, &mut sink, &mut frames)?;
    }

    let cadence = Duration::try_from_secs_f64(cli.seconds_per_cycle)
        .context("--seconds-per-cycle must be a non-negative number")?;
    service.handle_command(
        AppCommand::Run {
            cycles: cli.cycles,
            cadence,
            graphics: cli.graphics,
        },
        &mut rig,
        &mut sink,
        &mut frames,
    )?;

    let stats = service.stats();
    info!(
        "done: {} cycles ({} idle, {} recharge, {} fault), purified {}, rejected {}",
        stats.total_cycles,
        stats.idle_cycles,
        stats.recharge_cycles,
        stats.fault_cycles,
        stats.water_purified,
        stats.water_rejected
    );
    for (device, cycles) in service
        .plant()
        .devices()
        .iter()
        .zip(stats.device_active_cycles)
    {
        info!("  {:<16} active {cycles} cycles", device.name.as_str());
    }
    Ok(())
}
