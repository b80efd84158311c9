//! Hexbounce entry point
//!
//! Headless native runner: builds the simulation from a preset or JSON config
//! and streams frames as JSON lines on stdout. A renderer (or anything else)
//! can consume that stream.

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use hexbounce::sim::Simulation;
use hexbounce::{Driver, FrameSink, JsonLinesSink, NullSink, Preset, SimConfig, StopToken};

#[derive(Parser, Debug)]
#[command(name = "hexbounce", about = "A ball bouncing inside a rotating hexagon", version)]
struct Args {
    /// JSON config file (takes precedence over --preset)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Named parameter set: standard, gentle, lunar, lively
    #[arg(long, default_value = "standard")]
    preset: Preset,
    /// Run this many ticks headless; omit to run in real time until Enter is pressed
    #[arg(long)]
    ticks: Option<u64>,
    /// Emit one frame every N ticks when headless
    #[arg(long, default_value_t = 1)]
    every: u64,
    /// Seed for a deterministic random kick to the initial velocity
    #[arg(long)]
    seed: Option<u64>,
    /// Largest random kick per axis (pixels/s)
    #[arg(long, default_value_t = 100.0)]
    jitter: f32,
    /// Print the effective config as JSON and exit
    #[arg(long)]
    print_config: bool,
    /// Do not write frames to stdout
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimConfig::from_json_file(path)?,
        None => SimConfig::from_preset(args.preset),
    };
    if let Some(seed) = args.seed {
        config = config.with_velocity_jitter(seed, args.jitter);
        log::info!("Seed {seed}: initial velocity {:?}", config.ball_velocity);
    }

    if args.print_config {
        config.validate()?;
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    let driver = Driver::new(Simulation::new(config)?).with_present_every(args.every);
    if args.quiet {
        run(driver, &args, &mut NullSink)
    } else {
        run(driver, &args, &mut JsonLinesSink::new(io::stdout().lock()))
    }
}

fn run(mut driver: Driver, args: &Args, sink: &mut impl FrameSink) -> Result<()> {
    let stop = StopToken::new();

    let ran = match args.ticks {
        Some(ticks) => driver.run_ticks(ticks, &stop, sink)?,
        None => {
            // Any input (or closing stdin) stops the loop
            let remote = stop.clone();
            std::thread::spawn(move || {
                let mut line = String::new();
                let _ = io::stdin().read_line(&mut line);
                remote.request_stop();
            });
            log::info!("Press Enter to stop");
            driver.run_realtime(&stop, sink)?
        }
    };

    let sim = driver.simulation();
    log::info!(
        "Finished after {} ticks ({:.2}s simulated): ball at {:?} moving {:?}",
        ran,
        sim.time(),
        sim.ball().pos,
        sim.ball().vel
    );
    Ok(())
}
