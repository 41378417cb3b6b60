//! waypoint-rover - mission runner and calibration tool
//!
//! ```text
//! waypoint-rover                          # run the mission with rover.toml
//! waypoint-rover --mock --ratios 0.9,0.1  # dry run, scripted ratios
//! waypoint-rover calibrate forward --cells 2
//! waypoint-rover calibrate turn left
//! waypoint-rover calibrate steer-sweep --start 80 --end 170 --step 10
//! waypoint-rover write-config rover.toml
//! ```
//!
//! Ctrl-C stops the mission at the next step boundary; the motors are
//! stopped and the controller released on every exit path.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use waypoint_rover::calibration;
use waypoint_rover::classification::{ClassificationSource, ScriptedSource, create_source};
use waypoint_rover::config::{AppConfig, secs};
use waypoint_rover::core::driver::ActuationGuard;
use waypoint_rover::core::types::Side;
use waypoint_rover::devices::create_device;
use waypoint_rover::motion::TimedDrive;
use waypoint_rover::{Error, MissionSequencer, Result};

/// Open-loop waypoint rover
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (built-in defaults when the file is missing)
    #[arg(short, long, default_value = "rover.toml")]
    config: PathBuf,

    /// Use the simulated device instead of the configured hardware
    #[arg(long)]
    mock: bool,

    /// Replay these ratios instead of recording speech (comma separated)
    #[arg(long, value_delimiter = ',')]
    ratios: Vec<f32>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the waypoint mission (default)
    Run,

    /// Single motions for tuning the [calibration] constants
    Calibrate {
        #[command(subcommand)]
        action: CalibrateAction,
    },

    /// Write the effective configuration as TOML
    WriteConfig {
        /// Output path
        path: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum CalibrateAction {
    /// Drive straight for a number of cells
    Forward {
        #[arg(long, default_value_t = 1)]
        cells: u32,
    },

    /// One 90° turn
    Turn {
        #[arg(value_enum)]
        direction: TurnDirection,
    },

    /// Step the steering servo through a range of angles
    SteerSweep {
        #[arg(long, default_value_t = 60.0)]
        start: f32,
        #[arg(long, default_value_t = 180.0)]
        end: f32,
        #[arg(long, default_value_t = 10.0)]
        step: f32,
        /// Seconds to hold each angle
        #[arg(long, default_value_t = 1.0)]
        hold: f32,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TurnDirection {
    Left,
    Right,
}

impl From<TurnDirection> for Side {
    fn from(direction: TurnDirection) -> Self {
        match direction {
            TurnDirection::Left => Side::Left,
            TurnDirection::Right => Side::Right,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logger level comes from the config file, so load it first
    let loaded = AppConfig::load_or_default(&args.config);
    let level = loaded
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    log::info!("waypoint-rover v{} starting...", env!("CARGO_PKG_VERSION"));
    let mut config = loaded?;
    log::info!("Using config: {}", args.config.display());
    if args.mock {
        config.device.device_type = "mock".to_string();
    }
    // Route and ranges are checked before any bus traffic
    config.validate()?;
    log::info!(
        "Device: {} ({})",
        config.device.name,
        config.device.device_type
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        flag.store(true, Ordering::SeqCst);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let result = match args.command.unwrap_or(Command::Run) {
        Command::Run => run_mission(&config, args.ratios, shutdown),
        Command::Calibrate { action } => run_calibration(&config, action),
        Command::WriteConfig { path } => {
            config.to_file(&path)?;
            log::info!("Wrote configuration to {}", path.display());
            Ok(())
        }
    };

    match result {
        Err(Error::Interrupted) => {
            log::warn!("Stopped by operator");
            Ok(())
        }
        other => other,
    }
}

fn run_mission(config: &AppConfig, ratios: Vec<f32>, shutdown: Arc<AtomicBool>) -> Result<()> {
    let (device, clock) = create_device(config)?;
    let guard = ActuationGuard::new(device);
    let sequencer = MissionSequencer::from_config(config, clock)?.with_shutdown_flag(shutdown);

    let mut source: Box<dyn ClassificationSource> = if ratios.is_empty() {
        create_source(&config.classification)
    } else {
        log::info!("Replaying {} scripted ratio(s)", ratios.len());
        Box::new(ScriptedSource::new(ratios))
    };

    let report = sequencer.run(guard, source.as_mut())?;
    for visit in &report.visits {
        log::info!(
            "  #{} {} facing {}: ratio {:.2}{} -> {}",
            visit.index,
            visit.position,
            visit.heading,
            visit.ratio,
            if visit.fallback { " (fallback)" } else { "" },
            visit.outcome
        );
    }
    Ok(())
}

fn run_calibration(config: &AppConfig, action: CalibrateAction) -> Result<()> {
    let (device, clock) = create_device(config)?;
    let mut guard = ActuationGuard::new(device);
    let drive = TimedDrive::from_config(config, Arc::clone(&clock));

    match action {
        CalibrateAction::Forward { cells } => {
            calibration::forward(&drive, guard.device(), cells)?;
        }
        CalibrateAction::Turn { direction } => {
            calibration::turn(&drive, guard.device(), direction.into())?;
        }
        CalibrateAction::SteerSweep {
            start,
            end,
            step,
            hold,
        } => {
            let angles = calibration::sweep_angles(start, end, step)?;
            calibration::steer_sweep(&drive, guard.device(), clock.as_ref(), &angles, secs(hold))?;
        }
    }
    guard.release()
}
