//! Finds how long one point of movement should take.

use std::process;

use clap::{Parser, Subcommand};

use score_drive::{
    calibration::{Calibrator, Mode},
    cli::{DriveArgs, LogArgs},
    config::{
        CalibrationConfig, DEFAULT_POWER, DEFAULT_SECONDS_PER_POINT, DEFAULT_TEST_DURATION_SECS,
    },
    runtime::{cancel_on_interrupt, Context, Lines},
    Error,
};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Option<ModeCommand>,

    /// Motor power in percent.
    #[arg(long, env = "SCORE_DRIVE_POWER", default_value_t = DEFAULT_POWER)]
    power: u8,

    /// Starting duration of each move, in seconds.
    #[arg(long, env = "SCORE_DRIVE_TEST_DURATION", default_value_t = DEFAULT_TEST_DURATION_SECS)]
    duration: f64,

    /// Seconds of movement per point, used by the scoring scenarios.
    #[arg(long, env = "SCORE_DRIVE_SECONDS_PER_POINT", default_value_t = DEFAULT_SECONDS_PER_POINT)]
    seconds_per_point: f64,

    #[command(flatten)]
    drive: DriveArgs,

    #[command(flatten)]
    log: LogArgs,
}

#[derive(Subcommand, Clone, Copy)]
enum ModeCommand {
    /// Forward, pause, backward once.
    Quick,
    /// Drive by typed commands.
    Interactive,
    /// Replay a few scoring plays through the movement policy.
    Scenarios,
}

impl From<ModeCommand> for Mode {
    fn from(mode: ModeCommand) -> Self {
        match mode {
            ModeCommand::Quick => Mode::Quick,
            ModeCommand::Interactive => Mode::Interactive,
            ModeCommand::Scenarios => Mode::Scenarios,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = cli.log.init() {
        eprintln!("{}", err);
    }
    if let Err(err) = run(cli) {
        log::error!("{}", err);
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn ask_mode(ctx: &Context, lines: &Lines) -> Result<Option<Mode>, Error> {
    println!("\nChoose test mode:");
    println!("  1 - Quick test (forward/backward once)");
    println!("  2 - Interactive calibration");
    println!("  3 - Scoring scenarios");
    let answer = match lines.prompt(ctx, "\nEnter 1, 2 or 3: ")? {
        Some(answer) => answer,
        None => return Ok(None),
    };
    Ok(Some(Mode::from_choice(&answer).unwrap_or_else(|| {
        println!("Invalid choice. Running quick test...");
        Mode::Quick
    })))
}

fn run(cli: Cli) -> Result<(), Error> {
    let config = CalibrationConfig::from_seconds(cli.power, cli.duration, cli.seconds_per_point)?;

    let ctx = Context::new_global_ext(Some("calibrate".into()));
    cancel_on_interrupt(&ctx)?;
    let lines = Lines::stdin()?;

    let mode = match cli.mode {
        Some(mode) => mode.into(),
        None => match ask_mode(&ctx, &lines)? {
            Some(mode) => mode,
            None => return Ok(()),
        },
    };

    let mut calibrator = Calibrator::new(cli.drive.actuator(), config);
    let result = match mode {
        Mode::Quick => calibrator.quick_test(&ctx),
        Mode::Interactive => calibrator.interactive(&ctx, &lines),
        Mode::Scenarios => calibrator.scenarios(&ctx, &lines).map(drop),
    };

    let stopped = calibrator.stop();
    result?;
    stopped?;
    println!("Motors stopped.");
    Ok(())
}
