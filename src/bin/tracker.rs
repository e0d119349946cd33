//! Tracks one live game and drives the car with its score.

use std::process;

use clap::Parser;

use score_drive::{
    car::Car,
    cli::{DriveArgs, LogArgs},
    config::{
        TrackerConfig, DEFAULT_BACKOFF_SECS, DEFAULT_MAX_MALFORMED, DEFAULT_POLL_INTERVAL_SECS,
        DEFAULT_POWER, DEFAULT_SECONDS_PER_POINT,
    },
    runtime::{cancel_on_interrupt, Context, Lines},
    scoreboard::{NbaScoreboard, DEFAULT_URL},
    tracker, Error,
};

const BANNER: &str = "============================================================";

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Track this game id instead of choosing from a menu.
    #[arg(long, env = "SCORE_DRIVE_GAME")]
    game: Option<String>,

    /// Scoreboard endpoint.
    #[arg(long, env = "SCORE_DRIVE_URL", default_value = DEFAULT_URL)]
    url: String,

    /// Seconds between polls.
    #[arg(long, env = "SCORE_DRIVE_POLL_INTERVAL", default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    poll_interval: f64,

    /// Seconds to wait after a failed poll.
    #[arg(long, env = "SCORE_DRIVE_BACKOFF", default_value_t = DEFAULT_BACKOFF_SECS)]
    backoff: f64,

    /// Motor power in percent.
    #[arg(long, env = "SCORE_DRIVE_POWER", default_value_t = DEFAULT_POWER)]
    power: u8,

    /// Seconds of movement per point.
    #[arg(long, env = "SCORE_DRIVE_SECONDS_PER_POINT", default_value_t = DEFAULT_SECONDS_PER_POINT)]
    seconds_per_point: f64,

    /// Consecutive unreadable responses tolerated.
    #[arg(long, env = "SCORE_DRIVE_MAX_MALFORMED", default_value_t = DEFAULT_MAX_MALFORMED)]
    max_malformed: u32,

    #[command(flatten)]
    drive: DriveArgs,

    #[command(flatten)]
    log: LogArgs,
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

fn run(cli: Cli) -> Result<(), Error> {
    let config = TrackerConfig::from_seconds(
        cli.poll_interval,
        cli.backoff,
        cli.power,
        cli.seconds_per_point,
        cli.max_malformed,
    )?;

    let ctx = Context::new_global_ext(Some("tracker".into()));
    cancel_on_interrupt(&ctx)?;
    let lines = Lines::stdin()?;

    println!("{}\nNBA SCORE TRACKER CAR\n{}", BANNER, BANNER);
    println!("Home team scores -> car moves FORWARD");
    println!("Away team scores -> car moves BACKWARD");
    println!("Calibration: {}", config.calibration);
    println!("Power: {}\n", config.power);

    let source = NbaScoreboard::with_url(cli.url);
    let car = Car::new(cli.drive.actuator(), config.power, config.calibration);

    let summary = match tracker::session(&ctx, &lines, source, car, cli.game, config)? {
        Some(summary) => summary,
        None => {
            println!("Motors stopped. Goodbye!");
            return Ok(());
        }
    };
    println!("{}", summary);
    println!("\nMotors stopped. Goodbye!");
    Ok(())
}
