//! Manual calibration of the car.
//!
//! The operator runs the motors for chosen durations and measures how far the
//! car travels, to find the time per point used by the tracker.

use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
    time::Duration,
};

use crate::{
    car::Car,
    config::CalibrationConfig,
    error::Error,
    motor::{Actuator, Direction, DriveError},
    policy::{decide, MoveDecision},
    runtime::{Context, Lines},
};

const BANNER: &str = "============================================================";
const RULE: &str = "------------------------------------------------------------";

/// The scripted scoring walk-through: description, home delta, away delta.
pub const SCENARIOS: [(&str, u32, u32); 5] = [
    ("Home makes a free throw (1 pt)", 1, 0),
    ("Away makes a 2-pointer", 0, 2),
    ("Home makes a 3-pointer", 3, 0),
    ("Both score: Home 2, Away 2 (no movement)", 2, 2),
    ("Both score: Home 3, Away 1 (net +2 forward)", 3, 1),
];

/// What the calibration utility should do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Forward then backward once, to check the car moves at all.
    Quick,
    /// The interactive command loop.
    Interactive,
    /// Walk through [`SCENARIOS`].
    Scenarios,
}

impl Mode {
    /// Interprets the answer to the "1 or 2" startup question.
    pub fn from_choice(answer: &str) -> Option<Self> {
        match answer.trim() {
            "1" => Some(Mode::Quick),
            "2" => Some(Mode::Interactive),
            "3" => Some(Mode::Scenarios),
            _ => None,
        }
    }
}

/// An operator command in the interactive loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Drive forward, optionally for a new duration.
    Forward(Option<Duration>),
    /// Drive backward, optionally for a new duration.
    Backward(Option<Duration>),
    /// Forward then backward with the current duration.
    Test,
    /// Stop the motors.
    Stop,
    /// Leave the loop.
    Quit,
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let mut parts = lower.split_whitespace();
        let verb = parts.next().ok_or(ParseCommandError::Empty)?;
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(ParseCommandError::BadDuration(verb.to_string()));
        }

        let duration = |verb: &str| match arg {
            None => Ok(None),
            Some(text) => text
                .parse::<f64>()
                .ok()
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .map(Some)
                .ok_or_else(|| ParseCommandError::BadDuration(verb.to_string())),
        };
        let bare = |command: Command| match arg {
            None => Ok(command),
            Some(_) => Err(ParseCommandError::Unknown(lower.clone())),
        };

        match verb {
            "f" | "forward" => duration("f").map(Command::Forward),
            "b" | "backward" => duration("b").map(Command::Backward),
            "t" | "test" => bare(Command::Test),
            "s" | "stop" => bare(Command::Stop),
            "q" | "quit" => bare(Command::Quit),
            _ => Err(ParseCommandError::Unknown(lower.clone())),
        }
    }
}

/// Represents possible errors when parsing a calibration command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseCommandError {
    /// Nothing was entered.
    Empty,
    /// The command is not one of `f`, `b`, `t`, `s`, `q`.
    Unknown(String),
    /// The duration after `f` or `b` is not a non-negative number.
    BadDuration(String),
}

impl Display for ParseCommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParseCommandError::Empty | ParseCommandError::Unknown(_) => {
                f.write_str("Unknown command. Use f, b, t, s, or q.")
            }
            ParseCommandError::BadDuration(verb) => {
                write!(f, "Invalid duration. Use format: {} 0.5", verb)
            }
        }
    }
}

impl From<ParseCommandError> for Error {
    fn from(err: ParseCommandError) -> Self {
        Error::Custom(err.to_string())
    }
}

/// Whether the interactive loop keeps going after a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Read the next command.
    Continue,
    /// Leave the loop.
    Quit,
}

/// Drives the car on the operator's behalf.
pub struct Calibrator<A: Actuator> {
    car: Car<A>,
    config: CalibrationConfig,
    duration: Duration,
}

impl<A: Actuator> Calibrator<A> {
    /// Constructs a calibrator driving `actuator`.
    pub fn new(actuator: A, config: CalibrationConfig) -> Self {
        Self {
            car: Car::new(actuator, config.power, config.calibration),
            duration: config.duration,
            config,
        }
    }

    /// The duration used by commands given without one.
    pub fn current_duration(&self) -> Duration {
        self.duration
    }

    /// Gets the car being driven.
    pub fn car(&self) -> &Car<A> {
        &self.car
    }

    /// Stops the motors.
    pub fn stop(&mut self) -> Result<(), Error> {
        Ok(self.car.stop()?)
    }

    fn drive(&mut self, direction: Direction, duration: Duration) -> Result<(), DriveError> {
        println!(
            "Moving {} at power {} for {} seconds...",
            direction,
            self.car.power(),
            duration.as_secs_f64()
        );
        self.car.run(direction, duration)?;
        println!("Stopped.");
        Ok(())
    }

    /// Carries out one command.
    ///
    /// The pause inside [`Command::Test`] ends early if `ctx` is cancelled, in
    /// which case the return leg is skipped.
    pub fn execute(&mut self, ctx: &Context, command: Command) -> Result<Flow, DriveError> {
        match command {
            Command::Quit => {
                println!("Exiting calibration.");
                return Ok(Flow::Quit);
            }
            Command::Stop => {
                self.car.stop()?;
                println!("Motors stopped.");
            }
            Command::Test => {
                let duration = self.duration;
                println!("\nTesting with duration = {}s", duration.as_secs_f64());
                self.drive(Direction::Forward, duration)?;
                if ctx.sleep(self.config.pause) {
                    println!("Moving backward (returning to start)...");
                    self.drive(Direction::Backward, duration)?;
                    println!("Test complete. Did the car return to its starting position?");
                }
            }
            Command::Forward(requested) => {
                let duration = self.take_duration(requested);
                self.drive(Direction::Forward, duration)?;
                if requested.is_some() {
                    println!("\nMeasure the distance traveled!");
                    println!(
                        "If it was about one point's worth, {}s is a good time per point.",
                        duration.as_secs_f64()
                    );
                    println!("If too short, try a larger number. If too far, try smaller.");
                }
            }
            Command::Backward(requested) => {
                let duration = self.take_duration(requested);
                self.drive(Direction::Backward, duration)?;
            }
        }
        Ok(Flow::Continue)
    }

    fn take_duration(&mut self, requested: Option<Duration>) -> Duration {
        if let Some(duration) = requested {
            self.duration = duration;
        }
        self.duration
    }

    /// Runs the interactive command loop until `q`, end of input, or
    /// cancellation of `ctx`.
    ///
    /// A failed motor command stops the motors and the loop carries on.
    pub fn interactive(&mut self, ctx: &Context, lines: &Lines) -> Result<(), Error> {
        println!("{}\nPICAR MOVEMENT CALIBRATION\n{}\n", BANNER, BANNER);
        println!("Commands:");
        println!("  f <seconds>  - Move forward (e.g., 'f 0.5')");
        println!("  b <seconds>  - Move backward (e.g., 'b 0.5')");
        println!("  t            - Test current duration forward then backward");
        println!("  s            - Stop motors (emergency)");
        println!("  q            - Quit\n");
        println!("Default duration: {} seconds", self.duration.as_secs_f64());
        println!("Motor power: {}\n", self.car.power());
        println!("TIP: Mark the car's starting position with tape,");
        println!("     then measure how far it travels.\n");
        println!("{}", RULE);

        while let Some(line) = lines.prompt(ctx, "\nEnter command: ")? {
            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(err) => {
                    println!("{}", err);
                    continue;
                }
            };
            match self.execute(ctx, command) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => return Ok(()),
                Err(err) => {
                    log::error!("motor command failed: {}", err);
                    self.car.stop()?;
                    println!("Motors stopped for safety.");
                }
            }
            if ctx.is_done() {
                break;
            }
        }

        self.car.stop()?;
        if ctx.is_done() {
            println!("\n\nEmergency stop! Motors stopped.");
        }
        Ok(())
    }

    /// Forward, pause, backward with the configured duration.
    pub fn quick_test(&mut self, ctx: &Context) -> Result<(), Error> {
        let duration = self.config.duration;
        println!(
            "Quick test: Forward {0}s, pause, backward {0}s",
            duration.as_secs_f64()
        );
        println!(
            "Starting in {} seconds...",
            self.config.countdown.as_secs_f64()
        );
        if !ctx.sleep(self.config.countdown) {
            return Ok(());
        }
        self.drive(Direction::Forward, duration)?;
        if !ctx.sleep(self.config.pause) {
            return Ok(());
        }
        self.drive(Direction::Backward, duration)?;
        println!("\nQuick test complete!");
        Ok(())
    }

    /// Walks through [`SCENARIOS`], moving the car as the tracker would.
    ///
    /// Returns the decisions taken, in order.
    pub fn scenarios(&mut self, ctx: &Context, lines: &Lines) -> Result<Vec<MoveDecision>, Error> {
        println!("{}\nCAR CONTROLLER TEST\n{}\n", BANNER, BANNER);
        println!("Calibration: {}", self.car.calibration());

        let mut decisions = Vec::new();
        for (description, home, away) in SCENARIOS.iter().copied() {
            println!("\nTest: {}", description);
            println!("  home_delta={}, away_delta={}", home, away);
            if lines
                .prompt(ctx, "  Press Enter to execute (or Ctrl+C to skip)...")?
                .is_none()
            {
                break;
            }

            let decision = decide(home, away);
            match decision {
                MoveDecision::Move { direction, points } => {
                    self.car.move_points(direction, points)?;
                    println!("  Result: Moved {} for {} point(s)", direction, points);
                }
                _ => println!("  Result: No movement (scores cancelled out)"),
            }
            decisions.push(decision);

            if !ctx.sleep(self.config.pause) {
                break;
            }
        }

        println!("\n{}\nAll tests complete!\n{}", BANNER, BANNER);
        Ok(decisions)
    }
}
