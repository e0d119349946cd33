//! # Motor API.
//!
//! The car is driven through the [`Actuator`] trait: two directional commands
//! and a stop. How a command reaches the motors (PWM, I2C, a helper process)
//! is up to the implementation.

use std::{
    convert::TryFrom,
    fmt::{self, Display, Formatter},
    os::unix::process::CommandExt,
    process::Command,
};

use crate::error::Error;

/// Represents the two possible directions of movement for the car.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards the home end. Home-team points.
    Forward,
    /// Towards the away end. Away-team points.
    Backward,
}

impl Direction {
    /// The sign of a displacement in this direction.
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Forward => "FORWARD",
            Direction::Backward => "BACKWARD",
        })
    }
}

/// Motor power as a percentage in `[0, 100]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Power(u8);

impl Power {
    /// The highest accepted power level.
    pub const MAX: u8 = 100;

    /// Constructs a power level, rejecting values above [`Power::MAX`].
    pub fn new(percent: u8) -> Result<Self, DriveError> {
        if percent > Self::MAX {
            Err(DriveError::PowerOutOfRange(percent))
        } else {
            Ok(Self(percent))
        }
    }

    #[inline]
    /// Gets the power level in percent.
    pub fn percent(self) -> u8 {
        self.0
    }
}

impl Default for Power {
    fn default() -> Self {
        Self(50)
    }
}

impl TryFrom<u8> for Power {
    type Error = DriveError;

    fn try_from(percent: u8) -> Result<Self, Self::Error> {
        Self::new(percent)
    }
}

impl Display for Power {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A device which can move the car.
///
/// All commands are synchronous: they return once the command has been handed
/// to the motors, not once any motion has finished.
pub trait Actuator {
    /// Starts driving forward at the given power.
    fn forward(&mut self, power: Power) -> Result<(), DriveError>;

    /// Starts driving backward at the given power.
    fn backward(&mut self, power: Power) -> Result<(), DriveError>;

    /// Stops all motors.
    fn stop(&mut self) -> Result<(), DriveError>;

    /// Starts driving in `direction`.
    fn drive(&mut self, direction: Direction, power: Power) -> Result<(), DriveError> {
        match direction {
            Direction::Forward => self.forward(power),
            Direction::Backward => self.backward(power),
        }
    }
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn forward(&mut self, power: Power) -> Result<(), DriveError> {
        (**self).forward(power)
    }

    fn backward(&mut self, power: Power) -> Result<(), DriveError> {
        (**self).backward(power)
    }

    fn stop(&mut self) -> Result<(), DriveError> {
        (**self).stop()
    }
}

/// An actuator which only logs the commands it receives.
///
/// Useful for following a game away from the car.
#[derive(Debug, Default)]
pub struct DryRun {
    running: Option<(Direction, Power)>,
}

impl DryRun {
    /// Constructs a new dry-run actuator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the command currently "running", if any.
    pub fn running(&self) -> Option<(Direction, Power)> {
        self.running
    }
}

impl Actuator for DryRun {
    fn forward(&mut self, power: Power) -> Result<(), DriveError> {
        log::info!("dry run: forward at power {}", power);
        self.running = Some((Direction::Forward, power));
        Ok(())
    }

    fn backward(&mut self, power: Power) -> Result<(), DriveError> {
        log::info!("dry run: backward at power {}", power);
        self.running = Some((Direction::Backward, power));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DriveError> {
        if self.running.take().is_some() {
            log::info!("dry run: stop");
        }
        Ok(())
    }
}

/// Command templates for [`CommandDrive`].
///
/// Each template is run through `sh -c`; the token `{power}` is replaced with
/// the power level in percent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriveCommands {
    /// Starts the motors forward.
    pub forward: String,
    /// Starts the motors backward.
    pub backward: String,
    /// Stops the motors.
    pub stop: String,
}

impl Default for DriveCommands {
    fn default() -> Self {
        Self {
            forward: "python3 -c 'import picar_4wd as fc; fc.forward({power})'".into(),
            backward: "python3 -c 'import picar_4wd as fc; fc.backward({power})'".into(),
            stop: "python3 -c 'import picar_4wd as fc; fc.stop()'".into(),
        }
    }
}

/// An actuator which runs one external command per motor command.
///
/// The vendor motor library keeps driving after its process exits, so each
/// command only has to start or stop the motors.
pub struct CommandDrive {
    commands: DriveCommands,
}

impl CommandDrive {
    /// Constructs a new command-backed actuator.
    pub fn new(commands: DriveCommands) -> Self {
        Self { commands }
    }

    fn run(&self, template: &str, power: Option<Power>) -> Result<(), DriveError> {
        let line = match power {
            Some(power) => template.replace("{power}", &power.to_string()),
            None => template.to_string(),
        };
        log::debug!("running motor command: {}", line);
        // A terminal interrupt goes to our whole process group; the command
        // gets its own so a movement in progress is not killed with it.
        let output = Command::new("sh")
            .arg("-c")
            .arg(&line)
            .process_group(0)
            .output()
            .map_err(|err| DriveError::Spawn(format!("{}: {}", line, err)))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(DriveError::CommandFailed {
                status: output.status.code(),
                stderr: stderr.trim().to_string(),
            })
        }
    }
}

impl Actuator for CommandDrive {
    fn forward(&mut self, power: Power) -> Result<(), DriveError> {
        self.run(&self.commands.forward, Some(power))
    }

    fn backward(&mut self, power: Power) -> Result<(), DriveError> {
        self.run(&self.commands.backward, Some(power))
    }

    fn stop(&mut self) -> Result<(), DriveError> {
        self.run(&self.commands.stop, None)
    }
}

/// Represents possible errors for motor operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveError {
    /// Power is out of range (0-100).
    PowerOutOfRange(u8),
    /// The motor command could not be started.
    Spawn(String),
    /// The requested movement is too long to be timed.
    DurationOutOfRange {
        /// Points the movement was asked to cover.
        points: u32,
    },
    /// The motor command ran but reported failure.
    CommandFailed {
        /// Exit code, if the command was not killed by a signal.
        status: Option<i32>,
        /// Trimmed standard error of the command.
        stderr: String,
    },
}

impl Display for DriveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DriveError::PowerOutOfRange(p) => write!(f, "power {} out of range (0-100)", p),
            DriveError::Spawn(msg) => write!(f, "failed to start motor command: {}", msg),
            DriveError::DurationOutOfRange { points } => {
                write!(f, "movement of {} point(s) is too long to time", points)
            }
            DriveError::CommandFailed { status, stderr } => match status {
                Some(code) => write!(f, "motor command exited with {}: {}", code, stderr),
                None => write!(f, "motor command killed by signal: {}", stderr),
            },
        }
    }
}

impl From<DriveError> for Error {
    fn from(err: DriveError) -> Self {
        Error::Drive(err)
    }
}
