//! Command-line arguments shared by the binaries.

use clap::{Args, ValueEnum};
use log::LevelFilter;

use crate::{
    error::Error,
    motor::{Actuator, CommandDrive, DriveCommands, DryRun},
};

/// How the motors are reached.
#[derive(Args, Clone, Debug)]
pub struct DriveArgs {
    /// Log motor commands instead of running them.
    #[arg(long, env = "SCORE_DRIVE_DRY_RUN")]
    pub dry_run: bool,

    /// Shell command starting the motors forward; `{power}` is substituted.
    #[arg(long, env = "SCORE_DRIVE_FORWARD_CMD")]
    pub forward_cmd: Option<String>,

    /// Shell command starting the motors backward; `{power}` is substituted.
    #[arg(long, env = "SCORE_DRIVE_BACKWARD_CMD")]
    pub backward_cmd: Option<String>,

    /// Shell command stopping the motors.
    #[arg(long, env = "SCORE_DRIVE_STOP_CMD")]
    pub stop_cmd: Option<String>,
}

impl DriveArgs {
    /// The command templates, defaults filled in.
    pub fn commands(&self) -> DriveCommands {
        let defaults = DriveCommands::default();
        DriveCommands {
            forward: self.forward_cmd.clone().unwrap_or(defaults.forward),
            backward: self.backward_cmd.clone().unwrap_or(defaults.backward),
            stop: self.stop_cmd.clone().unwrap_or(defaults.stop),
        }
    }

    /// Builds the actuator these arguments describe.
    pub fn actuator(&self) -> Box<dyn Actuator> {
        if self.dry_run {
            log::warn!("dry run: the motors will not move");
            Box::new(DryRun::new())
        } else {
            Box::new(CommandDrive::new(self.commands()))
        }
    }
}

/// Verbosity of the standard error log.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    /// Nothing.
    Off,
    /// Failures only.
    Error,
    /// Failures and recoverable problems.
    Warn,
    /// Lifecycle events.
    Info,
    /// Every motor command and poll.
    Debug,
    /// Everything.
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Logging options.
#[derive(Args, Clone, Debug)]
pub struct LogArgs {
    /// Log verbosity.
    #[arg(long, value_enum, env = "SCORE_DRIVE_LOG", default_value = "info")]
    pub log_level: LogLevel,

    /// Never color the log.
    #[arg(long)]
    pub no_color: bool,
}

impl LogArgs {
    /// Installs the logger.
    #[cfg(feature = "logging")]
    pub fn init(&self) -> Result<(), Error> {
        let color = !self.no_color && crate::logging::stderr_is_tty();
        crate::logging::init(self.log_level.into(), color)
    }

    /// Installs the logger.
    #[cfg(not(feature = "logging"))]
    pub fn init(&self) -> Result<(), Error> {
        Ok(())
    }
}
