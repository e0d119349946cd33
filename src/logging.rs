//! Support for logging via the [log](https://docs.rs/log/*/log/) crate.
//!
//! Records go to standard error so they never interleave with the scoreboard
//! output on standard output.

#![cfg(feature = "logging")]

use std::{
    io::{self, Write},
    sync::{Mutex, OnceLock},
};

use ansi_rgb::{cyan, orange, red, Foreground};
use log::{info, set_logger, set_max_level, Level, LevelFilter, Log, Metadata, Record};
use rgb::RGB8;

use crate::error::Error;

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

struct StderrLogger {
    level: LevelFilter,
    color: bool,
    mtx: Mutex<()>,
}

impl StderrLogger {
    fn level_color(level: Level) -> RGB8 {
        match level {
            Level::Error => red(),
            Level::Warn => orange(),
            Level::Info => cyan(),
            Level::Debug => RGB8::new(255 / 2, 255 / 2, 255 / 2),
            Level::Trace => RGB8::new(255 / 3, 255 / 3, 255 / 3),
        }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let time = chrono::Local::now().format("%H:%M:%S");
        let line = if self.color {
            format!(
                "{} {} [{}] {}\n",
                time,
                record
                    .level()
                    .as_str()
                    .fg(Self::level_color(record.level())),
                record.target(),
                record.args(),
            )
        } else {
            format!(
                "{} {} [{}] {}\n",
                time,
                record.level(),
                record.target(),
                record.args(),
            )
        };
        let _lock = self.mtx.lock();
        // Nowhere left to report a failed write to stderr.
        let _ = io::stderr().write_all(line.as_bytes());
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Installs the standard error logger at `level`.
///
/// With `color` set, level names are colored with ANSI escapes. Fails if a
/// logger has already been installed.
pub fn init(level: LevelFilter, color: bool) -> Result<(), Error> {
    set_logger(LOGGER.get_or_init(|| StderrLogger {
        level,
        color,
        mtx: Mutex::new(()),
    }))
    .map_err(|err| Error::Custom(err.to_string()))?;
    set_max_level(level);
    info!("Initialized logging at level {}", level);
    Ok(())
}

/// Whether standard error is a terminal, used to decide on colored output.
pub fn stderr_is_tty() -> bool {
    // SAFETY: `isatty` only inspects the descriptor.
    unsafe { libc::isatty(libc::STDERR_FILENO) == 1 }
}
