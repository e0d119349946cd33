//! Session configuration.
//!
//! Built once by a binary (from flags and environment) and handed to the
//! tracker or calibration loop; nothing here is process-global.

use std::time::Duration;

use uom::si::{f64::Time, time::second};

use crate::{car::Calibration, error::Error, motor::Power};

/// Seconds between scoreboard polls.
pub const DEFAULT_POLL_INTERVAL_SECS: f64 = 15.0;
/// Polling faster than this is rude to the feed and gains nothing; the CDN
/// document is only refreshed every few seconds.
pub const MIN_POLL_INTERVAL_SECS: f64 = 10.0;
/// Seconds to wait after a failed poll.
pub const DEFAULT_BACKOFF_SECS: f64 = 30.0;
/// Consecutive unreadable responses tolerated before giving up.
pub const DEFAULT_MAX_MALFORMED: u32 = 3;
/// Motor power in percent.
pub const DEFAULT_POWER: u8 = 50;
/// Actuation seconds per point of net score.
pub const DEFAULT_SECONDS_PER_POINT: f64 = 0.25;
/// Starting duration for manual calibration moves.
pub const DEFAULT_TEST_DURATION_SECS: f64 = 0.5;

/// Converts a time quantity into a [`Duration`], rejecting negative and
/// non-finite values.
pub fn duration(time: Time) -> Result<Duration, Error> {
    let secs = time.get::<second>();
    Duration::try_from_secs_f64(secs)
        .map_err(|_| Error::Custom(format!("invalid duration: {} s", secs)))
}

/// Converts plain seconds into a [`Duration`] via [`duration()`].
pub fn seconds(secs: f64) -> Result<Duration, Error> {
    duration(Time::new::<second>(secs))
}

/// Configuration of one tracking session.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackerConfig {
    /// Time between polls.
    pub poll_interval: Duration,
    /// Time to wait after a failed poll before retrying.
    pub backoff: Duration,
    /// Motor power for every movement.
    pub power: Power,
    /// Actuation time per point.
    pub calibration: Calibration,
    /// Consecutive malformed responses tolerated before the session ends.
    pub max_malformed: u32,
}

impl TrackerConfig {
    /// Builds a configuration from plain numbers, validating each.
    pub fn from_seconds(
        poll_interval: f64,
        backoff: f64,
        power: u8,
        seconds_per_point: f64,
        max_malformed: u32,
    ) -> Result<Self, Error> {
        if poll_interval < MIN_POLL_INTERVAL_SECS {
            log::warn!(
                "poll interval {}s is below the recommended minimum of {}s",
                poll_interval,
                MIN_POLL_INTERVAL_SECS
            );
        }
        Ok(Self {
            poll_interval: seconds(poll_interval)?,
            backoff: seconds(backoff)?,
            power: Power::new(power)?,
            calibration: Calibration::per_point(Time::new::<second>(seconds_per_point))?,
            max_malformed: max_malformed.max(1),
        })
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            backoff: Duration::from_secs(30),
            power: Power::default(),
            calibration: Calibration::default(),
            max_malformed: DEFAULT_MAX_MALFORMED,
        }
    }
}

/// Configuration of the calibration utility.
#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationConfig {
    /// Motor power for every movement.
    pub power: Power,
    /// Duration used by commands given without one.
    pub duration: Duration,
    /// Pause between the two halves of a there-and-back test.
    pub pause: Duration,
    /// Grace period before the quick test starts moving.
    pub countdown: Duration,
    /// Actuation time per point, for the scoring scenarios.
    pub calibration: Calibration,
}

impl CalibrationConfig {
    /// Builds a configuration from plain numbers, validating each.
    pub fn from_seconds(power: u8, duration: f64, seconds_per_point: f64) -> Result<Self, Error> {
        Ok(Self {
            power: Power::new(power)?,
            duration: seconds(duration)?,
            calibration: Calibration::per_point(Time::new::<second>(seconds_per_point))?,
            ..Self::default()
        })
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            power: Power::default(),
            duration: Duration::from_millis(500),
            pause: Duration::from_secs(1),
            countdown: Duration::from_secs(2),
            calibration: Calibration::default(),
        }
    }
}
