//! Timed movements of the car.

use std::{
    fmt::{self, Display, Formatter},
    thread,
    time::Duration,
};

use uom::si::{f64::Time, time::second};

use crate::{
    error::Error,
    motor::{Actuator, Direction, DriveError, Power},
};

/// Actuation time per point of net score.
///
/// Measured on the floor with the calibration utility; the default of 0.25 s
/// moves the stock car roughly a third of a foot at power 50.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Calibration {
    per_point: Time,
}

impl Calibration {
    /// Constructs a calibration from the time one point of movement takes.
    pub fn per_point(per_point: Time) -> Result<Self, Error> {
        let secs = per_point.get::<second>();
        if Duration::try_from_secs_f64(secs).is_err() {
            return Error::Custom(format!("invalid calibration: {} s per point", secs)).into();
        }
        Ok(Self { per_point })
    }

    /// Gets the time per point.
    pub fn time_per_point(&self) -> Time {
        self.per_point
    }

    /// Converts a number of points to an actuation duration.
    ///
    /// Fails when the product does not fit in a [`Duration`].
    pub fn duration_for(&self, points: u32) -> Result<Duration, DriveError> {
        let secs = self.per_point.get::<second>() * f64::from(points);
        Duration::try_from_secs_f64(secs).map_err(|_| DriveError::DurationOutOfRange { points })
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            per_point: Time::new::<second>(0.25),
        }
    }
}

impl Display for Calibration {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}s per point", self.per_point.get::<second>())
    }
}

/// The car: an actuator plus the power and calibration it is driven with.
///
/// Every movement blocks for its whole duration and ends with a stop. The
/// motors are also stopped when the car is dropped.
pub struct Car<A: Actuator> {
    actuator: A,
    power: Power,
    calibration: Calibration,
}

impl<A: Actuator> Car<A> {
    /// Constructs a new car.
    pub fn new(actuator: A, power: Power, calibration: Calibration) -> Self {
        Self {
            actuator,
            power,
            calibration,
        }
    }

    /// Drives in `direction` for `duration`, then stops.
    ///
    /// If starting the motors fails a stop is still attempted before the error
    /// is returned.
    pub fn run(&mut self, direction: Direction, duration: Duration) -> Result<(), DriveError> {
        log::debug!(
            "{} at power {} for {:.2}s",
            direction,
            self.power,
            duration.as_secs_f64()
        );
        if let Err(err) = self.actuator.drive(direction, self.power) {
            if let Err(stop_err) = self.actuator.stop() {
                log::error!("stop after failed drive also failed: {}", stop_err);
            }
            return Err(err);
        }
        thread::sleep(duration);
        self.actuator.stop()
    }

    /// Drives `points` calibration units in `direction`, returning the time
    /// spent moving.
    pub fn move_points(
        &mut self,
        direction: Direction,
        points: u32,
    ) -> Result<Duration, DriveError> {
        let duration = self.calibration.duration_for(points)?;
        self.run(direction, duration)?;
        Ok(duration)
    }

    /// Stops the motors.
    pub fn stop(&mut self) -> Result<(), DriveError> {
        self.actuator.stop()
    }

    /// Gets the power level used for every movement.
    pub fn power(&self) -> Power {
        self.power
    }

    /// Gets the calibration used by [`Car::move_points()`].
    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    /// Gets a reference to the underlying actuator.
    pub fn actuator(&self) -> &A {
        &self.actuator
    }
}

impl<A: Actuator> Drop for Car<A> {
    fn drop(&mut self) {
        if let Err(err) = self.actuator.stop() {
            log::error!("failed to stop motors: {}", err);
        }
    }
}
