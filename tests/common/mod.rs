#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use score_drive::{
    car::{Calibration, Car},
    config::TrackerConfig,
    motor::{Actuator, Direction, DriveError, Power},
    scoreboard::{GamePhase, GameSnapshot, ScoreSource, SourceError},
};
use uom::si::{f64::Time, time::second};

pub const GAME: &str = "0022600101";

pub fn live(home: u32, away: u32) -> GameSnapshot {
    GameSnapshot {
        game_id: GAME.into(),
        home_team: "Celtics".into(),
        away_team: "Knicks".into(),
        home_score: home,
        away_score: away,
        status: "Q2 4:00".into(),
        phase: GamePhase::Live,
    }
}

pub fn finished(home: u32, away: u32) -> GameSnapshot {
    GameSnapshot {
        status: "Final".into(),
        phase: GamePhase::Final,
        ..live(home, away)
    }
}

pub fn http(status: u16) -> SourceError {
    SourceError::Http {
        status,
        text: String::new(),
    }
}

/// Answers polls from a script; once exhausted the game is gone.
pub struct Scripted {
    polls: VecDeque<Result<Option<GameSnapshot>, SourceError>>,
    pub served: Arc<Mutex<usize>>,
}

impl Scripted {
    pub fn new<I>(polls: I) -> Self
    where
        I: IntoIterator<Item = Result<Option<GameSnapshot>, SourceError>>,
    {
        Self {
            polls: polls.into_iter().collect(),
            served: Arc::default(),
        }
    }
}

impl ScoreSource for Scripted {
    fn games(&mut self) -> Result<Vec<GameSnapshot>, SourceError> {
        Ok(self.game(GAME)?.into_iter().collect())
    }

    fn game(&mut self, _game_id: &str) -> Result<Option<GameSnapshot>, SourceError> {
        *self.served.lock().unwrap() += 1;
        self.polls.pop_front().unwrap_or(Ok(None))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Drive(Direction, u8),
    Stop,
}

/// Remembers every command; optionally fails to drive.
#[derive(Clone, Default)]
pub struct Recorder {
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub broken: bool,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn drives(&self) -> Vec<Direction> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Drive(direction, _) => Some(direction),
                Call::Stop => None,
            })
            .collect()
    }

    fn push(&self, direction: Direction, power: Power) -> Result<(), DriveError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Drive(direction, power.percent()));
        if self.broken {
            Err(DriveError::Spawn("motor hat not found".into()))
        } else {
            Ok(())
        }
    }
}

impl Actuator for Recorder {
    fn forward(&mut self, power: Power) -> Result<(), DriveError> {
        self.push(Direction::Forward, power)
    }

    fn backward(&mut self, power: Power) -> Result<(), DriveError> {
        self.push(Direction::Backward, power)
    }

    fn stop(&mut self) -> Result<(), DriveError> {
        self.calls.lock().unwrap().push(Call::Stop);
        Ok(())
    }
}

/// A configuration which never waits and never moves for long.
pub fn instant_config() -> TrackerConfig {
    TrackerConfig {
        poll_interval: Duration::ZERO,
        backoff: Duration::ZERO,
        calibration: Calibration::per_point(Time::new::<second>(0.0)).unwrap(),
        ..TrackerConfig::default()
    }
}

pub fn car(recorder: &Recorder, config: &TrackerConfig) -> Car<Recorder> {
    Car::new(recorder.clone(), config.power, config.calibration)
}
