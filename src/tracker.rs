//! The score tracking loop.
//!
//! A session polls one game, compares each snapshot with the last good one,
//! and moves the car by the net points scored in between. It runs as a small
//! state machine:
//!
//! ```text
//! AwaitingBaseline --first snapshot--> Tracking --final status--> Finished
//!        \___________________________________/
//!          interrupt, game gone, permanent failure
//! ```

use std::fmt::{self, Display, Formatter};

use crossbeam::channel::select;

use crate::{
    car::Car,
    config::TrackerConfig,
    error::Error,
    menu,
    motor::{Actuator, Direction, DriveError},
    policy::{decide, Describe, MoveDecision},
    runtime::{Context, Lines, Loop},
    scoreboard::{GameSnapshot, ScoreSource, SourceError},
};

const RULE: &str = "------------------------------------------------------------";
const BANNER: &str = "============================================================";

/// Cumulative movement over a session, in points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    forward: u32,
    backward: u32,
}

impl Tally {
    /// Records a completed movement.
    pub fn record(&mut self, direction: Direction, points: u32) {
        match direction {
            Direction::Forward => self.forward += points,
            Direction::Backward => self.backward += points,
        }
    }

    /// Total points moved forward.
    pub fn forward(&self) -> u32 {
        self.forward
    }

    /// Total points moved backward.
    pub fn backward(&self) -> u32 {
        self.backward
    }

    /// Net signed displacement from the starting position.
    pub fn net(&self) -> i64 {
        i64::from(self.forward) - i64::from(self.backward)
    }
}

/// What a snapshot means relative to the previous one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Observation {
    /// First snapshot of the session; nothing to compare against.
    Baseline,
    /// Points scored by each side since the previous snapshot.
    Change {
        /// Home points since last time.
        home_delta: u32,
        /// Away points since last time.
        away_delta: u32,
    },
}

/// Score memory and movement totals of one session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackingState {
    previous_home: Option<u32>,
    previous_away: Option<u32>,
    tally: Tally,
}

impl TrackingState {
    /// Constructs an empty state, awaiting its baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares `snapshot` with the last one and remembers it.
    ///
    /// A score lower than the remembered one is treated as a feed glitch: the
    /// delta is clamped to zero and the remembered score is kept, so points
    /// which reappear later are not counted twice.
    pub fn observe(&mut self, snapshot: &GameSnapshot) -> Observation {
        match (self.previous_home, self.previous_away) {
            (Some(home), Some(away)) => {
                let home_delta = delta(&snapshot.home_team, home, snapshot.home_score);
                let away_delta = delta(&snapshot.away_team, away, snapshot.away_score);
                self.previous_home = Some(home.max(snapshot.home_score));
                self.previous_away = Some(away.max(snapshot.away_score));
                Observation::Change {
                    home_delta,
                    away_delta,
                }
            }
            _ => {
                self.previous_home = Some(snapshot.home_score);
                self.previous_away = Some(snapshot.away_score);
                Observation::Baseline
            }
        }
    }

    /// Records a completed movement.
    pub fn record(&mut self, direction: Direction, points: u32) {
        self.tally.record(direction, points);
    }

    /// The last remembered `(home, away)` scores.
    pub fn previous(&self) -> Option<(u32, u32)> {
        self.previous_home.zip(self.previous_away)
    }

    /// Movement totals so far.
    pub fn tally(&self) -> Tally {
        self.tally
    }
}

fn delta(team: &str, previous: u32, current: u32) -> u32 {
    if current < previous {
        log::warn!(
            "{} score went down from {} to {}; ignoring the decrease",
            team,
            previous,
            current
        );
        0
    } else {
        current - previous
    }
}

/// Why a session ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// The game reached a final status.
    GameOver,
    /// The operator interrupted the session.
    Interrupted,
    /// The game is no longer listed by the score source.
    GameMissing,
    /// The score source failed in a way retrying will not fix.
    SourceFailed(SourceError),
    /// The motors could not be commanded.
    DriveFailed(DriveError),
}

impl Display for ExitReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::GameOver => f.write_str("GAME OVER!"),
            ExitReason::Interrupted => f.write_str("STOPPED BY USER"),
            ExitReason::GameMissing => f.write_str("GAME NOT FOUND"),
            ExitReason::SourceFailed(err) => write!(f, "SCORE SOURCE FAILED: {}", err),
            ExitReason::DriveFailed(err) => write!(f, "MOTOR FAILURE: {}", err),
        }
    }
}

/// Where a session is in its lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No snapshot seen yet.
    AwaitingBaseline,
    /// Baseline set; reacting to changes.
    Tracking,
    /// Done; no further polls or movements.
    Finished(ExitReason),
}

/// What a single poll observed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReportKind {
    /// The baseline was set.
    Baseline,
    /// Nothing changed.
    Quiet,
    /// Somebody scored.
    Scored {
        /// Home points since the last poll.
        home_delta: u32,
        /// Away points since the last poll.
        away_delta: u32,
        /// What the car did about it.
        decision: MoveDecision,
        /// Movement totals after this event.
        tally: Tally,
    },
}

/// The operator-facing account of one poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    /// The snapshot the poll returned.
    pub snapshot: GameSnapshot,
    /// What it meant.
    pub kind: ReportKind,
}

impl Report {
    /// Renders the report with each line stamped by `timestamp`.
    pub fn render(&self, timestamp: &str) -> String {
        let s = &self.snapshot;
        match &self.kind {
            ReportKind::Baseline => format!(
                "\nTracking: {} @ {}\n{}\n\
                 [{ts}] Initial score: {}\n\
                 [{ts}] Status: {}\n\
                 [{ts}] Car is ready. Waiting for scoring plays...\n{}",
                s.away_team,
                s.home_team,
                RULE,
                s.score_line(),
                s.status,
                RULE,
                ts = timestamp,
            ),
            ReportKind::Quiet => format!("[{}] {} | {}", timestamp, s.score_line(), s.status),
            ReportKind::Scored {
                home_delta,
                away_delta,
                decision,
                tally,
            } => {
                let mut out = format!("\n[{}] SCORING DETECTED!", timestamp);
                if *home_delta > 0 {
                    out += &format!("\n    {} (HOME) +{}", s.home_team, home_delta);
                }
                if *away_delta > 0 {
                    out += &format!("\n    {} (AWAY) +{}", s.away_team, away_delta);
                }
                let describe = Describe {
                    decision: *decision,
                    home_team: &s.home_team,
                    away_team: &s.away_team,
                };
                out += &format!("\n    CAR: {}", describe);
                out += &format!("\n    New score: {}", s.score_line());
                out += &format!(
                    "\n    Car position: +{} / -{} points from start\n{}",
                    tally.forward(),
                    tally.backward(),
                    RULE
                );
                out
            }
        }
    }
}

/// The outcome of one [`Tracker::step()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// A snapshot was read and acted upon.
    Observed(Report),
    /// The poll failed but may succeed later.
    Retry(SourceError),
    /// The session is over.
    Finished(ExitReason),
}

/// The end-of-session account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    /// Why the session ended.
    pub reason: ExitReason,
    /// Movement totals.
    pub tally: Tally,
    /// The last snapshot successfully read, if any.
    pub last: Option<GameSnapshot>,
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n{}\n{}\n{}", BANNER, self.reason, BANNER)?;
        if let Some(last) = &self.last {
            let label = if self.reason == ExitReason::GameOver {
                "Final"
            } else {
                "Last score"
            };
            writeln!(f, "{}: {}", label, last.score_line())?;
        }
        writeln!(f, "\nCar movement summary:")?;
        writeln!(f, "  Total forward:  {} points", self.tally.forward())?;
        writeln!(f, "  Total backward: {} points", self.tally.backward())?;
        write!(f, "  Net position:   {:+} points from start", self.tally.net())
    }
}

/// Tracks one game and drives the car from it.
pub struct Tracker<S: ScoreSource, A: Actuator> {
    source: S,
    car: Car<A>,
    game_id: String,
    config: TrackerConfig,
    state: TrackingState,
    phase: Phase,
    last: Option<GameSnapshot>,
    malformed: u32,
}

impl<S: ScoreSource, A: Actuator> Tracker<S, A> {
    /// Constructs a tracker for `game_id`.
    pub fn new(source: S, car: Car<A>, game_id: impl Into<String>, config: TrackerConfig) -> Self {
        Self {
            source,
            car,
            game_id: game_id.into(),
            config,
            state: TrackingState::new(),
            phase: Phase::AwaitingBaseline,
            last: None,
            malformed: 0,
        }
    }

    /// Gets the current phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Gets the score memory and totals.
    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    /// Gets the car being driven.
    pub fn car(&self) -> &Car<A> {
        &self.car
    }

    /// Polls once and reacts to the result. Does not wait.
    ///
    /// A failed poll leaves the score memory untouched, so the next successful
    /// poll is compared with the last good snapshot.
    pub fn step(&mut self) -> Step {
        if let Phase::Finished(reason) = &self.phase {
            return Step::Finished(reason.clone());
        }

        let snapshot = match self.source.game(&self.game_id) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return self.finish(ExitReason::GameMissing),
            Err(err) => return self.poll_failed(err),
        };
        self.malformed = 0;

        let kind = match self.state.observe(&snapshot) {
            Observation::Baseline => {
                self.phase = Phase::Tracking;
                ReportKind::Baseline
            }
            Observation::Change {
                home_delta: 0,
                away_delta: 0,
            } => ReportKind::Quiet,
            Observation::Change {
                home_delta,
                away_delta,
            } => {
                let decision = decide(home_delta, away_delta);
                if let MoveDecision::Move { direction, points } = decision {
                    if let Err(err) = self.car.move_points(direction, points) {
                        log::error!("failed to move {} {} point(s): {}", direction, points, err);
                        self.last = Some(snapshot);
                        return self.finish(ExitReason::DriveFailed(err));
                    }
                    self.state.record(direction, points);
                }
                ReportKind::Scored {
                    home_delta,
                    away_delta,
                    decision,
                    tally: self.state.tally(),
                }
            }
        };

        if snapshot.is_final() {
            self.phase = Phase::Finished(ExitReason::GameOver);
        }
        self.last = Some(snapshot.clone());
        Step::Observed(Report { snapshot, kind })
    }

    /// Runs the session until the game ends, it is interrupted through `ctx`,
    /// or it fails. Each report is printed to standard output as it happens.
    ///
    /// An interrupt never cuts a movement short: it is noticed once the
    /// current poll, including any movement, has completed.
    pub fn run(mut self, ctx: &Context) -> Summary {
        let mut pause = Loop::new(self.config.poll_interval);

        let reason = loop {
            if ctx.is_done() {
                break ExitReason::Interrupted;
            }

            match self.step() {
                Step::Observed(report) => println!("{}", report.render(&timestamp())),
                Step::Retry(err) => {
                    log::warn!(
                        "poll failed: {}; retrying in {}s",
                        err,
                        self.config.backoff.as_secs_f64()
                    );
                    if !ctx.sleep(self.config.backoff) {
                        break ExitReason::Interrupted;
                    }
                    pause.reset();
                    continue;
                }
                Step::Finished(reason) => break reason,
            }

            if let Phase::Finished(reason) = &self.phase {
                break reason.clone();
            }

            let tick = pause.select();
            let cancelled = select! {
                recv(ctx.done()) -> _ => true,
                recv(tick) -> _ => false,
            };
            if cancelled {
                break ExitReason::Interrupted;
            }
        };

        self.phase = Phase::Finished(reason.clone());
        if let Err(err) = self.car.stop() {
            log::error!("failed to stop motors: {}", err);
        }
        Summary {
            reason,
            tally: self.state.tally(),
            last: self.last.take(),
        }
    }

    fn poll_failed(&mut self, err: SourceError) -> Step {
        if err.is_transient() {
            return Step::Retry(err);
        }
        if err.is_malformed() {
            self.malformed += 1;
            if self.malformed < self.config.max_malformed {
                log::warn!(
                    "unreadable response {} of {} tolerated",
                    self.malformed,
                    self.config.max_malformed
                );
                return Step::Retry(err);
            }
        }
        log::error!("giving up on the score source: {}", err);
        self.finish(ExitReason::SourceFailed(err))
    }

    fn finish(&mut self, reason: ExitReason) -> Step {
        self.phase = Phase::Finished(reason.clone());
        Step::Finished(reason)
    }
}

/// Picks a game, unless `game_id` names one, and tracks it to the end.
///
/// The motors are stopped before anything else, since an earlier run may have
/// left them driving, and again on every way out. Returns [`None`] when no game
/// was tracked.
pub fn session<S: ScoreSource, A: Actuator>(
    ctx: &Context,
    lines: &Lines,
    mut source: S,
    mut car: Car<A>,
    game_id: Option<String>,
    config: TrackerConfig,
) -> Result<Option<Summary>, Error> {
    car.stop()?;

    let game_id = match game_id {
        Some(id) => id,
        None => match choose_game(ctx, lines, &mut source) {
            Ok(Some(id)) => id,
            Ok(None) => {
                car.stop()?;
                return Ok(None);
            }
            Err(err) => {
                if let Err(stop_err) = car.stop() {
                    log::error!("failed to stop motors: {}", stop_err);
                }
                return Err(err);
            }
        },
    };

    println!(
        "\nPolling every {} seconds. Press Ctrl+C to stop.",
        config.poll_interval.as_secs_f64()
    );
    log::info!("tracking game {}", game_id);
    Ok(Some(Tracker::new(source, car, game_id, config).run(ctx)))
}

fn choose_game<S: ScoreSource>(
    ctx: &Context,
    lines: &Lines,
    source: &mut S,
) -> Result<Option<String>, Error> {
    println!("Fetching today's NBA games...\n");
    let games = menu::ordered(source.games()?);
    if games.is_empty() {
        println!("No games found today.");
        return Ok(None);
    }
    println!("{}", menu::render(&games));
    Ok(menu::choose(ctx, lines, &games)?.map(|game| game.game_id))
}

/// Wall-clock time of day, as stamped on operator output.
pub fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use itertools::iproduct;

    use super::*;
    use crate::scoreboard::GamePhase;

    fn snapshot(home: u32, away: u32) -> GameSnapshot {
        GameSnapshot {
            game_id: "g".into(),
            home_team: "Celtics".into(),
            away_team: "Knicks".into(),
            home_score: home,
            away_score: away,
            status: "Q2 4:00".into(),
            phase: GamePhase::Live,
        }
    }

    #[test]
    fn opposite_moves_cancel() {
        let mut tally = Tally::default();
        tally.record(Direction::Forward, 5);
        let before = tally.net();
        tally.record(Direction::Forward, 3);
        tally.record(Direction::Backward, 3);
        assert_eq!(tally.net(), before);
        assert_eq!((tally.forward(), tally.backward()), (8, 3));
    }

    #[test]
    fn first_snapshot_is_the_baseline() {
        let mut state = TrackingState::new();
        assert_eq!(state.previous(), None);
        assert_eq!(state.observe(&snapshot(10, 8)), Observation::Baseline);
        assert_eq!(state.previous(), Some((10, 8)));
        assert_eq!(
            state.observe(&snapshot(12, 8)),
            Observation::Change {
                home_delta: 2,
                away_delta: 0
            }
        );
        assert_eq!(state.previous(), Some((12, 8)));
    }

    #[test]
    fn decreases_are_clamped_and_not_recounted() {
        let mut state = TrackingState::new();
        state.observe(&snapshot(10, 8));
        assert_eq!(
            state.observe(&snapshot(9, 8)),
            Observation::Change {
                home_delta: 0,
                away_delta: 0
            }
        );
        assert_eq!(state.previous(), Some((10, 8)));
        assert_eq!(
            state.observe(&snapshot(10, 8)),
            Observation::Change {
                home_delta: 0,
                away_delta: 0
            }
        );
        assert_eq!(
            state.observe(&snapshot(12, 8)),
            Observation::Change {
                home_delta: 2,
                away_delta: 0
            }
        );
    }

    #[test]
    fn tally_is_the_running_sum_of_nets() {
        let increments: Vec<(u32, u32)> = iproduct!(0..4u32, 0..3u32)
            .map(|(dh, da)| (dh * dh, da))
            .collect();
        let mut state = TrackingState::new();
        let (mut home, mut away) = (0, 0);
        state.observe(&snapshot(home, away));

        let mut expected = 0i64;
        for (dh, da) in increments {
            home += dh;
            away += da;
            if let Observation::Change {
                home_delta,
                away_delta,
            } = state.observe(&snapshot(home, away))
            {
                let decision = decide(home_delta, away_delta);
                if let MoveDecision::Move { direction, points } = decision {
                    state.record(direction, points);
                }
                expected += decision.net();
            }
        }

        assert_eq!((home, away), (42, 12));
        assert_eq!(expected, 30);
        assert_eq!(state.tally().net(), expected);
        assert_eq!(
            i64::from(state.tally().forward()) - i64::from(state.tally().backward()),
            i64::from(home) - i64::from(away)
        );
    }

    #[test]
    fn scored_report_lists_both_sides() {
        let mut tally = Tally::default();
        tally.record(Direction::Forward, 2);
        let report = Report {
            snapshot: snapshot(22, 17),
            kind: ReportKind::Scored {
                home_delta: 2,
                away_delta: 2,
                decision: decide(2, 2),
                tally,
            },
        };
        let text = report.render("12:00:00");
        assert!(text.contains("[12:00:00] SCORING DETECTED!"));
        assert!(text.contains("Celtics (HOME) +2"));
        assert!(text.contains("Knicks (AWAY) +2"));
        assert!(text.contains("CAR: Both teams scored 2 - no net movement"));
        assert!(text.contains("Car position: +2 / -0 points from start"));
    }

    #[test]
    fn summary_shows_signed_net() {
        let mut tally = Tally::default();
        tally.record(Direction::Backward, 7);
        tally.record(Direction::Forward, 2);
        let summary = Summary {
            reason: ExitReason::Interrupted,
            tally,
            last: Some(snapshot(50, 55)),
        };
        let text = summary.to_string();
        assert!(text.contains("STOPPED BY USER"));
        assert!(text.contains("Last score: Knicks 55 - Celtics 50"));
        assert!(text.contains("Net position:   -5 points from start"));
    }
}
