//! Mapping score changes to car movements.

use std::fmt::{self, Display, Formatter};

use crate::motor::Direction;

/// What the car should do about one observed score change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveDecision {
    /// Nobody scored.
    Idle,
    /// Both teams scored the same number of points; the car stays put.
    CancelledOut(u32),
    /// Move `points` calibration units in `direction`.
    Move {
        /// Which way to move.
        direction: Direction,
        /// How far, in points.
        points: u32,
    },
}

impl MoveDecision {
    /// Signed displacement this decision produces, in points.
    pub fn net(&self) -> i64 {
        match *self {
            MoveDecision::Move { direction, points } => direction.sign() * i64::from(points),
            _ => 0,
        }
    }
}

/// Decides how to move for the points each side scored since the last
/// observation.
///
/// Only the difference matters: home points push forward, away points push
/// backward, and equal scoring cancels out.
pub fn decide(home_delta: u32, away_delta: u32) -> MoveDecision {
    if home_delta > away_delta {
        MoveDecision::Move {
            direction: Direction::Forward,
            points: home_delta - away_delta,
        }
    } else if away_delta > home_delta {
        MoveDecision::Move {
            direction: Direction::Backward,
            points: away_delta - home_delta,
        }
    } else if home_delta > 0 {
        MoveDecision::CancelledOut(home_delta)
    } else {
        MoveDecision::Idle
    }
}

/// A decision together with the team names it is reported against.
pub struct Describe<'a> {
    /// The decision to describe.
    pub decision: MoveDecision,
    /// Home team name.
    pub home_team: &'a str,
    /// Away team name.
    pub away_team: &'a str,
}

impl Display for Describe<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.decision {
            MoveDecision::Idle => f.write_str("no scoring"),
            MoveDecision::CancelledOut(points) => {
                write!(f, "Both teams scored {} - no net movement", points)
            }
            MoveDecision::Move { direction, points } => {
                let team = match direction {
                    Direction::Forward => self.home_team,
                    Direction::Backward => self.away_team,
                };
                write!(f, "{} {} point(s) - {} scoring!", direction, points, team)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use itertools::iproduct;

    use super::*;

    #[test]
    fn decision_follows_the_difference() {
        for (home, away) in iproduct!(0..=12u32, 0..=12u32) {
            let decision = decide(home, away);
            assert_eq!(decision.net(), i64::from(home) - i64::from(away));
            match decision {
                MoveDecision::Move {
                    direction: Direction::Forward,
                    points,
                } => assert!(home > away && points == home - away),
                MoveDecision::Move {
                    direction: Direction::Backward,
                    points,
                } => assert!(away > home && points == away - home),
                MoveDecision::CancelledOut(points) => assert!(home == away && points == home),
                MoveDecision::Idle => assert!(home == 0 && away == 0),
            }
        }
    }

    #[test]
    fn home_basket_moves_forward() {
        assert_eq!(
            decide(2, 0),
            MoveDecision::Move {
                direction: Direction::Forward,
                points: 2
            }
        );
        assert_eq!(
            decide(1, 3),
            MoveDecision::Move {
                direction: Direction::Backward,
                points: 2
            }
        );
    }

    #[test]
    fn equal_scoring_is_reported_not_ignored() {
        assert_eq!(decide(2, 2), MoveDecision::CancelledOut(2));
        let text = Describe {
            decision: decide(2, 2),
            home_team: "Celtics",
            away_team: "Knicks",
        }
        .to_string();
        assert_eq!(text, "Both teams scored 2 - no net movement");
    }

    #[test]
    fn movement_names_the_scoring_team() {
        let text = Describe {
            decision: decide(0, 3),
            home_team: "Celtics",
            away_team: "Knicks",
        }
        .to_string();
        assert_eq!(text, "BACKWARD 3 point(s) - Knicks scoring!");
    }
}
