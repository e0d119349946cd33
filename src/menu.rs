//! Picking the game to track.

use std::fmt::{self, Display, Formatter};

use crate::{
    error::Error,
    runtime::{Context, Lines},
    scoreboard::{GamePhase, GameSnapshot},
};

const BANNER: &str = "============================================================";

/// Orders games for display: live and upcoming games first, finished ones
/// last, otherwise keeping feed order.
pub fn ordered(mut games: Vec<GameSnapshot>) -> Vec<GameSnapshot> {
    games.sort_by_key(GameSnapshot::is_final);
    games
}

/// A short status tag for the game list.
pub fn status_marker(game: &GameSnapshot) -> String {
    if game.is_final() {
        "⚫ FINAL".to_string()
    } else if game.phase == GamePhase::Live {
        format!("🟢 LIVE {}", game.status)
    } else {
        format!("⏳ {}", game.status)
    }
}

/// Renders the numbered game list.
pub fn render(games: &[GameSnapshot]) -> String {
    let mut out = format!("{}\nAVAILABLE GAMES\n{}\n", BANNER, BANNER);
    for (i, game) in games.iter().enumerate() {
        out += &format!(
            "\n[{}] {} @ {}\n    Score: {} - {}\n    Status: {}\n",
            i + 1,
            game.away_team,
            game.home_team,
            game.away_score,
            game.home_score,
            status_marker(game)
        );
    }
    out += "\n";
    out += BANNER;
    out
}

/// A parsed answer to the game prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    /// The operator wants to leave.
    Quit,
    /// Zero-based index into the listed games.
    Game(usize),
}

/// Represents possible errors when parsing a game selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionError {
    /// The answer was not a number.
    NotANumber,
    /// The number does not name a listed game.
    OutOfRange {
        /// How many games are listed.
        count: usize,
    },
}

impl Display for SelectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::NotANumber => f.write_str("Please enter a valid number"),
            SelectionError::OutOfRange { count } => {
                write!(f, "Please enter a number between 1 and {}", count)
            }
        }
    }
}

impl From<SelectionError> for Error {
    fn from(err: SelectionError) -> Self {
        Error::Custom(err.to_string())
    }
}

/// Parses a 1-based game number or `q` against a list of `count` games.
pub fn parse_selection(input: &str, count: usize) -> Result<Selection, SelectionError> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("q") {
        return Ok(Selection::Quit);
    }
    let n: usize = input.parse().map_err(|_| SelectionError::NotANumber)?;
    if (1..=count).contains(&n) {
        Ok(Selection::Game(n - 1))
    } else {
        Err(SelectionError::OutOfRange { count })
    }
}

/// Asks the operator to pick one of `games`, re-prompting on invalid input.
///
/// Picking a finished game needs a confirmation. Returns [`None`] when the
/// operator quits, input ends, or `ctx` is cancelled.
pub fn choose(
    ctx: &Context,
    lines: &Lines,
    games: &[GameSnapshot],
) -> Result<Option<GameSnapshot>, Error> {
    loop {
        let answer = match lines.prompt(ctx, "\nEnter game number to track (or 'q' to quit): ")? {
            Some(answer) => answer,
            None => return Ok(None),
        };

        let game = match parse_selection(&answer, games.len()) {
            Ok(Selection::Quit) => return Ok(None),
            Ok(Selection::Game(i)) => &games[i],
            Err(err) => {
                println!("{}", err);
                continue;
            }
        };

        if game.is_final() {
            println!("\nNote: This game has ended. The program will exit immediately.");
            match lines.prompt(ctx, "Continue anyway? (y/n): ")? {
                Some(confirm) if confirm.trim().eq_ignore_ascii_case("y") => {}
                Some(_) => continue,
                None => return Ok(None),
            }
        }
        return Ok(Some(game.clone()));
    }
}
