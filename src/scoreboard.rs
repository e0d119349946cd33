//! # Scoreboard API.
//!
//! Reads today's games from the NBA live-data feed. The feed is a single JSON
//! document listing every game of the day; a game is looked up by its id on
//! each poll.

use std::{
    fmt::{self, Display, Formatter},
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use serde::Deserialize;

use crate::error::Error;

/// Today's scoreboard on the NBA CDN.
pub const DEFAULT_URL: &str =
    "https://cdn.nba.com/static/json/liveData/scoreboard/todaysScoreboard_00.json";

/// Where a game is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GamePhase {
    /// Not started yet.
    Scheduled,
    /// In progress (including breaks).
    Live,
    /// Over.
    Final,
}

impl GamePhase {
    fn from_code(code: u8) -> Self {
        match code {
            2 => GamePhase::Live,
            3 => GamePhase::Final,
            _ => GamePhase::Scheduled,
        }
    }
}

/// One game as seen on one poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSnapshot {
    /// Feed identifier of the game.
    pub game_id: String,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Home team points.
    pub home_score: u32,
    /// Away team points.
    pub away_score: u32,
    /// Human-readable status, e.g. `Q3 5:12`, `Half`, `Final`.
    pub status: String,
    /// Lifecycle phase.
    pub phase: GamePhase,
}

impl GameSnapshot {
    /// Whether the game has concluded.
    pub fn is_final(&self) -> bool {
        self.phase == GamePhase::Final || self.status.starts_with("Final")
    }

    /// The score line, away team first as the feed's matchups read.
    pub fn score_line(&self) -> String {
        format!(
            "{} {} - {} {}",
            self.away_team, self.away_score, self.home_team, self.home_score
        )
    }
}

/// A provider of the current scoreboard.
pub trait ScoreSource {
    /// Fetches every game currently listed.
    fn games(&mut self) -> Result<Vec<GameSnapshot>, SourceError>;

    /// Fetches one game by id. `Ok(None)` means the game is no longer listed.
    fn game(&mut self, game_id: &str) -> Result<Option<GameSnapshot>, SourceError> {
        Ok(self.games()?.into_iter().find(|g| g.game_id == game_id))
    }
}

impl<S: ScoreSource + ?Sized> ScoreSource for Box<S> {
    fn games(&mut self) -> Result<Vec<GameSnapshot>, SourceError> {
        (**self).games()
    }

    fn game(&mut self, game_id: &str) -> Result<Option<GameSnapshot>, SourceError> {
        (**self).game(game_id)
    }
}

/// The NBA live-data scoreboard over HTTP.
#[derive(Clone, Debug)]
pub struct NbaScoreboard {
    url: String,
}

impl NbaScoreboard {
    /// Reads the default CDN endpoint.
    pub fn new() -> Self {
        Self::with_url(DEFAULT_URL)
    }

    /// Reads a custom endpoint serving the same document shape.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Gets the endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches the scoreboard document without interpreting it.
    pub fn fetch_raw(&self) -> Result<serde_json::Value, SourceError> {
        let bytes = self.fetch_bytes()?;
        serde_json::from_slice(&bytes).map_err(|err| SourceError::Malformed(err.to_string()))
    }

    fn fetch_bytes(&self) -> Result<Vec<u8>, SourceError> {
        log::trace!("GET {}", self.url);
        let request = ehttp::Request::get(&self.url);
        let response = ehttp::fetch_blocking(&request).map_err(SourceError::Network)?;
        if response.ok {
            Ok(response.bytes)
        } else {
            Err(SourceError::Http {
                status: response.status,
                text: response.status_text,
            })
        }
    }
}

impl Default for NbaScoreboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreSource for NbaScoreboard {
    fn games(&mut self) -> Result<Vec<GameSnapshot>, SourceError> {
        parse_games(&self.fetch_bytes()?)
    }
}

#[derive(Deserialize)]
struct Envelope {
    scoreboard: Board,
}

#[derive(Deserialize)]
struct Board {
    games: Vec<RawGame>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGame {
    game_id: String,
    #[serde(default)]
    game_status: u8,
    game_status_text: String,
    home_team: RawTeam,
    away_team: RawTeam,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTeam {
    team_name: String,
    score: i64,
}

/// Parses a scoreboard document into snapshots.
pub fn parse_games(bytes: &[u8]) -> Result<Vec<GameSnapshot>, SourceError> {
    let envelope: Envelope =
        serde_json::from_slice(bytes).map_err(|err| SourceError::Malformed(err.to_string()))?;

    envelope
        .scoreboard
        .games
        .into_iter()
        .map(|game| {
            let home_score = score(&game.game_id, &game.home_team)?;
            let away_score = score(&game.game_id, &game.away_team)?;
            Ok(GameSnapshot {
                home_team: game.home_team.team_name,
                away_team: game.away_team.team_name,
                home_score,
                away_score,
                status: game.game_status_text.trim().to_string(),
                phase: GamePhase::from_code(game.game_status),
                game_id: game.game_id,
            })
        })
        .collect()
}

fn score(game_id: &str, team: &RawTeam) -> Result<u32, SourceError> {
    if team.score < 0 || team.score > i64::from(u32::MAX) {
        Err(SourceError::Malformed(format!(
            "game {}: {} has score {}",
            game_id, team.team_name, team.score
        )))
    } else {
        Ok(team.score as u32)
    }
}

/// Writes a raw scoreboard document to `path`, pretty-printed.
pub fn save_raw(value: &serde_json::Value, path: &Path) -> Result<(), Error> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Represents possible errors when reading the scoreboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The request did not complete (DNS, connect, TLS, timeout).
    Network(String),
    /// The server answered with a non-success status.
    Http {
        /// HTTP status code.
        status: u16,
        /// HTTP status text.
        text: String,
    },
    /// The response did not have the expected shape.
    Malformed(String),
}

impl SourceError {
    /// Whether retrying the same request later can be expected to succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Network(_) => true,
            SourceError::Http { status, .. } => *status == 429 || *status >= 500,
            SourceError::Malformed(_) => false,
        }
    }

    /// Whether the response arrived but could not be understood.
    pub fn is_malformed(&self) -> bool {
        matches!(self, SourceError::Malformed(_))
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Network(msg) => write!(f, "network error: {}", msg),
            SourceError::Http { status, text } => write!(f, "HTTP {} {}", status, text),
            SourceError::Malformed(msg) => write!(f, "unexpected scoreboard response: {}", msg),
        }
    }
}

impl From<SourceError> for Error {
    fn from(err: SourceError) -> Self {
        Error::Source(err)
    }
}
