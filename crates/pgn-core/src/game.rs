//! Game model: builds `Game`s from PGN text and serializes them back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PgnError;
use crate::headers::{format_pgn_headers, parse_headers, Headers};
use crate::splitter::split_games;
use crate::tokenizer::tokenize_moves;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    #[serde(rename = "1-0")]
    WhiteWins,
    #[serde(rename = "0-1")]
    BlackWins,
    #[serde(rename = "1/2-1/2")]
    Draw,
    #[default]
    #[serde(rename = "*")]
    Ongoing,
}

impl GameResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameResult::WhiteWins => "1-0",
            GameResult::BlackWins => "0-1",
            GameResult::Draw => "1/2-1/2",
            GameResult::Ongoing => "*",
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameResult {
    type Err = PgnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1-0" => Ok(GameResult::WhiteWins),
            "0-1" => Ok(GameResult::BlackWins),
            "1/2-1/2" => Ok(GameResult::Draw),
            "*" => Ok(GameResult::Ongoing),
            other => Err(PgnError::Parse(format!("Not a game result: {other}"))),
        }
    }
}

/// A parsed game. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    headers: Headers,
    moves: Vec<String>, // SAN, one per ply, White at even indices
    result: GameResult,
}

impl Game {
    pub fn new(headers: Headers, moves: Vec<String>, result: GameResult) -> Self {
        Self {
            headers,
            moves,
            result,
        }
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// Starting position override from the `FEN` header, if any.
    pub fn starting_fen(&self) -> Option<&str> {
        self.headers
            .get("FEN")
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }

    /// Serialize back to PGN: headers, blank line, moves, result.
    pub fn to_pgn(&self) -> String {
        let mut pgn = format_pgn_headers(&self.headers);
        pgn.push('\n');
        pgn.push_str(&self.moves.join(" "));
        pgn.push(' ');
        pgn.push_str(self.result.as_str());
        pgn
    }

    pub fn title(&self) -> String {
        game_title(&self.headers)
    }
}

/// Build a single game from one text span.
///
/// Fails only when the span has no headers, no moves and no result token.
/// Anything else yields a best-effort game.
pub fn build_game(span: &str) -> Result<Game, PgnError> {
    let section = parse_headers(span);
    for rejected in &section.rejected {
        debug!(error = %rejected, "Header line skipped");
    }

    let move_text = section.move_lines.join(" ");
    let tokenized = tokenize_moves(&move_text);

    if section.headers.is_empty() && tokenized.moves.is_empty() && tokenized.result.is_none() {
        return Err(PgnError::Parse("no headers, moves or result found".into()));
    }

    let result = tokenized
        .result
        .or_else(|| section.headers.get("Result").and_then(|r| r.parse().ok()))
        .unwrap_or_default();

    Ok(Game::new(section.headers, tokenized.moves, result))
}

/// Parse a PGN document that may hold several games.
///
/// A span that fails to build is skipped; the rest still load. Fails with
/// `EmptyDocument` when nothing usable remains.
pub fn parse_pgn(text: &str) -> Result<Vec<Game>, PgnError> {
    let mut games = Vec::new();

    for (index, span) in split_games(text).iter().enumerate() {
        match build_game(span) {
            Ok(game) => games.push(game),
            Err(e) => warn!(index, error = %e, "Skipping unparsable game"),
        }
    }

    if games.is_empty() {
        return Err(PgnError::EmptyDocument);
    }

    debug!(count = games.len(), "Parsed PGN document");
    Ok(games)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// User-facing validation of a document before loading it.
pub fn validate_pgn(text: &str) -> ValidationReport {
    let mut errors = Vec::new();

    if text.trim().is_empty() {
        errors.push("PGN text is empty".to_string());
    } else if let Err(e) = parse_pgn(text) {
        errors.push(e.to_string());
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// One numbered row of a move list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovePair {
    pub number: usize,
    pub white: Option<String>,
    pub black: Option<String>,
}

pub fn format_moves_for_display(moves: &[String]) -> Vec<MovePair> {
    moves
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| MovePair {
            number: i + 1,
            white: pair.first().cloned(),
            black: pair.get(1).cloned(),
        })
        .collect()
}

pub fn game_title(headers: &Headers) -> String {
    let white = headers.get("White").unwrap_or("Unknown");
    let black = headers.get("Black").unwrap_or("Unknown");
    let result = headers.get("Result").unwrap_or("*");
    let date = headers.get("Date").unwrap_or("");
    format!("{white} vs {black} ({result}) {date}")
}
