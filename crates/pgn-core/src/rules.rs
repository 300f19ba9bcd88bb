//! Chess rules capability used for move replay, with a shakmaty backend.

use serde::Serialize;
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Position};
use thiserror::Error;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    #[error("Invalid SAN '{0}'")]
    InvalidSan(String),

    #[error("Illegal move '{0}'")]
    IllegalMove(String),

    #[error("Invalid FEN: {0}")]
    InvalidFen(String),
}

/// A move accepted by the rules engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedMove {
    /// SAN as written in the source.
    pub san: String,
    pub uci: String,
    pub from: Option<String>,
    pub to: String,
    /// Position after the move.
    pub fen: String,
}

/// Capability interface over a chess rules implementation.
///
/// The navigation cursor only talks to this trait, so replay can be backed by
/// an in-process library or something out of process.
pub trait RulesEngine {
    /// Return to the standard initial position.
    fn reset(&mut self);

    fn load_position(&mut self, fen: &str) -> Result<(), RulesError>;

    /// Apply one SAN move to the current position.
    fn apply_move(&mut self, san: &str) -> Result<AppliedMove, RulesError>;

    /// FEN of the current position.
    fn current_position(&self) -> String;
}

#[derive(Debug, Clone, Default)]
pub struct ShakmatyRules {
    pos: Chess,
}

impl ShakmatyRules {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RulesEngine for ShakmatyRules {
    fn reset(&mut self) {
        self.pos = Chess::default();
    }

    fn load_position(&mut self, fen: &str) -> Result<(), RulesError> {
        let parsed: Fen = fen
            .trim()
            .parse()
            .map_err(|e| RulesError::InvalidFen(format!("{e}")))?;
        self.pos = parsed
            .into_position::<Chess>(CastlingMode::Standard)
            .map_err(|e| RulesError::InvalidFen(format!("{e}")))?;
        Ok(())
    }

    fn apply_move(&mut self, san_str: &str) -> Result<AppliedMove, RulesError> {
        // Annotation and check suffixes like "+!?" are not needed to resolve the move
        let bare = san_str.trim_end_matches(['!', '?', '+', '#']);
        let bare = match bare {
            "0-0" => "O-O",
            "0-0-0" => "O-O-O",
            other => other,
        };

        let san: San = bare
            .parse()
            .map_err(|_| RulesError::InvalidSan(san_str.to_string()))?;

        let mv = san
            .to_move(&self.pos)
            .map_err(|_| RulesError::IllegalMove(san_str.to_string()))?;

        // castling reports the king's destination, not the rook square
        let uci = mv.to_uci(CastlingMode::Standard);
        let (from, to) = match &uci {
            UciMove::Normal { from, to, .. } => (Some(from.to_string()), to.to_string()),
            UciMove::Put { to, .. } => (None, to.to_string()),
            UciMove::Null => (None, String::new()),
        };
        let uci = uci.to_string();

        self.pos.play_unchecked(mv);

        Ok(AppliedMove {
            san: san_str.to_string(),
            uci,
            from,
            to,
            fen: self.current_position(),
        })
    }

    fn current_position(&self) -> String {
        Fen::from_position(&self.pos, EnPassantMode::Legal).to_string()
    }
}
