//! PGN error types

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PgnError {
    #[error("No valid games found in PGN")]
    EmptyDocument,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    MalformedGame(#[from] MalformedGame),

    #[error("Invalid header syntax: {line}")]
    InvalidHeaderSyntax { line: String },

    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },
}

/// Replay hit a move the rules engine rejected.
///
/// `ply` is the 0-based index of the rejected move; the game stays viewable
/// up to `ply - 1`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Illegal move '{san}' at ply {ply}: {reason}")]
pub struct MalformedGame {
    pub ply: usize,
    pub san: String,
    pub reason: String,
}
