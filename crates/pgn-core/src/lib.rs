//! PGN parsing, game model and move navigation.

pub mod cursor;
pub mod error;
pub mod game;
pub mod headers;
pub mod opening;
pub mod rules;
pub mod splitter;
pub mod tokenizer;

pub use cursor::{replay_game, NavigationCursor, NavigationUpdate, START_PLY};
pub use error::{MalformedGame, PgnError};
pub use game::{
    build_game, format_moves_for_display, game_title, parse_pgn, validate_pgn, Game, GameResult,
    MovePair, ValidationReport,
};
pub use headers::{format_pgn_headers, parse_headers, HeaderSection, Headers};
pub use opening::{identify_opening, opening_name, Opening, OPENINGS};
pub use rules::{AppliedMove, RulesEngine, RulesError, ShakmatyRules, STANDARD_START_FEN};
pub use splitter::split_games;
pub use tokenizer::{tokenize_moves, TokenizedMoves};
