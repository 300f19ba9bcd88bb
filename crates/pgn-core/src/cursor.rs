//! Navigation cursor over a game's mainline.
//!
//! The cursor owns the current ply and nothing else. The board position is
//! always re-derived by replaying moves `0..=ply` from the game's starting
//! position through a [`RulesEngine`].

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{MalformedGame, PgnError};
use crate::game::Game;
use crate::rules::{AppliedMove, RulesEngine, ShakmatyRules};

/// Ply index of the starting position, before any move.
pub const START_PLY: isize = -1;

/// State after a cursor transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationUpdate {
    /// Effective ply, in `[-1, moves.len() - 1]`.
    pub ply: isize,
    pub fen: String,
    pub last_move: Option<AppliedMove>,
    /// Set on the first transition that runs into an illegal move, and only then.
    pub malformed: Option<MalformedGame>,
}

pub struct NavigationCursor<R: RulesEngine = ShakmatyRules> {
    rules: R,
    game: Option<Game>,
    start_fen: Option<String>,
    current_ply: isize,
    fen: String,
    last_move: Option<AppliedMove>,
    divergence: Option<MalformedGame>,
}

impl Default for NavigationCursor<ShakmatyRules> {
    fn default() -> Self {
        Self::new(ShakmatyRules::new())
    }
}

impl<R: RulesEngine> NavigationCursor<R> {
    pub fn new(mut rules: R) -> Self {
        rules.reset();
        let fen = rules.current_position();
        Self {
            rules,
            game: None,
            start_fen: None,
            current_ply: START_PLY,
            fen,
            last_move: None,
            divergence: None,
        }
    }

    /// Show `game` from its starting position.
    ///
    /// A `FEN` header that the rules engine rejects falls back to the standard
    /// initial position.
    pub fn load(&mut self, game: Game) -> NavigationUpdate {
        self.start_fen = match game.starting_fen() {
            Some(fen) => match self.rules.load_position(fen) {
                Ok(()) => Some(fen.to_string()),
                Err(e) => {
                    warn!(fen, error = %e, "Ignoring unparsable FEN header");
                    None
                }
            },
            None => None,
        };
        self.game = Some(game);
        self.divergence = None;
        self.go_to_ply(START_PLY)
    }

    pub fn unload(&mut self) {
        self.game = None;
        self.start_fen = None;
        self.divergence = None;
        self.rules.reset();
        self.current_ply = START_PLY;
        self.fen = self.rules.current_position();
        self.last_move = None;
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn current_ply(&self) -> isize {
        self.current_ply
    }

    /// Index of the final ply, or `START_PLY` for a game without moves.
    pub fn last_ply(&self) -> isize {
        self.game
            .as_ref()
            .map_or(START_PLY, |g| g.moves().len() as isize - 1)
    }

    pub fn position(&self) -> &str {
        &self.fen
    }

    pub fn last_move(&self) -> Option<&AppliedMove> {
        self.last_move.as_ref()
    }

    /// The illegal move found so far, if any.
    pub fn divergence(&self) -> Option<&MalformedGame> {
        self.divergence.as_ref()
    }

    pub fn go_to_start(&mut self) -> NavigationUpdate {
        self.go_to_ply(START_PLY)
    }

    pub fn go_to_end(&mut self) -> NavigationUpdate {
        let end = self.last_ply();
        self.go_to_ply(end)
    }

    pub fn step_forward(&mut self) -> NavigationUpdate {
        let next = self.current_ply + 1;
        self.go_to_ply(next)
    }

    pub fn step_backward(&mut self) -> NavigationUpdate {
        let prev = self.current_ply - 1;
        self.go_to_ply(prev)
    }

    /// Move to ply `n`, clamped to the game. Without a game this is a no-op.
    pub fn go_to_ply(&mut self, n: isize) -> NavigationUpdate {
        let Some(game) = &self.game else {
            return self.snapshot(None);
        };

        let target = n.clamp(START_PLY, game.moves().len() as isize - 1);

        match &self.start_fen {
            Some(fen) => {
                if let Err(e) = self.rules.load_position(fen) {
                    // validated on load, so the engine changed its mind
                    warn!(error = %e, "Starting FEN rejected on replay");
                    self.rules.reset();
                }
            }
            None => self.rules.reset(),
        }

        let mut reached = START_PLY;
        let mut last_move = None;
        let mut malformed = None;

        for (ply, san) in game.moves().iter().enumerate().take((target + 1) as usize) {
            match self.rules.apply_move(san) {
                Ok(applied) => {
                    reached = ply as isize;
                    last_move = Some(applied);
                }
                Err(e) => {
                    if self.divergence.is_none() {
                        warn!(ply, san = %san, error = %e, "Replay stopped at illegal move");
                        let signal = MalformedGame {
                            ply,
                            san: san.clone(),
                            reason: e.to_string(),
                        };
                        self.divergence = Some(signal.clone());
                        malformed = Some(signal);
                    } else {
                        debug!(ply, "Replay clamped at known illegal move");
                    }
                    break;
                }
            }
        }

        self.current_ply = reached;
        self.fen = self.rules.current_position();
        self.last_move = last_move;
        self.snapshot(malformed)
    }

    fn snapshot(&self, malformed: Option<MalformedGame>) -> NavigationUpdate {
        NavigationUpdate {
            ply: self.current_ply,
            fen: self.fen.clone(),
            last_move: self.last_move.clone(),
            malformed,
        }
    }
}

/// Replay a whole game up front, failing on an unusable `FEN` header or the
/// first move the rules engine rejects.
pub fn replay_game<R: RulesEngine>(
    rules: &mut R,
    game: &Game,
) -> Result<Vec<AppliedMove>, PgnError> {
    match game.starting_fen() {
        Some(fen) => rules
            .load_position(fen)
            .map_err(|e| PgnError::InvalidFen {
                fen: fen.to_string(),
                reason: e.to_string(),
            })?,
        None => rules.reset(),
    }

    game.moves()
        .iter()
        .enumerate()
        .map(|(ply, san)| {
            rules.apply_move(san).map_err(|e| {
                PgnError::from(MalformedGame {
                    ply,
                    san: san.clone(),
                    reason: e.to_string(),
                })
            })
        })
        .collect()
}
