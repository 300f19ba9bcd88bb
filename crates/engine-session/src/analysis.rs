//! Accumulated engine analysis for one position.

use serde::{Deserialize, Serialize};

use crate::uci::{InfoLine, Score};

/// Evaluation reported for a forced mate, in pawns.
pub const MATE_EVALUATION: f64 = 100.0;

/// Latest analysis of a position. Scores are from White's point of view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineAnalysis {
    /// Position this analysis belongs to.
    pub fen: String,
    /// Pawns; positive favors White.
    pub evaluation: f64,
    pub depth: u32,
    /// UCI notation, empty until the engine names one.
    pub best_move: String,
    pub principal_variation: Vec<String>,
    pub node_count: u64,
    /// Moves to mate; positive when White mates.
    pub mate_distance: Option<i32>,
}

impl EngineAnalysis {
    /// Neutral, zero-valued analysis for `fen`.
    pub fn empty(fen: &str) -> Self {
        Self {
            fen: fen.to_string(),
            ..Self::default()
        }
    }

    /// Fold an `info` line into the analysis.
    ///
    /// Secondary multi-PV lines are ignored. Returns whether anything changed.
    pub fn apply_info(&mut self, info: &InfoLine, white_to_move: bool) -> bool {
        if info.multipv.is_some_and(|n| n > 1) {
            return false;
        }

        let perspective = if white_to_move { 1 } else { -1 };
        let mut changed = false;

        if let Some(depth) = info.depth {
            self.depth = depth;
            changed = true;
        }

        match info.score {
            Some(Score::Centipawns(cp)) => {
                self.evaluation = f64::from(cp) * f64::from(perspective) / 100.0;
                self.mate_distance = None;
                changed = true;
            }
            Some(Score::Mate(moves)) => {
                // "mate 0" means the side to move is already mated
                let mover_wins = if moves > 0 { 1 } else { -1 };
                self.evaluation = MATE_EVALUATION * f64::from(mover_wins * perspective);
                self.mate_distance = Some(moves.saturating_mul(perspective));
                changed = true;
            }
            None => {}
        }

        if let Some(nodes) = info.nodes {
            self.node_count = nodes;
            changed = true;
        }

        if let Some(first) = info.pv.first() {
            self.best_move = first.clone();
            self.principal_variation = info.pv.clone();
            changed = true;
        }

        changed
    }
}

/// Whether `fen` has White to move. Malformed FENs count as White.
pub fn white_to_move(fen: &str) -> bool {
    fen.split_whitespace().nth(1) != Some("b")
}

/// Depth milestones at which progress is forwarded to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressPolicy {
    /// Notify on every multiple of this depth.
    pub depth_step: u32,
    /// Notify on every new depth at or above this one.
    pub depth_floor: u32,
}

impl Default for ProgressPolicy {
    fn default() -> Self {
        Self {
            depth_step: 3,
            depth_floor: 10,
        }
    }
}

impl ProgressPolicy {
    pub fn should_notify(&self, depth: u32, last_notified: u32) -> bool {
        depth > last_notified && (depth % self.depth_step.max(1) == 0 || depth >= self.depth_floor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uci::parse_info;

    const BLACK_TO_MOVE: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";

    #[test]
    fn test_centipawns_to_pawns() {
        let mut analysis = EngineAnalysis::empty("start");
        let info = parse_info("info depth 12 score cp 35 nodes 4000 pv e2e4 e7e5");
        assert!(analysis.apply_info(&info, true));
        assert_eq!(analysis.depth, 12);
        assert!((analysis.evaluation - 0.35).abs() < 1e-9);
        assert_eq!(analysis.best_move, "e2e4");
        assert_eq!(analysis.principal_variation, vec!["e2e4", "e7e5"]);
        assert_eq!(analysis.node_count, 4000);
    }

    #[test]
    fn test_black_to_move_is_flipped() {
        assert!(!white_to_move(BLACK_TO_MOVE));
        let mut analysis = EngineAnalysis::empty(BLACK_TO_MOVE);
        analysis.apply_info(&parse_info("info depth 10 score cp 50 pv e7e5"), false);
        assert!((analysis.evaluation + 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_mate_scores() {
        let mut analysis = EngineAnalysis::empty("x");
        analysis.apply_info(&parse_info("info depth 30 score mate 2 pv h5f7"), true);
        assert_eq!(analysis.mate_distance, Some(2));
        assert_eq!(analysis.evaluation, MATE_EVALUATION);

        analysis.apply_info(&parse_info("info depth 30 score mate 2 pv h4e1"), false);
        assert_eq!(analysis.mate_distance, Some(-2));
        assert_eq!(analysis.evaluation, -MATE_EVALUATION);

        analysis.apply_info(&parse_info("info depth 31 score cp 10"), true);
        assert_eq!(analysis.mate_distance, None);
    }

    #[test]
    fn test_extreme_scores_with_black_to_move() {
        let mut analysis = EngineAnalysis::empty(BLACK_TO_MOVE);
        analysis.apply_info(&parse_info("info depth 5 score cp -2147483648"), false);
        assert!((analysis.evaluation - 21_474_836.48).abs() < 1e-6);

        analysis.apply_info(&parse_info("info depth 5 score mate -2147483648"), false);
        assert_eq!(analysis.mate_distance, Some(i32::MAX));
        assert_eq!(analysis.evaluation, MATE_EVALUATION);
    }

    #[test]
    fn test_secondary_pv_ignored() {
        let mut analysis = EngineAnalysis::empty("x");
        let info = parse_info("info depth 8 multipv 2 score cp -40 pv a2a3");
        assert!(!analysis.apply_info(&info, true));
        assert_eq!(analysis, EngineAnalysis::empty("x"));
    }

    #[test]
    fn test_progress_milestones() {
        let policy = ProgressPolicy::default();
        assert!(!policy.should_notify(1, 0));
        assert!(policy.should_notify(3, 0));
        assert!(!policy.should_notify(4, 3));
        assert!(policy.should_notify(6, 3));
        assert!(policy.should_notify(10, 9));
        assert!(policy.should_notify(11, 10));
        assert!(!policy.should_notify(11, 11));

        let every = ProgressPolicy {
            depth_step: 0,
            depth_floor: 0,
        };
        assert!(every.should_notify(1, 0));
    }
}
