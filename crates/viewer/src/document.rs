//! The loaded document: its games, the navigation cursor over the selected
//! game, and the analysis currently shown for the cursor's position.

use engine_session::EngineAnalysis;
use pgn_core::{
    identify_opening, opening_name, parse_pgn, replay_game, Game, NavigationCursor,
    NavigationUpdate, PgnError, ShakmatyRules,
};
use serde::Serialize;

/// Plies considered when naming the opening of a game.
const OPENING_PLIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedOpening {
    pub eco: String,
    pub name: String,
}

pub struct Document {
    games: Vec<Game>,
    selected: usize,
    cursor: NavigationCursor,
    analysis: Option<EngineAnalysis>,
}

impl Document {
    /// Parse `text` and select its first game.
    pub fn load(text: &str) -> Result<Self, PgnError> {
        Self::from_games(parse_pgn(text)?)
    }

    pub fn from_games(games: Vec<Game>) -> Result<Self, PgnError> {
        let first = games.first().cloned().ok_or(PgnError::EmptyDocument)?;
        let mut cursor = NavigationCursor::default();
        cursor.load(first);
        Ok(Self {
            games,
            selected: 0,
            cursor,
            analysis: None,
        })
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> &Game {
        &self.games[self.selected]
    }

    pub fn cursor(&self) -> &NavigationCursor {
        &self.cursor
    }

    /// Show game `index` from its starting position. `None` if out of range.
    pub fn select_game(&mut self, index: usize) -> Option<NavigationUpdate> {
        let game = self.games.get(index)?.clone();
        self.selected = index;
        let update = self.cursor.load(game);
        self.analysis = None;
        Some(update)
    }

    pub fn step_forward(&mut self) -> NavigationUpdate {
        let update = self.cursor.step_forward();
        self.after_move(update)
    }

    pub fn step_backward(&mut self) -> NavigationUpdate {
        let update = self.cursor.step_backward();
        self.after_move(update)
    }

    pub fn go_to_start(&mut self) -> NavigationUpdate {
        let update = self.cursor.go_to_start();
        self.after_move(update)
    }

    pub fn go_to_end(&mut self) -> NavigationUpdate {
        let update = self.cursor.go_to_end();
        self.after_move(update)
    }

    pub fn go_to_ply(&mut self, ply: isize) -> NavigationUpdate {
        let update = self.cursor.go_to_ply(ply);
        self.after_move(update)
    }

    /// One auto-play step. `None` once the cursor can no longer advance,
    /// either at the last ply or blocked by an illegal move.
    pub fn play_step(&mut self) -> Option<NavigationUpdate> {
        let before = self.cursor.current_ply();
        let update = self.step_forward();
        (update.ply > before || update.malformed.is_some()).then_some(update)
    }

    pub fn current_fen(&self) -> &str {
        self.cursor.position()
    }

    /// Analysis of the displayed position, if one has been accepted.
    pub fn analysis(&self) -> Option<&EngineAnalysis> {
        self.analysis.as_ref()
    }

    /// Show `analysis` if it belongs to the displayed position. Results for
    /// any other position are dropped and `false` is returned.
    pub fn apply_analysis(&mut self, analysis: EngineAnalysis) -> bool {
        if analysis.fen != self.current_fen() {
            tracing::debug!(fen = %analysis.fen, "Discarding analysis for another position");
            return false;
        }
        self.analysis = Some(analysis);
        true
    }

    /// Opening of the selected game from its first moves, falling back to
    /// the `ECO` header.
    pub fn opening(&self) -> Option<DetectedOpening> {
        let game = self.selected();
        if game.moves().is_empty() {
            return None;
        }

        let prefix = &game.moves()[..game.moves().len().min(OPENING_PLIES)];
        if let Some(opening) = identify_opening(prefix) {
            return Some(DetectedOpening {
                eco: opening.eco.to_string(),
                name: opening.full_name(),
            });
        }

        game.header("ECO")
            .filter(|eco| !eco.is_empty())
            .map(|eco| DetectedOpening {
                eco: eco.to_string(),
                name: opening_name(eco),
            })
    }

    /// Games that cannot be replayed to the end, with the reason.
    pub fn check_games(&self) -> Vec<(usize, PgnError)> {
        let mut rules = ShakmatyRules::new();
        self.games
            .iter()
            .enumerate()
            .filter_map(|(i, game)| replay_game(&mut rules, game).err().map(|e| (i, e)))
            .collect()
    }

    fn after_move(&mut self, update: NavigationUpdate) -> NavigationUpdate {
        if self
            .analysis
            .as_ref()
            .is_some_and(|a| a.fen != update.fen)
        {
            self.analysis = None;
        }
        update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgn_core::START_PLY;

    const TWO_GAMES: &str = r#"[White "A"]
[Black "B"]
[ECO "B20"]

1. e4 c5 2. Nf3 d6 *

[White "C"]
[Black "D"]

1. d4 Nf6 2. c4 e6 3. Nc3 Bb4 1-0
"#;

    #[test]
    fn test_load_selects_first_game() {
        let doc = Document::load(TWO_GAMES).unwrap();
        assert_eq!(doc.games().len(), 2);
        assert_eq!(doc.selected_index(), 0);
        assert_eq!(doc.selected().header("White"), Some("A"));
        assert_eq!(doc.cursor().current_ply(), START_PLY);
    }

    #[test]
    fn test_empty_document() {
        assert!(matches!(
            Document::load("{nothing}"),
            Err(PgnError::EmptyDocument)
        ));
    }

    #[test]
    fn test_select_game() {
        let mut doc = Document::load(TWO_GAMES).unwrap();
        doc.go_to_end();
        let update = doc.select_game(1).unwrap();
        assert_eq!(update.ply, START_PLY);
        assert_eq!(doc.go_to_end().ply, 5);
        assert!(doc.select_game(2).is_none());
        assert_eq!(doc.selected_index(), 1);
    }

    #[test]
    fn test_check_games() {
        let doc = Document::load(TWO_GAMES).unwrap();
        assert!(doc.check_games().is_empty());

        let doc = Document::load("1. e4 *\n\n[White \"X\"]\n\n1. e4 e4 *").unwrap();
        let issues = doc.check_games();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].0, 1);
        assert!(matches!(&issues[0].1, PgnError::MalformedGame(m) if m.ply == 1));
    }

    #[test]
    fn test_sample_game() {
        let doc = Document::load(crate::SAMPLE_PGN).unwrap();
        assert_eq!(doc.games().len(), 1);
        assert_eq!(doc.selected().moves().len(), 85);
        assert_eq!(doc.selected().header("Black"), Some("Spassky, Boris V."));
        assert!(doc.check_games().is_empty());
    }

    #[test]
    fn test_play_step_stops_at_the_end() {
        let mut doc = Document::load(TWO_GAMES).unwrap();
        let plies: Vec<isize> = std::iter::from_fn(|| doc.play_step().map(|u| u.ply)).collect();
        assert_eq!(plies, vec![0, 1, 2, 3]);
        assert!(doc.play_step().is_none());
    }

    #[test]
    fn test_play_step_stops_at_an_illegal_move() {
        let mut doc = Document::load("1. e4 e5 2. Ke3 *").unwrap();
        assert_eq!(doc.play_step().map(|u| u.ply), Some(0));
        assert_eq!(doc.play_step().map(|u| u.ply), Some(1));

        let blocked = doc.play_step().unwrap();
        assert_eq!(blocked.ply, 1);
        assert_eq!(blocked.malformed.map(|m| m.ply), Some(2));
        assert!(doc.play_step().is_none());
    }

    #[test]
    fn test_stale_analysis_is_discarded() {
        let mut doc = Document::load(TWO_GAMES).unwrap();
        let start_fen = doc.current_fen().to_string();
        doc.step_forward();

        assert!(!doc.apply_analysis(EngineAnalysis::empty(&start_fen)));
        assert!(doc.analysis().is_none());

        let here = doc.current_fen().to_string();
        assert!(doc.apply_analysis(EngineAnalysis::empty(&here)));
        assert!(doc.analysis().is_some());

        doc.step_forward();
        assert!(doc.analysis().is_none());
    }

    #[test]
    fn test_opening_detection() {
        let mut doc = Document::load(TWO_GAMES).unwrap();
        let opening = doc.opening().unwrap();
        assert_eq!(opening.eco, "B50");
        assert_eq!(opening.name, "Sicilian Defense");

        doc.select_game(1);
        assert_eq!(doc.opening().unwrap().eco, "E20");
    }

    #[test]
    fn test_opening_falls_back_to_eco_header() {
        let doc = Document::load("[ECO \"B22\"]\n\n1. a3 a6 *").unwrap();
        assert_eq!(
            doc.opening(),
            Some(DetectedOpening {
                eco: "B22".into(),
                name: "Sicilian Defense: Alapin".into(),
            })
        );

        let doc = Document::load("1. a3 a6 *").unwrap();
        assert!(doc.opening().is_none());
    }
}
