//! Opening identification by longest move-prefix match.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Opening {
    pub eco: &'static str,
    pub name: &'static str,
    pub variation: Option<&'static str>,
    pub moves: &'static [&'static str],
}

impl Opening {
    /// `"Name: Variation"`, or just the name.
    pub fn full_name(&self) -> String {
        match self.variation {
            Some(variation) => format!("{}: {}", self.name, variation),
            None => self.name.to_string(),
        }
    }
}

const fn op(
    eco: &'static str,
    name: &'static str,
    variation: Option<&'static str>,
    moves: &'static [&'static str],
) -> Opening {
    Opening {
        eco,
        name,
        variation,
        moves,
    }
}

#[rustfmt::skip]
pub static OPENINGS: &[Opening] = &[
    op("C50", "Italian Game", None, &["e4", "e5", "Nf3", "Nc6", "Bc4"]),
    op("C51", "Evans Gambit", None, &["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5", "b4"]),
    op("C53", "Italian Game", Some("Classical"), &["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5", "c3"]),
    op("C60", "Ruy Lopez", None, &["e4", "e5", "Nf3", "Nc6", "Bb5"]),
    op("C65", "Ruy Lopez", Some("Berlin Defense"), &["e4", "e5", "Nf3", "Nc6", "Bb5", "Nf6"]),
    op("C67", "Ruy Lopez", Some("Berlin Defense, Rio de Janeiro"), &["e4", "e5", "Nf3", "Nc6", "Bb5", "Nf6", "O-O", "Nxe4"]),
    op("C68", "Ruy Lopez", Some("Exchange Variation"), &["e4", "e5", "Nf3", "Nc6", "Bb5", "a6", "Bxc6"]),
    op("B20", "Sicilian Defense", None, &["e4", "c5"]),
    op("B21", "Sicilian Defense", Some("Smith-Morra Gambit"), &["e4", "c5", "d4", "cxd4", "c3"]),
    op("B22", "Sicilian Defense", Some("Alapin"), &["e4", "c5", "c3"]),
    op("B23", "Sicilian Defense", Some("Closed"), &["e4", "c5", "Nc3"]),
    op("B27", "Sicilian Defense", Some("Hyperaccelerated Dragon"), &["e4", "c5", "Nf3", "g6"]),
    op("B30", "Sicilian Defense", Some("Old Sicilian"), &["e4", "c5", "Nf3", "Nc6"]),
    op("B32", "Sicilian Defense", Some("Open"), &["e4", "c5", "Nf3", "Nc6", "d4", "cxd4", "Nxd4"]),
    op("B33", "Sicilian Defense", Some("Sveshnikov"), &["e4", "c5", "Nf3", "Nc6", "d4", "cxd4", "Nxd4", "Nf6", "Nc3", "e5"]),
    op("B40", "Sicilian Defense", Some("French Variation"), &["e4", "c5", "Nf3", "e6"]),
    op("B50", "Sicilian Defense", None, &["e4", "c5", "Nf3", "d6"]),
    op("B51", "Sicilian Defense", Some("Moscow"), &["e4", "c5", "Nf3", "d6", "Bb5+"]),
    op("B54", "Sicilian Defense", Some("Dragon"), &["e4", "c5", "Nf3", "d6", "d4", "cxd4", "Nxd4", "Nf6", "Nc3", "g6"]),
    op("B70", "Sicilian Defense", Some("Dragon"), &["e4", "c5", "Nf3", "d6", "d4", "cxd4", "Nxd4", "Nf6", "Nc3", "g6"]),
    op("B90", "Sicilian Defense", Some("Najdorf"), &["e4", "c5", "Nf3", "d6", "d4", "cxd4", "Nxd4", "Nf6", "Nc3", "a6"]),
    op("C00", "French Defense", None, &["e4", "e6"]),
    op("C01", "French Defense", Some("Exchange"), &["e4", "e6", "d4", "d5", "exd5"]),
    op("C02", "French Defense", Some("Advance"), &["e4", "e6", "d4", "d5", "e5"]),
    op("C03", "French Defense", Some("Tarrasch"), &["e4", "e6", "d4", "d5", "Nd2"]),
    op("C10", "French Defense", Some("Rubinstein"), &["e4", "e6", "d4", "d5", "Nc3", "dxe4"]),
    op("C11", "French Defense", Some("Classical"), &["e4", "e6", "d4", "d5", "Nc3", "Nf6"]),
    op("C15", "French Defense", Some("Winawer"), &["e4", "e6", "d4", "d5", "Nc3", "Bb4"]),
    op("B10", "Caro-Kann Defense", None, &["e4", "c6"]),
    op("B11", "Caro-Kann Defense", Some("Two Knights"), &["e4", "c6", "Nc3", "d5", "Nf3"]),
    op("B12", "Caro-Kann Defense", Some("Advance"), &["e4", "c6", "d4", "d5", "e5"]),
    op("B13", "Caro-Kann Defense", Some("Exchange"), &["e4", "c6", "d4", "d5", "exd5"]),
    op("B15", "Caro-Kann Defense", Some("Main Line"), &["e4", "c6", "d4", "d5", "Nc3", "dxe4", "Nxe4"]),
    op("C30", "King's Gambit", None, &["e4", "e5", "f4"]),
    op("C31", "King's Gambit Declined", None, &["e4", "e5", "f4", "Bc5"]),
    op("C33", "King's Gambit Accepted", None, &["e4", "e5", "f4", "exf4"]),
    op("D06", "Queen's Gambit", None, &["d4", "d5", "c4"]),
    op("D07", "Queen's Gambit Declined", Some("Chigorin Defense"), &["d4", "d5", "c4", "Nc6"]),
    op("D20", "Queen's Gambit Accepted", None, &["d4", "d5", "c4", "dxc4"]),
    op("D30", "Queen's Gambit Declined", None, &["d4", "d5", "c4", "e6"]),
    op("D35", "Queen's Gambit Declined", Some("Exchange"), &["d4", "d5", "c4", "e6", "Nc3", "Nf6", "cxd5"]),
    op("D43", "Queen's Gambit Declined", Some("Semi-Slav"), &["d4", "d5", "c4", "e6", "Nc3", "Nf6", "Nf3", "c6"]),
    op("E00", "Catalan Opening", None, &["d4", "Nf6", "c4", "e6", "g3"]),
    op("E20", "Nimzo-Indian Defense", None, &["d4", "Nf6", "c4", "e6", "Nc3", "Bb4"]),
    op("E32", "Nimzo-Indian Defense", Some("Classical"), &["d4", "Nf6", "c4", "e6", "Nc3", "Bb4", "Qc2"]),
    op("E60", "King's Indian Defense", None, &["d4", "Nf6", "c4", "g6"]),
    op("E70", "King's Indian Defense", Some("Normal"), &["d4", "Nf6", "c4", "g6", "Nc3", "Bg7", "e4"]),
    op("E90", "King's Indian Defense", Some("Classical"), &["d4", "Nf6", "c4", "g6", "Nc3", "Bg7", "e4", "d6", "Nf3", "O-O", "Be2"]),
    op("D70", "Grünfeld Defense", None, &["d4", "Nf6", "c4", "g6", "Nc3", "d5"]),
    op("D80", "Grünfeld Defense", Some("Russian"), &["d4", "Nf6", "c4", "g6", "Nc3", "d5", "Qb3"]),
    op("A50", "Queen's Indian Defense", None, &["d4", "Nf6", "c4", "b6"]),
    op("A10", "English Opening", None, &["c4"]),
    op("A20", "English Opening", Some("Reversed Sicilian"), &["c4", "e5"]),
    op("A30", "English Opening", Some("Symmetrical"), &["c4", "c5"]),
    op("A00", "Uncommon Opening", None, &[]),
    op("A40", "Queen's Pawn Opening", None, &["d4"]),
    op("A45", "Trompowsky Attack", None, &["d4", "Nf6", "Bg5"]),
    op("B00", "King's Pawn Opening", None, &["e4"]),
    op("B01", "Scandinavian Defense", None, &["e4", "d5"]),
    op("B02", "Alekhine Defense", None, &["e4", "Nf6"]),
    op("B06", "Modern Defense", None, &["e4", "g6"]),
    op("B07", "Pirc Defense", None, &["e4", "d6", "Nf3", "Nf6"]),
    op("C20", "King's Pawn Game", None, &["e4", "e5"]),
    op("C40", "King's Knight Opening", None, &["e4", "e5", "Nf3"]),
    op("C44", "Scotch Game", None, &["e4", "e5", "Nf3", "Nc6", "d4"]),
    op("C45", "Scotch Game", Some("Schmidt"), &["e4", "e5", "Nf3", "Nc6", "d4", "exd4", "Nxd4", "Nf6"]),
    op("C46", "Three Knights Game", None, &["e4", "e5", "Nf3", "Nc6", "Nc3"]),
    op("C47", "Four Knights Game", None, &["e4", "e5", "Nf3", "Nc6", "Nc3", "Nf6"]),
    op("C48", "Four Knights Game", Some("Spanish"), &["e4", "e5", "Nf3", "Nc6", "Nc3", "Nf6", "Bb5"]),
    op("C55", "Two Knights Defense", None, &["e4", "e5", "Nf3", "Nc6", "Bc4", "Nf6"]),
    op("C57", "Two Knights Defense", Some("Fried Liver Attack"), &["e4", "e5", "Nf3", "Nc6", "Bc4", "Nf6", "Ng5", "d5", "exd5", "Nd4"]),
    op("D00", "Queen's Pawn Game", None, &["d4", "d5"]),
    op("D10", "Slav Defense", None, &["d4", "d5", "c4", "c6"]),
    op("D15", "Slav Defense", Some("Main Line"), &["d4", "d5", "c4", "c6", "Nf3", "Nf6", "Nc3"]),
    op("E10", "Blumenfeld Gambit", None, &["d4", "Nf6", "c4", "e6", "Nf3", "c5", "d5", "b5"]),
    op("E15", "Queen's Indian Defense", Some("Main Line"), &["d4", "Nf6", "c4", "b6", "Nf3", "e6", "g3"]),
];

/// Strip check, mate and capture markers so `Nxe4+` compares equal to `Ne4`.
fn normalize(san: &str) -> String {
    san.trim().chars().filter(|c| !matches!(c, '+' | '#' | 'x')).collect()
}

/// Find the table entry with the longest move sequence that is a prefix of
/// `moves`. Entries without moves never match; the first of equally long
/// matches wins.
pub fn identify_opening<S: AsRef<str>>(moves: &[S]) -> Option<&'static Opening> {
    if moves.is_empty() {
        return None;
    }

    let played: Vec<String> = moves.iter().map(|m| normalize(m.as_ref())).collect();

    let mut best: Option<&'static Opening> = None;
    for opening in OPENINGS {
        if opening.moves.is_empty() || opening.moves.len() > played.len() {
            continue;
        }
        let matches = opening
            .moves
            .iter()
            .zip(&played)
            .all(|(expected, actual)| normalize(expected) == *actual);

        if matches && best.map_or(true, |b| opening.moves.len() > b.moves.len()) {
            best = Some(opening);
        }
    }

    best
}

/// Display name for an ECO code, or the code itself when unknown.
pub fn opening_name(eco: &str) -> String {
    OPENINGS
        .iter()
        .find(|o| o.eco == eco)
        .map_or_else(|| eco.to_string(), Opening::full_name)
}
