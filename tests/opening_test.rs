mod common;

use pgn_core::{identify_opening, opening_name, parse_pgn, OPENINGS};
use pgn_viewer::Document;

#[test]
fn test_fischer_spassky_is_ruy_lopez() {
    let game = parse_pgn(common::FISCHER_SPASSKY).unwrap().remove(0);
    let opening = identify_opening(&game.moves()[..10]).unwrap();
    assert_eq!(opening.eco, "C60");
    assert_eq!(opening.full_name(), "Ruy Lopez");

    let doc = Document::load(common::FISCHER_SPASSKY).unwrap();
    assert_eq!(doc.opening().unwrap().eco, "C60");
}

#[test]
fn test_deepest_line_wins() {
    let najdorf = [
        "e4", "c5", "Nf3", "d6", "d4", "cxd4", "Nxd4", "Nf6", "Nc3", "a6", "Be3",
    ];
    let opening = identify_opening(&najdorf).unwrap();
    assert_eq!(opening.full_name(), "Sicilian Defense: Najdorf");

    assert_eq!(identify_opening(&najdorf[..4]).unwrap().eco, "B50");
    assert_eq!(identify_opening(&najdorf[..2]).unwrap().eco, "B20");
}

#[test]
fn test_equal_length_lines_keep_table_order() {
    let dragon = [
        "e4", "c5", "Nf3", "d6", "d4", "cxd4", "Nxd4", "Nf6", "Nc3", "g6",
    ];
    assert_eq!(identify_opening(&dragon).unwrap().eco, "B54");
}

#[test]
fn test_every_named_line_identifies_itself_or_a_twin() {
    for opening in OPENINGS.iter().filter(|o| !o.moves.is_empty()) {
        let found = identify_opening(opening.moves).unwrap();
        assert_eq!(found.moves, opening.moves, "{}", opening.eco);
    }
}

#[test]
fn test_opening_name_lookup() {
    assert_eq!(opening_name("C60"), "Ruy Lopez");
    assert_eq!(opening_name("B90"), "Sicilian Defense: Najdorf");
    assert_eq!(opening_name("X00"), "X00");
}
