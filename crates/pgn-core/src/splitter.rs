//! Splits a multi-game PGN document into per-game text spans.

use std::sync::LazyLock;

use regex::Regex;

use crate::headers::{is_header_line, parse_headers};

static BLANK_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").expect("blank line pattern compiles"));

/// Split raw PGN text into candidate game spans.
///
/// Blocks are separated by blank lines. A block opens a new game only when it
/// starts with a tag pair and the game being accumulated already has move
/// text; otherwise it is glued onto the current game. This keeps headers that
/// wrap across blank lines together, but a tag-pair-looking line that starts a
/// block inside a multi-line comment will still open a new game.
pub fn split_games(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut games = Vec::new();
    let mut current = String::new();
    let mut current_has_moves = false;

    for block in BLANK_LINE_RE
        .split(&normalized)
        .map(str::trim)
        .filter(|b| !b.is_empty())
    {
        let starts_with_header = block.lines().next().is_some_and(is_header_line);

        if starts_with_header && current_has_moves {
            games.push(std::mem::take(&mut current));
            current_has_moves = false;
        }

        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(block);
        current_has_moves |= block_has_moves(block);
    }

    if !current.is_empty() {
        games.push(current);
    }

    games
}

fn block_has_moves(block: &str) -> bool {
    !parse_headers(block).move_lines.is_empty()
}
