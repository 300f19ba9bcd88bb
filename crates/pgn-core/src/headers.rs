//! PGN tag-pair (`[Key "Value"]`) parsing and formatting.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PgnError;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\[(\w+)\s+"((?:[^"\\]|\\.)*)"\s*\]$"#).expect("header pattern compiles")
});

/// Keys emitted first, in this order, when re-serializing headers.
pub const CANONICAL_KEYS: [&str; 10] = [
    "Event", "Site", "Date", "Round", "White", "Black", "Result", "ECO", "WhiteElo", "BlackElo",
];

/// Ordered, case-sensitive header map. Keys are unique; insertion order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, String)>")]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert a header. A repeated key overwrites the value in place and
    /// returns the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

impl From<Vec<(String, String)>> for Headers {
    fn from(pairs: Vec<(String, String)>) -> Self {
        pairs.into_iter().collect()
    }
}

/// A block split into its leading header section and the move text after it.
#[derive(Debug, Clone, Default)]
pub struct HeaderSection<'a> {
    pub headers: Headers,
    /// Trimmed, non-empty lines after the header section.
    pub move_lines: Vec<&'a str>,
    /// Bracketed lines inside the header section that failed to parse.
    pub rejected: Vec<PgnError>,
}

/// True if `line` is a well-formed `[Key "Value"]` tag pair.
pub fn is_header_line(line: &str) -> bool {
    HEADER_RE.is_match(line.trim())
}

/// Parse a single tag pair line into its key and unescaped value.
pub fn parse_header_line(line: &str) -> Result<(String, String), PgnError> {
    let trimmed = line.trim();
    let cap = HEADER_RE
        .captures(trimmed)
        .ok_or_else(|| PgnError::InvalidHeaderSyntax {
            line: trimmed.to_string(),
        })?;
    Ok((cap[1].to_string(), unescape(&cap[2])))
}

/// Extract the header section of a block.
///
/// Headers accumulate until the first non-empty line that does not start with
/// `[`. From there on every line is move text, even if it looks like a header.
/// Bracketed lines inside the header section that don't parse are skipped.
pub fn parse_headers(block: &str) -> HeaderSection<'_> {
    let mut section = HeaderSection::default();
    let mut in_headers = true;

    for line in block.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if in_headers && line.starts_with('[') {
            match parse_header_line(line) {
                Ok((key, value)) => {
                    section.headers.insert(key, value);
                }
                Err(e) => {
                    debug!(error = %e, "Skipping header line");
                    section.rejected.push(e);
                }
            }
        } else {
            in_headers = false;
            section.move_lines.push(line);
        }
    }

    section
}

/// Render headers one per line, canonical keys first, then the rest in
/// their original order.
pub fn format_pgn_headers(headers: &Headers) -> String {
    let mut formatted = String::new();

    for key in CANONICAL_KEYS {
        if let Some(value) = headers.get(key) {
            push_header(&mut formatted, key, value);
        }
    }

    for (key, value) in headers.iter() {
        if !CANONICAL_KEYS.contains(&key) {
            push_header(&mut formatted, key, value);
        }
    }

    formatted
}

fn push_header(out: &mut String, key: &str, value: &str) {
    out.push('[');
    out.push_str(key);
    out.push_str(" \"");
    out.push_str(&escape(value));
    out.push_str("\"]\n");
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headers_basic() {
        let block = "[Event \"Casual\"]\n[White \"Player1\"]\n\n1. e4 e5 *";
        let section = parse_headers(block);
        assert_eq!(section.headers.get("Event"), Some("Casual"));
        assert_eq!(section.headers.get("White"), Some("Player1"));
        assert_eq!(section.move_lines, vec!["1. e4 e5 *"]);
        assert!(section.rejected.is_empty());
    }

    #[test]
    fn test_deserialize_keeps_keys_unique() {
        let json = r#"[["White","A"],["Black","B"],["White","C"]]"#;
        let headers: Headers = serde_json::from_str(json).unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("White"), Some("C"));
        assert_eq!(
            headers.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            vec!["White", "Black"]
        );
    }

    #[test]
    fn test_malformed_header_is_skipped() {
        let block = "[Event \"Casual\"]\n[Site \"Nowhere]\n[Black \"Player2\"]\n1. d4 *";
        let section = parse_headers(block);
        assert_eq!(section.headers.len(), 2);
        assert_eq!(section.headers.get("Black"), Some("Player2"));
        assert_eq!(section.rejected.len(), 1);
        assert!(matches!(
            &section.rejected[0],
            PgnError::InvalidHeaderSyntax { line } if line == "[Site \"Nowhere]"
        ));
    }

    #[test]
    fn test_header_looking_line_after_moves_is_move_text() {
        let block = "[White \"A\"]\n1. e4 {see\n[Note \"x\"]} e5 *";
        let section = parse_headers(block);
        assert_eq!(section.headers.len(), 1);
        assert_eq!(section.move_lines.len(), 2);
        assert_eq!(section.move_lines[1], "[Note \"x\"]} e5 *");
    }

    #[test]
    fn test_escaped_quotes_round_trip() {
        let (key, value) = parse_header_line(r#"[Annotator "The \"Bot\""]"#).unwrap();
        assert_eq!(key, "Annotator");
        assert_eq!(value, "The \"Bot\"");

        let headers: Headers = [(key, value)].into_iter().collect();
        assert_eq!(format_pgn_headers(&headers), "[Annotator \"The \\\"Bot\\\"\"]\n");
    }

    #[test]
    fn test_repeated_key_keeps_first_position() {
        let mut headers = Headers::new();
        headers.insert("White", "A");
        headers.insert("Black", "B");
        assert_eq!(headers.insert("White", "C"), Some("A".to_string()));
        let keys: Vec<&str> = headers.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["White", "Black"]);
        assert_eq!(headers.get("White"), Some("C"));
    }

    #[test]
    fn test_format_canonical_order_then_rest() {
        let headers: Headers = [
            ("TimeControl", "600"),
            ("Black", "B"),
            ("Event", "E"),
            ("Annotator", "X"),
            ("White", "W"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            format_pgn_headers(&headers),
            "[Event \"E\"]\n[White \"W\"]\n[Black \"B\"]\n[TimeControl \"600\"]\n[Annotator \"X\"]\n"
        );
    }
}
