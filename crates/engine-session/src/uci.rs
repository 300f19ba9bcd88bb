//! UCI line protocol: commands we send and events we parse.

use std::fmt;

/// A command sent to the engine, rendered as one protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Uci,
    IsReady,
    SetOption { name: String, value: String },
    PositionFen(String),
    GoDepth(u32),
    Stop,
    Quit,
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineCommand::Uci => f.write_str("uci"),
            EngineCommand::IsReady => f.write_str("isready"),
            EngineCommand::SetOption { name, value } => {
                write!(f, "setoption name {name} value {value}")
            }
            EngineCommand::PositionFen(fen) => write!(f, "position fen {fen}"),
            EngineCommand::GoDepth(depth) => write!(f, "go depth {depth}"),
            EngineCommand::Stop => f.write_str("stop"),
            EngineCommand::Quit => f.write_str("quit"),
        }
    }
}

/// Engine score from the side to move's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    /// Mate in N moves; negative when the side to move gets mated.
    Mate(i32),
}

/// Fields of an `info` line we care about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoLine {
    pub depth: Option<u32>,
    pub multipv: Option<u32>,
    pub score: Option<Score>,
    pub nodes: Option<u64>,
    pub pv: Vec<String>,
}

/// A line received from the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    UciOk,
    ReadyOk,
    Info(InfoLine),
    /// `best` is `None` for `bestmove (none)`.
    BestMove {
        best: Option<String>,
        ponder: Option<String>,
    },
    Other(String),
}

/// Parse one line of engine output.
pub fn parse_line(line: &str) -> EngineEvent {
    let trimmed = line.trim();
    let mut parts = trimmed.split_whitespace();

    match parts.next() {
        Some("uciok") => EngineEvent::UciOk,
        Some("readyok") => EngineEvent::ReadyOk,
        Some("info") if !trimmed.starts_with("info string") => {
            EngineEvent::Info(parse_info(trimmed))
        }
        Some("bestmove") => {
            let best = parts
                .next()
                .filter(|m| *m != "(none)" && *m != "0000")
                .map(String::from);
            let ponder = match parts.next() {
                Some("ponder") => parts.next().map(String::from),
                _ => None,
            };
            EngineEvent::BestMove { best, ponder }
        }
        _ => EngineEvent::Other(trimmed.to_string()),
    }
}

/// Parse the fields of an `info` line.
pub fn parse_info(line: &str) -> InfoLine {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let mut info = InfoLine::default();
    let mut i = 1; // skip "info"

    while i < parts.len() {
        match parts[i] {
            "depth" => {
                info.depth = parts.get(i + 1).and_then(|v| v.parse().ok());
                i += 2;
            }
            "multipv" => {
                info.multipv = parts.get(i + 1).and_then(|v| v.parse().ok());
                i += 2;
            }
            "nodes" => {
                info.nodes = parts.get(i + 1).and_then(|v| v.parse().ok());
                i += 2;
            }
            "score" => {
                let value = parts.get(i + 2).and_then(|v| v.parse::<i32>().ok());
                info.score = match (parts.get(i + 1).copied(), value) {
                    (Some("cp"), Some(cp)) => Some(Score::Centipawns(cp)),
                    (Some("mate"), Some(mate)) => Some(Score::Mate(mate)),
                    _ => info.score,
                };
                i += 3;
                if matches!(parts.get(i).copied(), Some("lowerbound") | Some("upperbound")) {
                    i += 1;
                }
            }
            "pv" => {
                // PV runs to the end of the line unless a trailing keyword follows
                info.pv = parts[i + 1..]
                    .iter()
                    .take_while(|p| **p != "string" && !p.starts_with("bmc"))
                    .map(|p| p.to_string())
                    .collect();
                break;
            }
            "string" => break,
            "seldepth" | "time" | "nps" | "hashfull" | "tbhits" | "sbhits" | "cpuload"
            | "currmove" | "currmovenumber" => {
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cp() {
        let info =
            parse_info("info depth 20 seldepth 25 multipv 1 score cp 35 nodes 100000 pv e2e4");
        assert_eq!(info.depth, Some(20));
        assert_eq!(info.multipv, Some(1));
        assert_eq!(info.score, Some(Score::Centipawns(35)));
        assert_eq!(info.nodes, Some(100_000));
        assert_eq!(info.pv, vec!["e2e4"]);
    }

    #[test]
    fn test_parse_mate() {
        let info = parse_info("info depth 20 score mate -3 nodes 100000 pv e2e4");
        assert_eq!(info.score, Some(Score::Mate(-3)));
    }

    #[test]
    fn test_parse_bound_and_pv() {
        let info = parse_info(
            "info depth 14 score cp -12 upperbound nodes 52011 nps 900000 time 57 pv d7d5 c2c4 e7e6",
        );
        assert_eq!(info.score, Some(Score::Centipawns(-12)));
        assert_eq!(info.nodes, Some(52_011));
        assert_eq!(info.pv, vec!["d7d5", "c2c4", "e7e6"]);
    }

    #[test]
    fn test_parse_currmove_line() {
        let info = parse_info("info depth 9 currmove g1f3 currmovenumber 2");
        assert_eq!(info.depth, Some(9));
        assert_eq!(info.score, None);
        assert!(info.pv.is_empty());
    }

    #[test]
    fn test_parse_events() {
        assert_eq!(parse_line("uciok"), EngineEvent::UciOk);
        assert_eq!(parse_line("readyok\n"), EngineEvent::ReadyOk);
        assert_eq!(
            parse_line("bestmove e2e4 ponder e7e5"),
            EngineEvent::BestMove {
                best: Some("e2e4".into()),
                ponder: Some("e7e5".into()),
            }
        );
        assert_eq!(
            parse_line("bestmove (none)"),
            EngineEvent::BestMove {
                best: None,
                ponder: None,
            }
        );
        assert!(matches!(
            parse_line("info string NNUE evaluation enabled"),
            EngineEvent::Other(_)
        ));
        assert!(matches!(parse_line("id name Stockfish 16"), EngineEvent::Other(_)));
    }

    #[test]
    fn test_command_lines() {
        assert_eq!(EngineCommand::GoDepth(18).to_string(), "go depth 18");
        assert_eq!(
            EngineCommand::SetOption {
                name: "Hash".into(),
                value: "64".into(),
            }
            .to_string(),
            "setoption name Hash value 64"
        );
        assert_eq!(
            EngineCommand::PositionFen("8/8/8/8/8/8/8/K1k5 w - - 0 1".into()).to_string(),
            "position fen 8/8/8/8/8/8/8/K1k5 w - - 0 1"
        );
    }
}
