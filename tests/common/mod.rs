#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use engine_session::uci::parse_line;
use engine_session::{EngineChannels, EngineCommand, EngineEndpoint};

/// Fischer vs Spassky, Belgrade 1992, game 29. 85 plies.
pub const FISCHER_SPASSKY: &str = r#"[Event "F/S Return Match"]
[Site "Belgrade, Serbia JUG"]
[Date "1992.11.04"]
[Round "29"]
[White "Fischer, Robert J."]
[Black "Spassky, Boris V."]
[Result "1/2-1/2"]

1. e4 e5 2. Nf3 Nc6 3. Bb5 {This opening is called the Ruy Lopez.} 3... a6
4. Ba4 Nf6 5. O-O Be7 6. Re1 b5 7. Bb3 d6 8. c3 O-O 9. h3 Nb8 10. d4 Nbd7
11. c4 c6 12. cxb5 axb5 13. Nc3 Bb7 14. Bg5 b4 15. Nb1 h6 16. Bh4 c5 17. dxe5
Nxe4 18. Bxe7 Qxe7 19. exd6 Qf6 20. Nbd2 Nxd6 21. Nc4 Nxc4 22. Bxc4 Nb6
23. Ne5 Rae8 24. Bxf7+ Rxf7 25. Nxf7 Rxe1+ 26. Qxe1 Kxf7 27. Qe3 Qg5 28. Qxg5
hxg5 29. b3 Ke6 30. a3 Kd6 31. axb4 cxb4 32. Ra5 Nd5 33. f3 Bc8 34. Kf2 Bf5
35. Ra7 g6 36. Ra6+ Kc5 37. Ke1 Nf4 38. g3 Nxh3 39. Kd2 Kb5 40. Rd6 Kc5 41. Ra6
Nf2 42. g4 Bd3 43. Re6 1/2-1/2
"#;

pub type CommandLog = Arc<Mutex<Vec<EngineCommand>>>;

/// In-process engine speaking the UCI line protocol over the channel seam.
///
/// Positions in `hold` search until told to `stop`; every other position
/// reports each depth up to the target and then `bestmove` straight away.
#[derive(Debug, Default, Clone)]
pub struct FakeEngine {
    pub best_moves: HashMap<String, String>,
    pub hold: HashSet<String>,
    /// Exit when the first `go` arrives.
    pub crash_on_go: bool,
    /// Never answer the handshake.
    pub silent: bool,
}

impl FakeEngine {
    pub fn with_move(mut self, fen: &str, best: &str) -> Self {
        self.best_moves.insert(fen.to_string(), best.to_string());
        self
    }

    pub fn holding(mut self, fen: &str) -> Self {
        self.hold.insert(fen.to_string());
        self
    }

    pub fn spawn(self) -> (EngineChannels, CommandLog) {
        let (channels, endpoint) = EngineChannels::pair();
        let log = CommandLog::default();
        tokio::spawn(self.run(endpoint, log.clone()));
        (channels, log)
    }

    fn best_move(&self, fen: &str) -> String {
        self.best_moves
            .get(fen)
            .cloned()
            .unwrap_or_else(|| "a2a3".to_string())
    }

    async fn run(self, mut endpoint: EngineEndpoint, log: CommandLog) {
        let mut fen = String::new();
        let mut searching: Option<String> = None;

        while let Some(cmd) = endpoint.commands.recv().await {
            log.lock().unwrap().push(cmd.clone());

            let mut reply = Vec::new();
            match cmd {
                EngineCommand::Uci if !self.silent => reply.push("uciok".to_string()),
                EngineCommand::IsReady if !self.silent => reply.push("readyok".to_string()),
                EngineCommand::PositionFen(f) => fen = f,
                EngineCommand::GoDepth(depth) => {
                    if self.crash_on_go {
                        return;
                    }
                    let mv = self.best_move(&fen);
                    if self.hold.contains(&fen) {
                        reply.push(format!("info depth 3 score cp 40 nodes 3000 pv {mv}"));
                        searching = Some(fen.clone());
                    } else {
                        for d in 1..=depth {
                            reply.push(format!(
                                "info depth {d} seldepth {d} score cp 50 nodes {} pv {mv}",
                                d * 1000
                            ));
                        }
                        reply.push(format!("bestmove {mv}"));
                    }
                }
                EngineCommand::Stop => {
                    // a stopped search still reports, late, for its own position
                    if let Some(held) = searching.take() {
                        let mv = self.best_move(&held);
                        reply.push(format!("info depth 30 score cp 999 nodes 1 pv {mv}"));
                        reply.push(format!("bestmove {mv}"));
                    }
                }
                EngineCommand::Quit => return,
                _ => {}
            }

            for line in reply {
                if endpoint.events.send(parse_line(&line)).is_err() {
                    return;
                }
            }
        }
    }
}

/// Commands sent to the engine, without the handshake.
pub fn search_commands(log: &CommandLog) -> Vec<EngineCommand> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|c| {
            matches!(
                c,
                EngineCommand::PositionFen(_) | EngineCommand::GoDepth(_) | EngineCommand::Stop
            )
        })
        .cloned()
        .collect()
}
