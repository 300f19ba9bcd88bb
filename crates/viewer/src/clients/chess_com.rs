use chrono::{DateTime, Datelike, Utc};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use super::PlatformGame;
use crate::error::ImportError;

const CHESS_COM_API: &str = "https://api.chess.com/pub";

/// Result codes Chess.com reports for a drawn game.
const DRAW_CODES: &[&str] = &[
    "agreed",
    "repetition",
    "stalemate",
    "insufficient",
    "50move",
    "timevsinsufficient",
];

pub struct ChessComClient {
    client: Client,
}

impl ChessComClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetch one monthly archive. Without a year and month the current
    /// month is used.
    pub async fn fetch_user_games(
        &self,
        username: &str,
        year: Option<i32>,
        month: Option<u32>,
    ) -> Result<Vec<PlatformGame>, ImportError> {
        let (year, month) = match (year, month) {
            (Some(year), Some(month)) => (year, month),
            _ => {
                let now = Utc::now();
                (now.year(), now.month())
            }
        };
        let url = format!("{CHESS_COM_API}/player/{username}/games/{year}/{month:02}");

        let resp = self.client.get(&url).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ImportError::NotFound(format!("Chess.com archive {url}")));
        }
        if !resp.status().is_success() {
            return Err(ImportError::Status(resp.status()));
        }

        let data: Value = serde_json::from_str(&resp.text().await?)?;
        let games = parse_chess_com_games(&data);
        tracing::info!(username, year, month, count = games.len(), "Fetched Chess.com games");
        Ok(games)
    }
}

/// Decode a monthly archive response. Entries without PGN are skipped.
pub fn parse_chess_com_games(data: &Value) -> Vec<PlatformGame> {
    let games = data["games"].as_array().cloned().unwrap_or_default();
    let mut results = Vec::new();

    for game in games {
        let Some(pgn) = game.get("pgn").and_then(Value::as_str) else {
            continue;
        };

        let username = |color: &str| {
            game[color]["username"]
                .as_str()
                .unwrap_or("Unknown")
                .to_string()
        };

        let date = game
            .get("end_time")
            .and_then(Value::as_i64)
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        results.push(PlatformGame {
            pgn: pgn.to_string(),
            white: username("white"),
            black: username("black"),
            result: game_result(
                game["white"]["result"].as_str(),
                game["black"]["result"].as_str(),
            )
            .to_string(),
            date,
            time_control: game
                .get("time_control")
                .and_then(Value::as_str)
                .map(String::from),
            rated: game.get("rated").and_then(Value::as_bool),
        });
    }

    results
}

fn game_result(white: Option<&str>, black: Option<&str>) -> &'static str {
    match (white, black) {
        (Some("win"), _) => "1-0",
        (_, Some("win")) => "0-1",
        (Some(code), _) if DRAW_CODES.contains(&code) => "1/2-1/2",
        _ => "*",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_archive() {
        let data: Value = serde_json::json!({
            "games": [
                {
                    "pgn": "[Event \"Live Chess\"]\n\n1. e4 e5 1-0",
                    "time_control": "600",
                    "end_time": 1700000000,
                    "rated": true,
                    "white": {"username": "hikaru", "result": "win"},
                    "black": {"username": "someone", "result": "resigned"}
                },
                {
                    "pgn": "1. d4 d5 1/2-1/2",
                    "white": {"username": "a", "result": "repetition"},
                    "black": {"username": "b", "result": "repetition"}
                },
                {
                    "white": {"username": "c", "result": "win"},
                    "black": {"username": "d", "result": "timeout"}
                }
            ]
        });

        let games = parse_chess_com_games(&data);
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].white, "hikaru");
        assert_eq!(games[0].result, "1-0");
        assert_eq!(games[0].date, "2023-11-14");
        assert_eq!(games[0].time_control.as_deref(), Some("600"));
        assert_eq!(games[1].result, "1/2-1/2");
        assert_eq!(games[1].rated, None);
    }

    #[test]
    fn test_game_result_codes() {
        assert_eq!(game_result(Some("checkmated"), Some("win")), "0-1");
        assert_eq!(game_result(Some("stalemate"), Some("stalemate")), "1/2-1/2");
        assert_eq!(game_result(Some("abandoned"), Some("abandoned")), "*");
        assert_eq!(game_result(None, None), "*");
    }

    #[test]
    fn test_missing_games_array() {
        assert!(parse_chess_com_games(&serde_json::json!({})).is_empty());
    }
}
