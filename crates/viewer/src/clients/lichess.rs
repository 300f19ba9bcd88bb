use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use super::PlatformGame;
use crate::error::ImportError;

const LICHESS_API: &str = "https://lichess.org/api";

pub struct LichessClient {
    client: Client,
}

impl LichessClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetch the most recent `max_games` games of `username`.
    pub async fn fetch_user_games(
        &self,
        username: &str,
        max_games: usize,
    ) -> Result<Vec<PlatformGame>, ImportError> {
        let url = format!("{LICHESS_API}/games/user/{username}");
        let params = [
            ("max", max_games.to_string()),
            ("pgnInJson", "true".to_string()),
        ];

        let resp = self
            .client
            .get(&url)
            .query(&params)
            .header("Accept", "application/x-ndjson")
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ImportError::NotFound(format!("Lichess user {username}")));
        }
        if !resp.status().is_success() {
            return Err(ImportError::Status(resp.status()));
        }

        let text = resp.text().await?;
        let games = parse_lichess_ndjson(&text);
        tracing::info!(username, count = games.len(), "Fetched Lichess games");
        Ok(games)
    }
}

/// Decode a Lichess NDJSON export. Lines that are not JSON, or carry no PGN,
/// are skipped.
pub fn parse_lichess_ndjson(text: &str) -> Vec<PlatformGame> {
    let mut results = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let game: Value = match serde_json::from_str(line) {
            Ok(game) => game,
            Err(e) => {
                tracing::warn!("Failed to parse Lichess game JSON: {e}");
                continue;
            }
        };

        let Some(pgn) = game.get("pgn").and_then(Value::as_str).filter(|p| !p.is_empty()) else {
            continue;
        };

        let player = |color: &str| {
            game["players"][color]["user"]["name"]
                .as_str()
                .unwrap_or("Unknown")
                .to_string()
        };

        let result = match game.get("winner").and_then(Value::as_str) {
            Some("white") => "1-0",
            Some("black") => "0-1",
            _ => "1/2-1/2",
        };

        let date = game
            .get("createdAt")
            .and_then(Value::as_i64)
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        let time_control = match (
            game["clock"]["initial"].as_u64(),
            game["clock"]["increment"].as_u64(),
        ) {
            (Some(initial), Some(increment)) if initial > 0 => {
                Some(format!("{initial}+{increment}"))
            }
            _ => None,
        };

        results.push(PlatformGame {
            pgn: pgn.to_string(),
            white: player("white"),
            black: player("black"),
            result: result.to_string(),
            date,
            time_control,
            rated: game.get("rated").and_then(Value::as_bool),
        });
    }

    results
}
