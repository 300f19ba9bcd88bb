pub mod chess_com;
pub mod lichess;

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::config::ViewerConfig;
use crate::error::ImportError;

pub use chess_com::{parse_chess_com_games, ChessComClient};
pub use lichess::{parse_lichess_ndjson, LichessClient};

/// A game fetched from an online platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformGame {
    pub pgn: String,
    pub white: String,
    pub black: String,
    pub result: String,
    /// `YYYY-MM-DD`, empty when the platform gave no timestamp.
    pub date: String,
    pub time_control: Option<String>,
    pub rated: Option<bool>,
}

pub fn http_client(config: &ViewerConfig) -> Result<Client, ImportError> {
    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;
    Ok(client)
}

/// Download PGN text from an arbitrary URL.
pub async fn fetch_pgn(client: &Client, url: &str) -> Result<String, ImportError> {
    tracing::info!(url, "Fetching PGN");

    let resp = client.get(url).send().await?;

    if resp.status() == StatusCode::NOT_FOUND {
        return Err(ImportError::NotFound(url.to_string()));
    }
    if !resp.status().is_success() {
        return Err(ImportError::Status(resp.status()));
    }

    Ok(resp.text().await?)
}
