use reqwest::StatusCode;
use thiserror::Error;

use crate::game::GameId;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Unexpected status {status} while fetching {url}")]
    UnexpectedStatus { url: String, status: StatusCode },

    #[error("Error sending request: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unable to parse game list page {page}: {source}")]
    InvalidPage {
        page: u32,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to export game {game_id}: {source}")]
    ExportFailed {
        game_id: GameId,
        #[source]
        source: Box<ScrapeError>,
    },

    #[error("Error writing PGN output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Concurrency limit must be at least 1")]
    InvalidConcurrency,

    #[error("Export cancelled")]
    Cancelled,

    #[error("Game list task stopped unexpectedly: {0}")]
    ListerPanicked(String),
}

impl ScrapeError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScrapeError::Cancelled)
    }
}
