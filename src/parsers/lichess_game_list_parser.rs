use crate::error::ScrapeError;
use crate::game::{Batch, GameId};

#[derive(Debug, serde::Deserialize, PartialEq)]
struct GameSummary {
    id: GameId,
}

#[derive(Debug, serde::Deserialize, PartialEq)]
struct GameListPage {
    #[serde(rename = "currentPageResults")]
    current_page_results: Vec<GameSummary>,
    #[serde(rename = "nextPage", default)]
    next_page: Option<u32>,
}

/// One decoded page of a user's game list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedGameListPage {
    pub batch: Batch,
    pub next_page: Option<u32>,
}

impl ParsedGameListPage {
    pub fn is_last(&self) -> bool {
        self.next_page.is_none()
    }
}

pub fn parse_game_list_page(page: u32, body: &str) -> Result<ParsedGameListPage, ScrapeError> {
    let parsed: GameListPage = serde_json::from_str(body)
        .map_err(|source| ScrapeError::InvalidPage { page, source })?;

    let game_ids = parsed
        .current_page_results
        .into_iter()
        .map(|game| game.id)
        .collect();

    Ok(ParsedGameListPage {
        batch: Batch { page, game_ids },
        next_page: parsed.next_page,
    })
}
