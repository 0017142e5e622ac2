use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::config::LichessConfig;
use crate::error::ScrapeError;
use crate::game::GameId;
use crate::parsers::lichess_game_list_parser::{parse_game_list_page, ParsedGameListPage};

/// Outcome of a single game list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageResponse {
    Page(ParsedGameListPage),
    RateLimited,
}

/// Where game lists and game PGNs come from.
#[async_trait]
pub trait GameSource: Send + Sync {
    async fn fetch_game_list_page(
        &self,
        user_name: &str,
        page: u32,
    ) -> Result<PageResponse, ScrapeError>;

    async fn fetch_game_pgn(&self, game_id: &GameId) -> Result<String, ScrapeError>;
}

pub struct LichessClient {
    client: Client,
    config: LichessConfig,
}

impl LichessClient {
    pub fn new(config: LichessConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: LichessConfig) -> Self {
        LichessClient { client, config }
    }

    pub fn config(&self) -> &LichessConfig {
        &self.config
    }
}

#[async_trait]
impl GameSource for LichessClient {
    async fn fetch_game_list_page(
        &self,
        user_name: &str,
        page: u32,
    ) -> Result<PageResponse, ScrapeError> {
        let url = self.config.games_list_url(user_name, page);
        let res = self.client.get(&url).send().await?;

        match res.status() {
            StatusCode::OK => {
                let body = res.text().await?;
                Ok(PageResponse::Page(parse_game_list_page(page, &body)?))
            }
            StatusCode::TOO_MANY_REQUESTS => Ok(PageResponse::RateLimited),
            status => Err(ScrapeError::UnexpectedStatus { url, status }),
        }
    }

    async fn fetch_game_pgn(&self, game_id: &GameId) -> Result<String, ScrapeError> {
        let url = self.config.game_pgn_url(game_id.as_str());
        let res = self.client.get(&url).send().await?;

        // Reading the body to the end hands the connection back to the pool;
        // an unread response is closed when it drops.
        match res.status() {
            StatusCode::OK => Ok(res.text().await?),
            status => Err(ScrapeError::UnexpectedStatus { url, status }),
        }
    }
}
