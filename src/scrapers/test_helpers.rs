//! In-memory [`GameSource`] used by the lister and fetcher unit tests.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::lichess_client::{GameSource, PageResponse};
use crate::error::ScrapeError;
use crate::game::{Batch, GameId};
use crate::parsers::lichess_game_list_parser::ParsedGameListPage;

pub(crate) fn page(number: u32, ids: &[&str], next_page: Option<u32>) -> PageResponse {
    PageResponse::Page(ParsedGameListPage {
        batch: batch(number, ids),
        next_page,
    })
}

pub(crate) fn batch(number: u32, ids: &[&str]) -> Batch {
    Batch {
        page: number,
        game_ids: ids.iter().map(|id| GameId::from(*id)).collect(),
    }
}

pub(crate) fn pgn_for(game_id: &str) -> String {
    format!("[PGN {game_id}]")
}

#[derive(Default)]
pub(crate) struct FakeSource {
    pages: Mutex<VecDeque<PageResponse>>,
    requested_pages: Mutex<Vec<u32>>,
    requested_games: Mutex<Vec<GameId>>,
    failing_games: HashSet<GameId>,
    pgn_delay: Option<Duration>,
    hang_on_pgn: bool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeSource {
    pub(crate) fn with_pages(pages: impl IntoIterator<Item = PageResponse>) -> Self {
        FakeSource {
            pages: Mutex::new(pages.into_iter().collect()),
            ..Default::default()
        }
    }

    pub(crate) fn pgn_delay(mut self, delay: Duration) -> Self {
        self.pgn_delay = Some(delay);
        self
    }

    pub(crate) fn failing_game(mut self, game_id: &str) -> Self {
        self.failing_games.insert(GameId::from(game_id));
        self
    }

    pub(crate) fn hang_on_pgn(mut self) -> Self {
        self.hang_on_pgn = true;
        self
    }

    pub(crate) fn requested_pages(&self) -> Vec<u32> {
        self.requested_pages.lock().unwrap().clone()
    }

    pub(crate) fn requested_games(&self) -> Vec<GameId> {
        self.requested_games.lock().unwrap().clone()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl GameSource for FakeSource {
    async fn fetch_game_list_page(
        &self,
        user_name: &str,
        page: u32,
    ) -> Result<PageResponse, ScrapeError> {
        self.requested_pages.lock().unwrap().push(page);
        let next = self.pages.lock().unwrap().pop_front();
        next.ok_or_else(|| ScrapeError::UnexpectedStatus {
            url: format!("fake://api/user/{user_name}/games?page={page}"),
            status: StatusCode::NOT_FOUND,
        })
    }

    async fn fetch_game_pgn(&self, game_id: &GameId) -> Result<String, ScrapeError> {
        self.requested_games.lock().unwrap().push(game_id.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if self.hang_on_pgn {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.pgn_delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_games.contains(game_id) {
            return Err(ScrapeError::UnexpectedStatus {
                url: format!("fake://game/export/{game_id}.pgn"),
                status: StatusCode::INTERNAL_SERVER_ERROR,
            });
        }
        Ok(pgn_for(game_id.as_str()))
    }
}
