use std::time::Duration;

pub const LICHESS_BASE_URL: &str = "https://en.lichess.org";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_RATE_LIMIT_SLEEP: Duration = Duration::from_secs(60);
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Settings shared by the listing walk and the per-game export requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LichessConfig {
    /// Scheme and host of the service, without a trailing slash.
    pub base_url: String,
    /// Number of game identifiers requested per listing page.
    pub page_size: u32,
    /// Fixed pause before re-requesting a page that was answered with 429.
    pub rate_limit_sleep: Duration,
}

impl Default for LichessConfig {
    fn default() -> Self {
        LichessConfig {
            base_url: LICHESS_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            rate_limit_sleep: DEFAULT_RATE_LIMIT_SLEEP,
        }
    }
}

impl LichessConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        LichessConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    pub fn games_list_url(&self, user_name: &str, page: u32) -> String {
        format!(
            "{}/api/user/{}/games?page={}&nb={}",
            self.base_url, user_name, page, self.page_size
        )
    }

    pub fn game_pgn_url(&self, game_id: &str) -> String {
        format!("{}/game/export/{}.pgn", self.base_url, game_id)
    }
}
