use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::LichessConfig;
use crate::error::ScrapeError;
use crate::scrapers::game_id_lister::{spawn_game_id_lister, ListingSummary};
use crate::scrapers::lichess_client::GameSource;
use crate::scrapers::pgn_fetcher::download_games_to_file;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub pages: u32,
    pub games_listed: usize,
    pub games_written: usize,
    pub bytes_written: u64,
}

/// Lists every game of `user_name` and writes their PGNs to `path`.
///
/// The listing runs on its own task and feeds the downloader page by page. Either side
/// failing stops the other: a download failure cancels the listing, and a listing
/// failure cancels the downloads still queued or in flight. The first real failure is
/// returned.
pub async fn export_games_to_file(
    source: Arc<dyn GameSource>,
    config: &LichessConfig,
    user_name: &str,
    path: &Path,
    concurrency: usize,
    cancel: &CancellationToken,
) -> Result<ExportSummary, ScrapeError> {
    let lister_cancel = cancel.child_token();
    let fetch_cancel = cancel.child_token();
    let (mut batches, mut lister) = spawn_game_id_lister(
        Arc::clone(&source),
        config.clone(),
        user_name.to_string(),
        lister_cancel.clone(),
    );

    let (fetched, listed) = {
        let fetch = download_games_to_file(
            source.as_ref(),
            &mut batches,
            path,
            concurrency,
            &fetch_cancel,
        );
        tokio::pin!(fetch);

        let mut listed = None;
        let fetched = tokio::select! {
            fetched = &mut fetch => Some(fetched),
            joined = &mut lister => {
                let result = flatten_join(joined);
                if result.is_err() {
                    debug!("Stopping downloads after game list failure");
                    fetch_cancel.cancel();
                }
                listed = Some(result);
                None
            }
        };
        let fetched = match fetched {
            Some(fetched) => fetched,
            None => fetch.await,
        };
        (fetched, listed)
    };

    if fetched.is_err() {
        debug!("Stopping game list after download failure");
        lister_cancel.cancel();
    }
    drop(batches);

    let listed = match listed {
        Some(listed) => listed,
        None => flatten_join(lister.await),
    };

    match (fetched, listed) {
        (Ok(fetched), Ok(listed)) => Ok(ExportSummary {
            pages: listed.pages,
            games_listed: listed.game_count,
            games_written: fetched.games,
            bytes_written: fetched.bytes,
        }),
        (Err(fetch_err), Err(list_err)) if list_err.is_cancelled() => Err(fetch_err),
        (_, Err(list_err)) => Err(list_err),
        (Err(fetch_err), Ok(_)) => Err(fetch_err),
    }
}

fn flatten_join(
    joined: Result<Result<ListingSummary, ScrapeError>, JoinError>,
) -> Result<ListingSummary, ScrapeError> {
    match joined {
        Ok(listed) => listed,
        Err(join_err) => Err(ScrapeError::ListerPanicked(join_err.to_string())),
    }
}
