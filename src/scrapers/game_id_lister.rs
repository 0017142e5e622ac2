use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::lichess_client::{GameSource, PageResponse};
use crate::config::LichessConfig;
use crate::error::ScrapeError;
use crate::game::Batch;

/// Pages buffered between the lister and its consumer.
const BATCH_CHANNEL_CAPACITY: usize = 1;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListingSummary {
    pub pages: u32,
    pub game_count: usize,
}

/// Walks a user's game list page by page and pushes one [`Batch`] per page into `tx`.
///
/// A 429 answer is retried for the same page after `config.rate_limit_sleep`, with no
/// limit on the number of attempts. Any other failure ends the walk with an error.
/// If the receiving side goes away the walk stops early and reports what it sent.
pub async fn list_game_ids(
    source: &dyn GameSource,
    config: &LichessConfig,
    user_name: &str,
    tx: mpsc::Sender<Batch>,
    cancel: &CancellationToken,
) -> Result<ListingSummary, ScrapeError> {
    let mut summary = ListingSummary::default();
    let mut page = 1;

    loop {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ScrapeError::Cancelled),
            response = source.fetch_game_list_page(user_name, page) => response?,
        };

        let parsed = match response {
            PageResponse::RateLimited => {
                debug!(
                    page,
                    "Rate limited while listing games. Retrying in {:?}", config.rate_limit_sleep
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ScrapeError::Cancelled),
                    _ = sleep(config.rate_limit_sleep) => {}
                }
                continue;
            }
            PageResponse::Page(parsed) => parsed,
        };

        info!(page, games = parsed.batch.len(), "New page with game identifiers");
        summary.pages += 1;
        summary.game_count += parsed.batch.len();
        let is_last = parsed.is_last();

        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ScrapeError::Cancelled),
            sent = tx.send(parsed.batch) => sent,
        };
        if sent.is_err() {
            debug!(page, "Game list consumer went away, stopping");
            break;
        }

        if is_last {
            debug!(page, "Last page");
            break;
        }
        page += 1;
    }

    info!("Downloaded {} game identifiers", summary.game_count);
    Ok(summary)
}

/// Runs [`list_game_ids`] on its own task and hands back the receiving end of the
/// batch channel. The channel is bounded so the walk stays close to the consumer.
pub fn spawn_game_id_lister(
    source: Arc<dyn GameSource>,
    config: LichessConfig,
    user_name: String,
    cancel: CancellationToken,
) -> (
    mpsc::Receiver<Batch>,
    JoinHandle<Result<ListingSummary, ScrapeError>>,
) {
    let (tx, rx) = mpsc::channel(BATCH_CHANNEL_CAPACITY);
    let handle = tokio::spawn(async move {
        list_game_ids(source.as_ref(), &config, &user_name, tx, &cancel).await
    });
    (rx, handle)
}
