use std::path::Path;

use futures::{stream, StreamExt};
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::lichess_client::GameSource;
use crate::error::ScrapeError;
use crate::game::{Batch, GameId};

const GAME_SEPARATOR: &[u8] = b"\n\n";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    pub batches: usize,
    pub games: usize,
    pub bytes: u64,
}

/// Downloads the PGN of every game in `batches` and appends each one, followed by a
/// blank line, to `sink`.
///
/// Batches are handled one at a time in the order they arrive. Within a batch at most
/// `concurrency` downloads run at once and PGNs are written in completion order. The
/// first failed download aborts the whole run; in-flight requests are dropped with it.
pub async fn download_games<W>(
    source: &dyn GameSource,
    batches: &mut mpsc::Receiver<Batch>,
    sink: &mut W,
    concurrency: usize,
    cancel: &CancellationToken,
) -> Result<FetchSummary, ScrapeError>
where
    W: AsyncWrite + Unpin,
{
    if concurrency == 0 {
        return Err(ScrapeError::InvalidConcurrency);
    }

    let mut summary = FetchSummary::default();

    loop {
        let batch = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ScrapeError::Cancelled),
            batch = batches.recv() => batch,
        };
        let Some(batch) = batch else { break };

        debug!(page = batch.page, games = batch.len(), "Downloading batch");
        let mut pgns = stream::iter(batch)
            .map(|game_id| fetch_game(source, game_id))
            .buffer_unordered(concurrency);

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ScrapeError::Cancelled),
                next = pgns.next() => next,
            };
            let Some(result) = next else { break };

            let (game_id, pgn) = result?;

            info!("Downloaded {}", game_id);
            sink.write_all(pgn.as_bytes()).await?;
            sink.write_all(GAME_SEPARATOR).await?;
            summary.games += 1;
            summary.bytes += (pgn.len() + GAME_SEPARATOR.len()) as u64;
        }

        summary.batches += 1;
    }

    sink.flush().await?;
    Ok(summary)
}

/// Same as [`download_games`], writing to a file at `path` that is created or truncated
/// first. The file is flushed and closed on every exit path.
pub async fn download_games_to_file(
    source: &dyn GameSource,
    batches: &mut mpsc::Receiver<Batch>,
    path: &Path,
    concurrency: usize,
    cancel: &CancellationToken,
) -> Result<FetchSummary, ScrapeError> {
    let file = File::create(path).await?;
    let mut writer = BufWriter::new(file);

    let result = download_games(source, batches, &mut writer, concurrency, cancel).await;
    let flushed = writer.flush().await;

    let summary = result?;
    flushed?;
    info!("Downloaded {} games to {}", summary.games, path.display());
    Ok(summary)
}

async fn fetch_game(
    source: &dyn GameSource,
    game_id: GameId,
) -> Result<(GameId, String), ScrapeError> {
    match source.fetch_game_pgn(&game_id).await {
        Ok(pgn) => Ok((game_id, pgn)),
        Err(err) => Err(ScrapeError::ExportFailed {
            game_id,
            source: Box::new(err),
        }),
    }
}
