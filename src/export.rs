use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::LichessConfig;
use crate::converters::scid_converter::{create_scid_from_pgn, ensure_database_absent, Converter};
use crate::output::{move_file, pgn_output_path};
use crate::pipeline::export_games_to_file;
use crate::scrapers::lichess_client::GameSource;

/// Where the downloaded games end up.
pub enum Destination<'a> {
    /// A PGN file; `.pgn` is appended to `output` when missing.
    Pgn { output: PathBuf },
    /// A Scid base built by `converter`.
    Scid {
        base: PathBuf,
        converter: &'a dyn Converter,
        keep_pgn: bool,
    },
}

pub struct ExportJob<'a> {
    pub user_name: String,
    pub concurrency: usize,
    pub destination: Destination<'a>,
}

/// Downloads every game of the job's user into `temp_pgn`, then moves it to the PGN
/// destination or converts it into a Scid base. Returns the path of the final artifact.
///
/// A failed or cancelled download removes `temp_pgn`. A failed conversion leaves it in
/// place so the games are not lost.
pub async fn run_export(
    source: Arc<dyn GameSource>,
    config: &LichessConfig,
    job: ExportJob<'_>,
    temp_pgn: &Path,
    cancel: &CancellationToken,
) -> Result<PathBuf> {
    let user_name = job.user_name.to_lowercase();

    if job.concurrency == 0 {
        discard(temp_pgn).await;
        bail!("--threads must be at least 1");
    }
    if let Destination::Scid { base, .. } = &job.destination {
        if let Err(err) = ensure_database_absent(base) {
            discard(temp_pgn).await;
            return Err(err.into());
        }
    }

    let summary = match export_games_to_file(
        source,
        config,
        &user_name,
        temp_pgn,
        job.concurrency,
        cancel,
    )
    .await
    {
        Ok(summary) => summary,
        Err(err) => {
            discard(temp_pgn).await;
            return Err(err).with_context(|| format!("Unable to export games of {user_name}"));
        }
    };
    info!(
        "Exported {} of {} listed games ({} bytes)",
        summary.games_written, summary.games_listed, summary.bytes_written
    );

    match job.destination {
        Destination::Pgn { output } => {
            let destination = pgn_output_path(&output);
            move_file(temp_pgn, &destination)
                .await
                .with_context(|| format!("Unable to move PGN to {}", destination.display()))?;
            info!("Saved games to {}", destination.display());
            Ok(destination)
        }
        Destination::Scid {
            base,
            converter,
            keep_pgn,
        } => {
            if let Err(err) = create_scid_from_pgn(converter, temp_pgn, &base, keep_pgn).await {
                warn!("Downloaded games are still available in {}", temp_pgn.display());
                return Err(err.into());
            }
            info!("Saved games to scid base {}", base.display());
            if keep_pgn {
                info!("PGN kept at {}", temp_pgn.display());
            }
            Ok(base)
        }
    }
}

async fn discard(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        debug!(error = %err, "Unable to remove {}", path.display());
    }
}
