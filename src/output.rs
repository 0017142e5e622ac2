use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

const TEMP_PREFIX: &str = "lichess-export-";
const PGN_EXTENSION: &str = "pgn";

/// `output` itself when its file name already ends in `.pgn` (any case, dotfiles
/// included), otherwise `output.pgn`.
pub fn pgn_output_path(output: &Path) -> PathBuf {
    let has_pgn_extension = output
        .file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| {
            name.rsplit_once('.')
                .map(|(_, ext)| ext.eq_ignore_ascii_case(PGN_EXTENSION))
        })
        .unwrap_or(false);

    if has_pgn_extension {
        output.to_path_buf()
    } else {
        let mut name = OsString::from(output.as_os_str());
        name.push(".");
        name.push(PGN_EXTENSION);
        PathBuf::from(name)
    }
}

/// Creates an empty `.pgn` file in the system temp directory that outlives this
/// process, for the downloader to fill.
pub fn create_temp_pgn_file() -> io::Result<PathBuf> {
    let file = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(".pgn")
        .tempfile()?;
    file.into_temp_path().keep().map_err(|err| err.error)
}

/// Moves `from` to `to`, copying when a plain rename is not possible (for example
/// across filesystems).
pub async fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(err) => {
            debug!(error = %err, "Rename failed, copying {} instead", from.display());
            tokio::fs::copy(from, to).await?;
            tokio::fs::remove_file(from).await
        }
    }
}
