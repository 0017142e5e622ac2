use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Files that make up a Scid base, named `<base>.<ext>`.
pub const SCID_EXTENSIONS: [&str; 3] = ["si4", "sg4", "sn4"];

pub const PGNSCID_BINARY: &str = "pgnscid";

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Scid base {base:?} already exists ({files:?})")]
    DatabaseExists { base: PathBuf, files: Vec<PathBuf> },

    #[error("Unable to find pgnscid in PATH")]
    ConverterNotFound,

    #[error("Failed to execute {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{program:?} exited with {status}")]
    Failed { program: PathBuf, status: ExitStatus },

    #[error("Failed to remove PGN file {path:?}: {source}")]
    RemoveSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Turns a finished PGN file into a database next to `output_base`.
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert(&self, input: &Path, output_base: &Path) -> Result<(), ConversionError>;
}

/// Runs `pgnscid -f <input> <output_base>`.
pub struct PgnScidConverter {
    binary_path: PathBuf,
}

impl PgnScidConverter {
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Looks `pgnscid` up in `PATH`.
    pub fn from_path() -> Option<Self> {
        which::which(PGNSCID_BINARY).ok().map(Self::new)
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}

#[async_trait]
impl Converter for PgnScidConverter {
    async fn convert(&self, input: &Path, output_base: &Path) -> Result<(), ConversionError> {
        debug!(
            "Executing: {} -f {:?} {:?}",
            self.binary_path.display(),
            input,
            output_base
        );

        let status = Command::new(&self.binary_path)
            .arg("-f") // overwrite
            .arg(input)
            .arg(output_base)
            .status()
            .await
            .map_err(|source| ConversionError::Spawn {
                program: self.binary_path.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ConversionError::Failed {
                program: self.binary_path.clone(),
                status,
            })
        }
    }
}

/// `<base>.si4`, `<base>.sg4` and `<base>.sn4`, in that order.
pub fn database_files(base: &Path) -> Vec<PathBuf> {
    SCID_EXTENSIONS
        .iter()
        .map(|ext| {
            let mut name = OsString::from(base.as_os_str());
            name.push(".");
            name.push(ext);
            PathBuf::from(name)
        })
        .collect()
}

pub fn existing_database_files(base: &Path) -> Vec<PathBuf> {
    database_files(base)
        .into_iter()
        .filter(|path| path.is_file())
        .collect()
}

pub fn ensure_database_absent(base: &Path) -> Result<(), ConversionError> {
    let files = existing_database_files(base);
    if files.is_empty() {
        Ok(())
    } else {
        warn!("Scid base already exists: {}", base.display());
        Err(ConversionError::DatabaseExists {
            base: base.to_path_buf(),
            files,
        })
    }
}

/// Converts `pgn_path` into a Scid base at `scid_base`, refusing to touch an existing
/// base. The PGN file is removed after a successful conversion unless `keep_pgn` is set;
/// on any failure it is left where it is.
pub async fn create_scid_from_pgn(
    converter: &dyn Converter,
    pgn_path: &Path,
    scid_base: &Path,
    keep_pgn: bool,
) -> Result<(), ConversionError> {
    debug!("Saving to scid base: {}", scid_base.display());
    ensure_database_absent(scid_base)?;

    converter.convert(pgn_path, scid_base).await?;

    if !keep_pgn {
        debug!("Removing old file: {}", pgn_path.display());
        tokio::fs::remove_file(pgn_path)
            .await
            .map_err(|source| ConversionError::RemoveSource {
                path: pgn_path.to_path_buf(),
                source,
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingConverter {
        calls: Mutex<Vec<(PathBuf, PathBuf)>>,
        fail: bool,
    }

    #[async_trait]
    impl Converter for RecordingConverter {
        async fn convert(&self, input: &Path, output_base: &Path) -> Result<(), ConversionError> {
            self.calls
                .lock()
                .unwrap()
                .push((input.to_path_buf(), output_base.to_path_buf()));
            if self.fail {
                return Err(ConversionError::ConverterNotFound);
            }
            Ok(())
        }
    }

    fn write_pgn(dir: &Path) -> PathBuf {
        let pgn = dir.join("games.pgn");
        std::fs::write(&pgn, "[PGN g1]\n\n").unwrap();
        pgn
    }

    #[test]
    fn database_files_append_extensions() {
        let files = database_files(Path::new("/tmp/my.games"));
        assert_eq!(
            files,
            vec![
                PathBuf::from("/tmp/my.games.si4"),
                PathBuf::from("/tmp/my.games.sg4"),
                PathBuf::from("/tmp/my.games.sn4"),
            ]
        );
    }

    #[tokio::test]
    async fn existing_base_aborts_before_converting() {
        let dir = tempfile::tempdir().unwrap();
        let pgn = write_pgn(dir.path());
        let base = dir.path().join("out");
        std::fs::write(dir.path().join("out.si4"), b"").unwrap();

        let converter = RecordingConverter::default();
        let err = create_scid_from_pgn(&converter, &pgn, &base, false)
            .await
            .unwrap_err();

        match err {
            ConversionError::DatabaseExists { files, .. } => {
                assert_eq!(files, vec![dir.path().join("out.si4")])
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(converter.calls.lock().unwrap().is_empty());
        assert!(pgn.exists());
    }

    #[tokio::test]
    async fn any_base_file_counts_as_existing() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("out");
        assert!(ensure_database_absent(&base).is_ok());

        std::fs::write(dir.path().join("out.sn4"), b"").unwrap();
        assert!(matches!(
            ensure_database_absent(&base),
            Err(ConversionError::DatabaseExists { .. })
        ));
    }

    #[tokio::test]
    async fn successful_conversion_removes_pgn() {
        let dir = tempfile::tempdir().unwrap();
        let pgn = write_pgn(dir.path());
        let base = dir.path().join("out");

        let converter = RecordingConverter::default();
        create_scid_from_pgn(&converter, &pgn, &base, false)
            .await
            .unwrap();

        assert_eq!(
            converter.calls.lock().unwrap().as_slice(),
            &[(pgn.clone(), base.clone())]
        );
        assert!(!pgn.exists());
    }

    #[tokio::test]
    async fn keep_pgn_retains_source() {
        let dir = tempfile::tempdir().unwrap();
        let pgn = write_pgn(dir.path());

        let converter = RecordingConverter::default();
        create_scid_from_pgn(&converter, &pgn, &dir.path().join("out"), true)
            .await
            .unwrap();
        assert!(pgn.exists());
    }

    #[tokio::test]
    async fn failed_conversion_keeps_pgn() {
        let dir = tempfile::tempdir().unwrap();
        let pgn = write_pgn(dir.path());

        let converter = RecordingConverter {
            fail: true,
            ..Default::default()
        };
        let result = create_scid_from_pgn(&converter, &pgn, &dir.path().join("out"), false).await;
        assert!(result.is_err());
        assert!(pgn.exists());
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let converter = PgnScidConverter::new(PathBuf::from("/nonexistent/pgnscid-xyz"));
        let err = converter
            .convert(Path::new("in.pgn"), Path::new("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_a_failure() {
        let Ok(false_binary) = which::which("false") else {
            return;
        };
        let converter = PgnScidConverter::new(false_binary);
        let err = converter
            .convert(Path::new("in.pgn"), Path::new("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::Failed { .. }));
    }
}
