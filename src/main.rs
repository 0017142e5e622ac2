use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

use lichess_export::config::{LichessConfig, DEFAULT_CONCURRENCY};
use lichess_export::converters::scid_converter::{ConversionError, PgnScidConverter};
use lichess_export::export::{run_export, Destination, ExportJob};
use lichess_export::output::create_temp_pgn_file;
use lichess_export::{GameSource, LichessClient};

/// Tool for exporting your Lichess games to Scid or PGN
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Your lichess id
    #[arg(short, long)]
    name: String,

    /// Output type
    #[arg(short = 't', long = "type", value_enum, default_value_t = Mode::Scid)]
    mode: Mode,

    /// Number of concurrent PGN downloads
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    threads: usize,

    /// Output filename (Scid base name for --type scid)
    #[arg(short, long, value_name = "FILE PATH")]
    output: PathBuf,

    /// Verbosity of logging
    #[arg(long, value_enum, default_value_t = Verbosity::Info)]
    logging: Verbosity,

    /// Keep the downloaded PGN next to the Scid base
    #[arg(long)]
    keep_pgn: bool,

    /// Path to the pgnscid binary, looked up in PATH when omitted
    #[arg(long, value_name = "FILE PATH")]
    pgnscid: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Pgn,
    Scid,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Verbosity {
    Off,
    Info,
    Debug,
}

impl Verbosity {
    fn directives(self) -> &'static str {
        match self {
            Verbosity::Off => "error",
            Verbosity::Info => "warn,lichess_export=info",
            Verbosity::Debug => "warn,lichess_export=debug",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.logging);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directives()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::new("%H:%M:%S".to_string()))
        .with_target(false)
        .init();
}

async fn run(args: Args) -> Result<()> {
    debug!(
        "Arguments: name - {}, type - {:?}, threads - {}, out - {}, logging - {:?}",
        args.name,
        args.mode,
        args.threads,
        args.output.display(),
        args.logging
    );

    let converter = match args.mode {
        Mode::Pgn => None,
        Mode::Scid => Some(match args.pgnscid.clone() {
            Some(path) => PgnScidConverter::new(path),
            None => PgnScidConverter::from_path().ok_or(ConversionError::ConverterNotFound)?,
        }),
    };
    let destination = match &converter {
        None => Destination::Pgn {
            output: args.output.clone(),
        },
        Some(converter) => Destination::Scid {
            base: args.output.clone(),
            converter,
            keep_pgn: args.keep_pgn,
        },
    };
    let job = ExportJob {
        user_name: args.name,
        concurrency: args.threads,
        destination,
    };

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let config = LichessConfig::default();
    let source: Arc<dyn GameSource> = Arc::new(LichessClient::new(config.clone()));

    let temp_pgn = create_temp_pgn_file().context("Unable to create temporary PGN file")?;
    debug!("Temp pgn filename: {}", temp_pgn.display());

    run_export(source, &config, job, &temp_pgn, &cancel).await?;
    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            warn!("Received Ctrl+C, stopping export");
            cancel.cancel();
        }
        Err(err) => warn!(error = %err, "Unable to listen for Ctrl+C"),
    }
}
