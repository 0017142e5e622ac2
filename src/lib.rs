pub mod config;
pub mod converters;
pub mod error;
pub mod export;
pub mod game;
pub mod output;
pub mod parsers;
pub mod pipeline;
pub mod scrapers;

pub use config::LichessConfig;
pub use error::ScrapeError;
pub use game::{Batch, GameId};
pub use pipeline::{export_games_to_file, ExportSummary};
pub use scrapers::lichess_client::{GameSource, LichessClient};
