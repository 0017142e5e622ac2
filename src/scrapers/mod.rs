pub mod game_id_lister;
pub mod lichess_client;
pub mod pgn_fetcher;

#[cfg(test)]
pub(crate) mod test_helpers;
