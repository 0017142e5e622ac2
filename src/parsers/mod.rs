pub mod lichess_game_list_parser;
