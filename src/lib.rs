//! Crate root module declarations for the Plum Board sensor chessboard core.
//!
//! Exposes the rules engine (board model, move generation, check oracle,
//! special moves, history and notation), the physical move acquisition state
//! machine, the external move-source request lifecycle, and the game session
//! that ties them together on a cooperative tick.

pub mod config;
pub mod errors;

pub mod game_state {
    pub mod board;
    pub mod chess_rules;
    pub mod chess_types;
    pub mod game_state;
    pub mod move_history;
}

pub mod moves {
    pub mod king_moves;
    pub mod knight_moves;
    pub mod pawn_moves;
    pub mod ray_moves;
}

pub mod move_generation {
    pub mod legal_move_apply;
    pub mod legal_move_checks;
    pub mod legal_move_generator;
    pub mod legal_moves_king;
    pub mod legal_moves_pawn;
    pub mod perft;
}

pub mod acquisition {
    pub mod board_io;
    pub mod indicator;
    pub mod move_acquisition;
    pub mod virtual_board;
}

pub mod engines {
    pub mod difficulty;
    pub mod engine_random;
    pub mod engine_request;
    pub mod engine_trait;
    pub mod response_parser;
}

pub mod session {
    pub mod game_session;
}

pub mod utils {
    pub mod algebraic;
    pub mod fen_generator;
    pub mod fen_parser;
    pub mod long_algebraic;
    pub mod pgn;
    pub mod render_game_state;
}
