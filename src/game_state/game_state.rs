//! Side-to-move, castling, en-passant, and clock bookkeeping, plus the
//! `Position` pair (board + state) every rules query takes.
//!
//! Castling flags only ever move from `true` to `false`; `revoke_castling` is
//! the single writer. The en-passant target is set only by a two-square pawn
//! advance and cleared by everything else (see `legal_move_apply`).

use crate::errors::ChessResult;
use crate::game_state::board::Board;
use crate::game_state::chess_rules::{CastleSide, STARTING_POSITION_FEN};
use crate::game_state::chess_types::*;
use crate::utils::fen_generator::generate_fen;
use crate::utils::fen_parser::parse_fen;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
    pub en_passant_target: Option<Square>,
    pub turn: Color,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
            en_passant_target: None,
            turn: Color::White,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }
}

impl GameState {
    #[inline]
    pub fn can_castle(&self, color: Color, side: CastleSide) -> bool {
        match (color, side) {
            (Color::White, CastleSide::Kingside) => self.white_kingside,
            (Color::White, CastleSide::Queenside) => self.white_queenside,
            (Color::Black, CastleSide::Kingside) => self.black_kingside,
            (Color::Black, CastleSide::Queenside) => self.black_queenside,
        }
    }

    #[inline]
    pub fn revoke_castling(&mut self, color: Color, side: CastleSide) {
        match (color, side) {
            (Color::White, CastleSide::Kingside) => self.white_kingside = false,
            (Color::White, CastleSide::Queenside) => self.white_queenside = false,
            (Color::Black, CastleSide::Kingside) => self.black_kingside = false,
            (Color::Black, CastleSide::Queenside) => self.black_queenside = false,
        }
    }

    pub fn any_castling(&self) -> bool {
        self.white_kingside || self.white_queenside || self.black_kingside || self.black_queenside
    }
}

/// A board together with the state it must be interpreted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub board: Board,
    pub state: GameState,
}

impl Default for Position {
    fn default() -> Self {
        Self::new_game()
    }
}

impl Position {
    #[inline]
    pub fn new_game() -> Self {
        Self {
            board: Board::starting_position(),
            state: GameState::default(),
        }
    }

    #[inline]
    pub fn from_fen(fen: &str) -> ChessResult<Self> {
        parse_fen(fen)
    }

    #[inline]
    pub fn get_fen(&self) -> String {
        generate_fen(self)
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.state.turn
    }

    pub fn is_starting_position(&self) -> bool {
        self.get_fen() == STARTING_POSITION_FEN
    }
}
