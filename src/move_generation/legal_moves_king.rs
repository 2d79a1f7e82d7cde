//! King steps and castling.
//!
//! Castling is validated completely here (rights, home squares, empty path,
//! not in check, transit and landing squares safe), so the legality filter
//! accepts castling destinations without re-simulating them.

use crate::game_state::chess_rules::{CastleSide, KING_HOME_FILE};
use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_checks::{is_square_attacked, king_in_check};
use crate::moves::king_moves::king_attacks;

pub fn king_destinations(position: &Position, from: Square, color: Color) -> u64 {
    let own = position.board.occupancy_of(color);
    let mut targets = king_attacks(from) & !own;

    for side in CastleSide::BOTH {
        if castling_eligible(position, color, side) {
            if let Some(to) = castle_king_target(color, side) {
                if from.file() == KING_HOME_FILE && from.rank() == color.back_rank() {
                    targets |= to.mask();
                }
            }
        }
    }

    targets
}

#[inline]
pub fn castle_king_target(color: Color, side: CastleSide) -> Option<Square> {
    Square::new(color.back_rank(), side.king_target_file())
}

/// `(rook home, rook landing)` squares for a castle.
#[inline]
pub fn castle_rook_squares(color: Color, side: CastleSide) -> Option<(Square, Square)> {
    Some((
        Square::new(color.back_rank(), side.rook_home_file())?,
        Square::new(color.back_rank(), side.rook_target_file())?,
    ))
}

/// Which castle, if any, a king move `from -> to` is.
pub fn castle_side_of(piece: Piece, from: Square, to: Square) -> Option<CastleSide> {
    if piece.kind != PieceKind::King
        || from.rank() != piece.color.back_rank()
        || to.rank() != from.rank()
    {
        return None;
    }
    CastleSide::from_king_hop(from.file(), to.file())
}

pub fn castling_eligible(position: &Position, color: Color, side: CastleSide) -> bool {
    let board = &position.board;
    let back = color.back_rank();

    if !position.state.can_castle(color, side) {
        return false;
    }

    let (Some(king_sq), Some((rook_sq, transit))) = (
        Square::new(back, KING_HOME_FILE),
        castle_rook_squares(color, side),
    ) else {
        return false;
    };
    let Some(landing) = castle_king_target(color, side) else {
        return false;
    };

    if board.piece_at(king_sq) != Some(Piece::new(PieceKind::King, color))
        || board.piece_at(rook_sq) != Some(Piece::new(PieceKind::Rook, color))
    {
        return false;
    }

    let (lo, hi) = if rook_sq.file() < KING_HOME_FILE {
        (rook_sq.file() + 1, KING_HOME_FILE)
    } else {
        (KING_HOME_FILE + 1, rook_sq.file())
    };
    let path_clear = (lo..hi)
        .filter_map(|file| Square::new(back, file))
        .all(|sq| board.is_empty(sq));
    if !path_clear {
        return false;
    }

    let enemy = color.opposite();
    !king_in_check(board, color)
        && !is_square_attacked(board, transit, enemy)
        && !is_square_attacked(board, landing, enemy)
}
