use crate::game_state::chess_types::*;
use crate::moves::pawn_moves::pawn_attacks;

pub fn pawn_destinations(position: &Position, from: Square, color: Color) -> u64 {
    let board = &position.board;
    let mut targets = 0u64;

    if let Some(one) = from.offset(color.forward(), 0) {
        if board.is_empty(one) {
            targets |= one.mask();
            if from.rank() == color.pawn_home_rank() {
                if let Some(two) = one.offset(color.forward(), 0) {
                    if board.is_empty(two) {
                        targets |= two.mask();
                    }
                }
            }
        }
    }

    targets |= pawn_attacks(color, from) & board.occupancy_of(color.opposite());

    if let Some(target) = en_passant_destination(position, from, color) {
        targets |= target.mask();
    }

    targets
}

/// Rank a pawn must stand on to capture en passant.
#[inline]
pub const fn en_passant_rank(color: Color) -> u8 {
    match color {
        Color::White => 4,
        Color::Black => 3,
    }
}

/// En-passant target reachable by the pawn on `from`, if any.
pub fn en_passant_destination(position: &Position, from: Square, color: Color) -> Option<Square> {
    let target = position.state.en_passant_target?;
    if from.rank() != en_passant_rank(color) || pawn_attacks(color, from) & target.mask() == 0 {
        return None;
    }
    let victim = en_passant_victim(from, target)?;
    match position.board.piece_at(victim) {
        Some(piece) if piece.kind == PieceKind::Pawn && piece.color == color.opposite() => {
            Some(target)
        }
        _ => None,
    }
}

/// Square of the pawn removed by an en-passant capture: the mover's origin
/// rank on the destination file.
#[inline]
pub fn en_passant_victim(from: Square, to: Square) -> Option<Square> {
    Square::new(from.rank(), to.file())
}

/// True when `piece` moving `from -> to` is an en-passant capture in `position`.
pub fn is_en_passant(position: &Position, piece: Piece, from: Square, to: Square) -> bool {
    piece.kind == PieceKind::Pawn
        && from.file() != to.file()
        && position.board.is_empty(to)
        && position.state.en_passant_target == Some(to)
}
