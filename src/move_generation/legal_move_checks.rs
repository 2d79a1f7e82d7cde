//! Check oracle: attack detection, king location, and legality simulation.
//!
//! Attacks are computed from dedicated attack sets (pawn diagonals, knight and
//! king tables, sliding rays) so that pawn pushes never count as attacks and
//! castling never recurses into itself.

use crate::game_state::board::Board;
use crate::game_state::chess_types::*;
use crate::moves::king_moves::king_attacks;
use crate::moves::knight_moves::knight_attacks;
use crate::moves::pawn_moves::pawn_attacks;
use crate::moves::ray_moves::{bishop_attacks, rook_attacks};

#[inline]
pub fn king_square(board: &Board, color: Color) -> Option<Square> {
    board.king_square(color)
}

/// A colour with no king on the board is never in check.
#[inline]
pub fn king_in_check(board: &Board, color: Color) -> bool {
    let Some(king_sq) = king_square(board, color) else {
        return false;
    };
    is_square_attacked(board, king_sq, color.opposite())
}

/// Stops at the first attacker found.
pub fn is_square_attacked(board: &Board, square: Square, by_color: Color) -> bool {
    let sources = AttackSources::toward(board, square, by_color);
    board
        .pieces_of(by_color)
        .any(|(from, piece)| sources.reaches(from, piece.kind))
}

/// Squares from which each piece kind would hit a target square.
struct AttackSources {
    pawn: u64,
    knight: u64,
    king: u64,
    diagonal: u64,
    straight: u64,
}

impl AttackSources {
    fn toward(board: &Board, square: Square, by_color: Color) -> Self {
        let occupancy = board.occupancy();
        // A pawn of `by_color` attacks `square` iff a pawn of the other colour on
        // `square` would attack it back.
        Self {
            pawn: pawn_attacks(by_color.opposite(), square),
            knight: knight_attacks(square),
            king: king_attacks(square),
            diagonal: bishop_attacks(square, occupancy),
            straight: rook_attacks(square, occupancy),
        }
    }

    #[inline]
    fn reaches(&self, from: Square, kind: PieceKind) -> bool {
        let bit = from.mask();
        let sources = match kind {
            PieceKind::Pawn => self.pawn,
            PieceKind::Knight => self.knight,
            PieceKind::King => self.king,
            PieceKind::Bishop => self.diagonal,
            PieceKind::Rook => self.straight,
            PieceKind::Queen => self.diagonal | self.straight,
        };
        sources & bit != 0
    }
}

/// Play `from -> to` on a scratch copy of `board` (removing an en-passant
/// victim from its real square when given) and report whether the mover's
/// king is left attacked.
pub fn leaves_king_in_check(
    board: &Board,
    from: Square,
    to: Square,
    en_passant_victim: Option<Square>,
) -> bool {
    let Some(piece) = board.piece_at(from) else {
        return false;
    };
    let mut scratch = *board;
    if let Some(victim) = en_passant_victim {
        scratch.set(victim, None);
    }
    scratch.set(from, None);
    scratch.set(to, Some(piece));
    king_in_check(&scratch, piece.color)
}

#[cfg(test)]
mod tests {
    use super::{is_square_attacked, king_in_check, leaves_king_in_check};
    use crate::game_state::chess_types::Color;
    use crate::utils::algebraic::algebraic_to_square;
    use crate::utils::fen_parser::parse_fen;

    #[test]
    fn starting_position_has_no_checks() {
        let position = crate::game_state::chess_types::Position::new_game();
        assert!(!king_in_check(&position.board, Color::White));
        assert!(!king_in_check(&position.board, Color::Black));
    }

    #[test]
    fn pawn_pushes_are_not_attacks() {
        let position = parse_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").expect("FEN should parse");
        let e3 = algebraic_to_square("e3").expect("square");
        let d3 = algebraic_to_square("d3").expect("square");
        assert!(!is_square_attacked(&position.board, e3, Color::White));
        assert!(is_square_attacked(&position.board, d3, Color::White));
    }

    #[test]
    fn each_attacker_kind_is_found_on_its_own() {
        for fen in [
            "4k3/8/8/8/1b6/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/5n2/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/r3K3 w - - 0 1",
            "4k3/8/8/8/8/8/3p4/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/3qK3 w - - 0 1",
        ] {
            let position = parse_fen(fen).expect("FEN should parse");
            assert!(king_in_check(&position.board, Color::White), "expected check in {fen}");
        }
    }

    #[test]
    fn blocked_slider_does_not_attack() {
        let position =
            parse_fen("4k3/8/8/8/1b6/8/3P4/r1N1K3 w - - 0 1").expect("FEN should parse");
        assert!(!king_in_check(&position.board, Color::White));
        let b1 = algebraic_to_square("b1").expect("square");
        assert!(is_square_attacked(&position.board, b1, Color::Black));
    }

    #[test]
    fn pinned_piece_move_leaves_king_in_check() {
        let position = parse_fen("4k3/4r3/8/8/8/8/4N3/4K3 w - - 0 1").expect("FEN should parse");
        let e2 = algebraic_to_square("e2").expect("square");
        let c3 = algebraic_to_square("c3").expect("square");
        assert!(leaves_king_in_check(&position.board, e2, c3, None));
    }
}
