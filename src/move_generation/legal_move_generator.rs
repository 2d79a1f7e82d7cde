//! Pseudo-legal destination sets, the legality filter, and position
//! classification.

use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_checks::{king_in_check, leaves_king_in_check};
use crate::move_generation::legal_moves_king::{castle_side_of, king_destinations};
use crate::move_generation::legal_moves_pawn::{
    en_passant_victim, is_en_passant, pawn_destinations,
};
use crate::moves::knight_moves::knight_attacks;
use crate::moves::ray_moves::{bishop_attacks, queen_attacks, rook_attacks};

/// Pseudo-legal destinations for whatever stands on `from` (empty mask if
/// nothing does). Never includes a square held by the mover's own colour.
pub fn pseudo_legal_destinations(position: &Position, from: Square) -> u64 {
    let Some(piece) = position.board.piece_at(from) else {
        return 0;
    };
    let own = position.board.occupancy_of(piece.color);
    let occupancy = position.board.occupancy();

    match piece.kind {
        PieceKind::Pawn => pawn_destinations(position, from, piece.color),
        PieceKind::Knight => knight_attacks(from) & !own,
        PieceKind::Bishop => bishop_attacks(from, occupancy) & !own,
        PieceKind::Rook => rook_attacks(from, occupancy) & !own,
        PieceKind::Queen => queen_attacks(from, occupancy) & !own,
        PieceKind::King => king_destinations(position, from, piece.color),
    }
}

/// Pseudo-legal destinations that do not leave the mover's king attacked.
pub fn legal_destinations(position: &Position, from: Square) -> u64 {
    let Some(piece) = position.board.piece_at(from) else {
        return 0;
    };

    Square::iter_mask(pseudo_legal_destinations(position, from))
        .filter(|&to| {
            if castle_side_of(piece, from, to).is_some() {
                return true;
            }
            let victim = if is_en_passant(position, piece, from, to) {
                en_passant_victim(from, to)
            } else {
                None
            };
            !leaves_king_in_check(&position.board, from, to, victim)
        })
        .fold(0u64, |acc, to| acc | to.mask())
}

/// Build the `Move` for `from -> to`, filling in the automatic queen promotion.
pub fn move_for(position: &Position, from: Square, to: Square) -> Move {
    match position.board.piece_at(from) {
        Some(piece)
            if piece.kind == PieceKind::Pawn && to.rank() == piece.color.promotion_rank() =>
        {
            Move::with_promotion(from, to, PieceKind::Queen)
        }
        _ => Move::new(from, to),
    }
}

/// Every legal move for the side to move, in scan order of origin then destination.
pub fn legal_moves(position: &Position) -> Vec<Move> {
    let side = position.side_to_move();
    let mut moves = Vec::with_capacity(64);
    for (from, _) in position.board.pieces_of(side) {
        for to in Square::iter_mask(legal_destinations(position, from)) {
            moves.push(move_for(position, from, to));
        }
    }
    moves
}

pub fn has_legal_move(position: &Position) -> bool {
    let side = position.side_to_move();
    position
        .board
        .pieces_of(side)
        .any(|(from, _)| legal_destinations(position, from) != 0)
}

/// True when `mv` is legal for the side to move. The promotion letter is not
/// compared because promotion always yields a queen.
pub fn is_legal(position: &Position, mv: Move) -> bool {
    match position.board.piece_at(mv.from) {
        Some(piece) if piece.color == position.side_to_move() => {
            legal_destinations(position, mv.from) & mv.to.mask() != 0
        }
        _ => false,
    }
}

pub fn classify(position: &Position) -> GameStatus {
    let in_check = king_in_check(&position.board, position.side_to_move());
    match (has_legal_move(position), in_check) {
        (false, true) => GameStatus::Checkmate,
        (false, false) => GameStatus::Stalemate,
        (true, true) => GameStatus::Check,
        (true, false) => GameStatus::Continuing,
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, is_legal, legal_destinations, legal_moves, pseudo_legal_destinations};
    use crate::game_state::chess_types::{GameStatus, Move, PieceKind, Position, Square};
    use crate::move_generation::legal_move_apply::commit_move;
    use crate::move_generation::legal_move_checks::king_in_check;
    use crate::utils::algebraic::algebraic_to_square;
    use crate::utils::fen_parser::parse_fen;

    fn sq(text: &str) -> Square {
        algebraic_to_square(text).expect("test square should parse")
    }

    const SAMPLE_FENS: [&str; 6] = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
        "4k3/4r3/8/8/8/8/4N3/4K3 w - - 0 1",
    ];

    #[test]
    fn pseudo_legal_destinations_never_hit_own_pieces() {
        for fen in SAMPLE_FENS {
            let position = parse_fen(fen).expect("sample FEN should parse");
            for (from, piece) in position.board.occupied() {
                let own = position.board.occupancy_of(piece.color);
                assert_eq!(
                    pseudo_legal_destinations(&position, from) & own,
                    0,
                    "{fen}: {from} targets its own colour"
                );
            }
        }
    }

    #[test]
    fn legal_moves_never_leave_own_king_in_check() {
        for fen in SAMPLE_FENS {
            let position = parse_fen(fen).expect("sample FEN should parse");
            let mover = position.side_to_move();
            for mv in legal_moves(&position) {
                let mut next = position;
                commit_move(&mut next, mv).expect("generated move should commit");
                assert!(
                    !king_in_check(&next.board, mover),
                    "{fen}: {mv} leaves the king in check"
                );
            }
        }
    }

    #[test]
    fn starting_position_has_twenty_moves_and_continues() {
        let position = Position::new_game();
        assert_eq!(legal_moves(&position).len(), 20);
        assert_eq!(classify(&position), GameStatus::Continuing);
    }

    #[test]
    fn fools_mate_is_checkmate() {
        let position = parse_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
            .expect("fool's mate FEN should parse");
        assert!(legal_moves(&position).is_empty());
        assert_eq!(classify(&position), GameStatus::Checkmate);
    }

    #[test]
    fn cornered_king_is_stalemate() {
        let position = parse_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").expect("stalemate FEN should parse");
        assert!(legal_moves(&position).is_empty());
        assert_eq!(classify(&position), GameStatus::Stalemate);
    }

    #[test]
    fn check_with_escape_is_check() {
        let position = parse_fen("4k3/8/8/8/8/8/8/4K2r w - - 0 1").expect("FEN should parse");
        assert_eq!(classify(&position), GameStatus::Check);
    }

    #[test]
    fn en_passant_exposing_king_on_rank_is_filtered() {
        let position = parse_fen("8/8/8/K2pP2r/8/8/8/4k3 w - d6 0 2").expect("FEN should parse");
        assert_eq!(legal_destinations(&position, sq("e5")) & sq("d6").mask(), 0);
        assert!(!is_legal(&position, Move::new(sq("e5"), sq("d6"))));
        assert!(is_legal(&position, Move::new(sq("e5"), sq("e6"))));
    }

    #[test]
    fn promotion_moves_are_queen_only() {
        let position = parse_fen("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1").expect("FEN should parse");
        let promotions: Vec<Move> = legal_moves(&position)
            .into_iter()
            .filter(|mv| mv.from == sq("b7"))
            .collect();
        assert_eq!(promotions.len(), 1);
        assert_eq!(promotions[0].promotion, Some(PieceKind::Queen));
    }
}
