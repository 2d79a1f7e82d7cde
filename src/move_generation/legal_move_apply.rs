//! Commit and reverse moves on a `Position`.
//!
//! `commit_move` is the only entry point that validates; `apply_move_unchecked`
//! and `undo_move` trust their input and are used by the commit path, the
//! history, and perft.

use crate::errors::{ChessError, ChessResult};
use crate::game_state::chess_rules::CastleSide;
use crate::game_state::chess_types::*;
use crate::game_state::move_history::{MoveRecord, SpecialMove};
use crate::move_generation::legal_move_generator::is_legal;
use crate::move_generation::legal_moves_king::{castle_rook_squares, castle_side_of};
use crate::move_generation::legal_moves_pawn::{en_passant_victim, is_en_passant};

/// Validate `mv` against the legal set for the side to move and apply it.
/// On error the position is untouched.
pub fn commit_move(position: &mut Position, mv: Move) -> ChessResult<MoveRecord> {
    if !is_legal(position, mv) {
        return Err(ChessError::IllegalMove {
            from: mv.from,
            to: mv.to,
        });
    }
    apply_move_unchecked(position, mv)
}

/// Apply `mv` without a legality check. Fails only if `from` is empty.
pub fn apply_move_unchecked(position: &mut Position, mv: Move) -> ChessResult<MoveRecord> {
    let (from, to) = (mv.from, mv.to);
    let moved_piece = position
        .board
        .piece_at(from)
        .ok_or(ChessError::IllegalMove { from, to })?;
    let mover = moved_piece.color;
    let prior_state = position.state;

    let special = if let Some(side) = castle_side_of(moved_piece, from, to) {
        SpecialMove::Castle(side)
    } else if is_en_passant(position, moved_piece, from, to) {
        match en_passant_victim(from, to) {
            Some(captured_square) => SpecialMove::EnPassant { captured_square },
            None => SpecialMove::None,
        }
    } else {
        SpecialMove::None
    };

    let captured_piece = match special {
        SpecialMove::EnPassant { captured_square } => position.board.take(captured_square),
        _ => position.board.take(to),
    };

    let promoted_to = (moved_piece.kind == PieceKind::Pawn && to.rank() == mover.promotion_rank())
        .then_some(PieceKind::Queen);

    position.board.set(from, None);
    position.board.set(
        to,
        Some(Piece::new(promoted_to.unwrap_or(moved_piece.kind), mover)),
    );

    if let SpecialMove::Castle(side) = special {
        relocate_castling_rook(position, mover, side, false);
    }

    let record = MoveRecord {
        from,
        to,
        moved_piece,
        captured_piece,
        promoted_to,
        mover,
        special,
        prior_state,
    };
    update_game_state(&mut position.state, &record);
    Ok(record)
}

/// Exact inverse of `apply_move_unchecked` for the most recent move.
pub fn undo_move(position: &mut Position, record: &MoveRecord) {
    position.board.set(record.to, None);
    position.board.set(record.from, Some(record.moved_piece));
    if let Some(captured) = record.captured_piece {
        position.board.set(record.capture_square(), Some(captured));
    }
    if let SpecialMove::Castle(side) = record.special {
        relocate_castling_rook(position, record.mover, side, true);
    }
    position.state = record.prior_state;
}

fn relocate_castling_rook(position: &mut Position, color: Color, side: CastleSide, reverse: bool) {
    let Some((home, landing)) = castle_rook_squares(color, side) else {
        return;
    };
    let (src, dst) = if reverse { (landing, home) } else { (home, landing) };
    let rook = position.board.take(src);
    position.board.set(dst, rook);
}

/// Rights revocation, en-passant target lifecycle, clocks, and turn toggle.
pub fn update_game_state(state: &mut GameState, record: &MoveRecord) {
    let mover = record.mover;

    if record.moved_piece.kind == PieceKind::King {
        state.revoke_castling(mover, CastleSide::Kingside);
        state.revoke_castling(mover, CastleSide::Queenside);
    }

    // Anything leaving or landing on a rook home square ends that right.
    for color in [Color::White, Color::Black] {
        for side in CastleSide::BOTH {
            if let Some(corner) = Square::new(color.back_rank(), side.rook_home_file()) {
                if record.from == corner || record.to == corner {
                    state.revoke_castling(color, side);
                }
            }
        }
    }

    state.en_passant_target = if record.moved_piece.kind == PieceKind::Pawn
        && record.from.rank().abs_diff(record.to.rank()) == 2
    {
        Square::new((record.from.rank() + record.to.rank()) / 2, record.from.file())
    } else {
        None
    };

    if record.moved_piece.kind == PieceKind::Pawn || record.captured_piece.is_some() {
        state.halfmove_clock = 0;
    } else {
        state.halfmove_clock = state.halfmove_clock.saturating_add(1);
    }

    if mover == Color::Black {
        state.fullmove_number = state.fullmove_number.saturating_add(1);
    }

    state.turn = mover.opposite();
}

#[cfg(test)]
mod tests {
    use super::{commit_move, undo_move};
    use crate::errors::ChessError;
    use crate::game_state::chess_rules::CastleSide;
    use crate::game_state::chess_types::{Color, Move, Piece, PieceKind, Position, Square};
    use crate::game_state::move_history::SpecialMove;
    use crate::move_generation::legal_move_generator::legal_moves;
    use crate::utils::algebraic::algebraic_to_square;
    use crate::utils::fen_parser::parse_fen;

    fn sq(text: &str) -> Square {
        algebraic_to_square(text).expect("test square should parse")
    }

    fn commit(position: &mut Position, from: &str, to: &str) {
        commit_move(position, Move::new(sq(from), sq(to))).expect("move should be legal");
    }

    #[test]
    fn undo_is_left_inverse_of_commit_for_every_legal_move() {
        for fen in [
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 b kq - 0 1",
        ] {
            let original = parse_fen(fen).expect("sample FEN should parse");
            for mv in legal_moves(&original) {
                let mut position = original;
                let record = commit_move(&mut position, mv).expect("generated move should commit");
                undo_move(&mut position, &record);
                assert_eq!(position, original, "{fen}: undo of {mv} did not restore");
            }
        }
    }

    #[test]
    fn castle_moves_rook_and_undo_restores_it() {
        let original = parse_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").expect("FEN should parse");
        let mut position = original;
        let record =
            commit_move(&mut position, Move::new(sq("e1"), sq("g1"))).expect("castle is legal");
        assert_eq!(record.special, SpecialMove::Castle(CastleSide::Kingside));
        assert_eq!(position.board.piece_at(sq("f1")), Some(Piece::new(PieceKind::Rook, Color::White)));
        assert!(position.board.is_empty(sq("h1")));
        assert!(!position.state.white_kingside && !position.state.white_queenside);
        assert!(position.state.black_kingside && position.state.black_queenside);
        undo_move(&mut position, &record);
        assert_eq!(position, original);
    }

    #[test]
    fn en_passant_removes_pawn_from_its_real_square() {
        let original =
            parse_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").expect("FEN should parse");
        let mut position = original;
        let record =
            commit_move(&mut position, Move::new(sq("e5"), sq("d6"))).expect("en passant is legal");
        assert_eq!(record.captured_piece, Some(Piece::new(PieceKind::Pawn, Color::Black)));
        assert!(position.board.is_empty(sq("d5")));
        assert_eq!(position.board.piece_at(sq("d6")).map(|p| p.kind), Some(PieceKind::Pawn));
        undo_move(&mut position, &record);
        assert_eq!(position, original);
    }

    #[test]
    fn promotion_always_queens_and_undo_restores_pawn() {
        let original = parse_fen("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1").expect("FEN should parse");
        let mut position = original;
        let record = commit_move(
            &mut position,
            Move::with_promotion(sq("b7"), sq("b8"), PieceKind::Knight),
        )
        .expect("promotion is legal");
        assert_eq!(record.promoted_to, Some(PieceKind::Queen));
        assert_eq!(position.board.piece_at(sq("b8")), Some(Piece::new(PieceKind::Queen, Color::White)));
        undo_move(&mut position, &record);
        assert_eq!(position.board.piece_at(sq("b7")), Some(Piece::new(PieceKind::Pawn, Color::White)));
        assert_eq!(position, original);
    }

    #[test]
    fn en_passant_target_only_after_double_push() {
        let mut position = Position::new_game();
        commit(&mut position, "e2", "e4");
        assert_eq!(position.state.en_passant_target, Some(sq("e3")));
        commit(&mut position, "g8", "f6");
        assert_eq!(position.state.en_passant_target, None);
        commit(&mut position, "e4", "e5");
        assert_eq!(position.state.en_passant_target, None);
        commit(&mut position, "d7", "d5");
        assert_eq!(position.state.en_passant_target, Some(sq("d6")));
        commit(&mut position, "e5", "d6");
        assert_eq!(position.state.en_passant_target, None);
    }

    #[test]
    fn castling_rights_never_return() {
        let mut position =
            parse_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").expect("FEN should parse");
        let mut previous = position.state;
        for (from, to) in [("h1", "h2"), ("a8", "a7"), ("h2", "h1"), ("a7", "a8"), ("e1", "d1")] {
            commit(&mut position, from, to);
            let now = position.state;
            for (before, after) in [
                (previous.white_kingside, now.white_kingside),
                (previous.white_queenside, now.white_queenside),
                (previous.black_kingside, now.black_kingside),
                (previous.black_queenside, now.black_queenside),
            ] {
                assert!(before || !after, "a castling right came back after {from}{to}");
            }
            previous = now;
        }
        assert!(!position.state.white_kingside);
        assert!(!position.state.white_queenside);
        assert!(!position.state.black_queenside);
        assert!(position.state.black_kingside);
    }

    #[test]
    fn capturing_a_home_rook_revokes_its_right() {
        let mut position =
            parse_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").expect("FEN should parse");
        commit(&mut position, "a1", "a8");
        assert!(!position.state.white_queenside);
        assert!(!position.state.black_queenside);
        assert!(position.state.black_kingside);
        assert_eq!(position.state.halfmove_clock, 0);
    }

    #[test]
    fn clocks_and_turn_advance() {
        let mut position = Position::new_game();
        commit(&mut position, "g1", "f3");
        assert_eq!(position.state.halfmove_clock, 1);
        assert_eq!(position.state.fullmove_number, 1);
        assert_eq!(position.state.turn, Color::Black);
        commit(&mut position, "b8", "c6");
        assert_eq!(position.state.halfmove_clock, 2);
        assert_eq!(position.state.fullmove_number, 2);
        commit(&mut position, "e2", "e4");
        assert_eq!(position.state.halfmove_clock, 0);
    }

    #[test]
    fn illegal_move_leaves_position_untouched() {
        let mut position = Position::new_game();
        let result = commit_move(&mut position, Move::new(sq("e2"), sq("e5")));
        assert_eq!(result, Err(ChessError::IllegalMove { from: sq("e2"), to: sq("e5") }));
        let wrong_side = commit_move(&mut position, Move::new(sq("e7"), sq("e5")));
        assert!(wrong_side.is_err());
        assert_eq!(position, Position::new_game());
    }
}
