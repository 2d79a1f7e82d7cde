//! Square coordinates and standard algebraic notation for committed moves.
//!
//! Disambiguation considers other pieces of the same kind and colour that
//! could legally reach the destination: the source file is used when it is
//! unique among them, then the source rank, then both.

use crate::errors::{ChessError, ChessResult};
use crate::game_state::chess_rules::CastleSide;
use crate::game_state::chess_types::*;
use crate::game_state::move_history::{MoveRecord, SpecialMove};
use crate::move_generation::legal_move_generator::{classify, legal_destinations};

/// Convert a coordinate such as `e4` to a square.
#[inline]
pub fn algebraic_to_square(square: &str) -> ChessResult<Square> {
    let invalid = || ChessError::InvalidSquare {
        text: square.to_owned(),
    };
    let bytes = square.as_bytes();
    if bytes.len() != 2 {
        return Err(invalid());
    }

    let (file, rank) = (bytes[0], bytes[1]);
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return Err(invalid());
    }

    Square::new(rank - b'1', file - b'a').ok_or_else(invalid)
}

#[inline]
pub fn square_to_algebraic(square: Square) -> String {
    square.to_string()
}

#[inline]
pub fn file_char(square: Square) -> char {
    char::from(b'a' + square.file())
}

#[inline]
pub fn rank_char(square: Square) -> char {
    char::from(b'1' + square.rank())
}

/// SAN for `record`, given the position it was played from and the position
/// it produced. Adds `+` or `#` from the resulting position's status.
pub fn record_to_san(before: &Position, record: &MoveRecord, after: &Position) -> String {
    let mut san = match record.special {
        SpecialMove::Castle(CastleSide::Kingside) => "O-O".to_owned(),
        SpecialMove::Castle(CastleSide::Queenside) => "O-O-O".to_owned(),
        _ => body_san(before, record),
    };

    match classify(after) {
        GameStatus::Checkmate => san.push('#'),
        GameStatus::Check => san.push('+'),
        GameStatus::Continuing | GameStatus::Stalemate => {}
    }
    san
}

fn body_san(before: &Position, record: &MoveRecord) -> String {
    let mut san = String::with_capacity(8);

    if record.moved_piece.kind == PieceKind::Pawn {
        if record.is_capture() {
            san.push(file_char(record.from));
            san.push('x');
        }
        san.push_str(&square_to_algebraic(record.to));
        if let Some(promo) = record.promoted_to {
            san.push('=');
            san.push(promo.letter());
        }
        return san;
    }

    san.push(record.moved_piece.kind.letter());
    san.push_str(&disambiguation(before, record));
    if record.is_capture() {
        san.push('x');
    }
    san.push_str(&square_to_algebraic(record.to));
    san
}

fn disambiguation(before: &Position, record: &MoveRecord) -> String {
    let rivals: Vec<Square> = before
        .board
        .pieces_of(record.mover)
        .filter(|(sq, piece)| *sq != record.from && piece.kind == record.moved_piece.kind)
        .filter(|(sq, _)| legal_destinations(before, *sq) & record.to.mask() != 0)
        .map(|(sq, _)| sq)
        .collect();

    if rivals.is_empty() {
        String::new()
    } else if rivals.iter().all(|sq| sq.file() != record.from.file()) {
        file_char(record.from).to_string()
    } else if rivals.iter().all(|sq| sq.rank() != record.from.rank()) {
        rank_char(record.from).to_string()
    } else {
        square_to_algebraic(record.from)
    }
}

#[cfg(test)]
mod tests {
    use super::{algebraic_to_square, record_to_san, square_to_algebraic};
    use crate::game_state::chess_types::{Move, Position};
    use crate::move_generation::legal_move_apply::commit_move;
    use crate::utils::fen_parser::parse_fen;

    fn san_of(fen: &str, from: &str, to: &str) -> String {
        let before = parse_fen(fen).expect("FEN should parse");
        let mut after = before;
        let mv = Move::new(
            algebraic_to_square(from).expect("from square"),
            algebraic_to_square(to).expect("to square"),
        );
        let record = commit_move(&mut after, mv).expect("move should be legal");
        record_to_san(&before, &record, &after)
    }

    #[test]
    fn round_trip_square_conversions() {
        let a1 = algebraic_to_square("a1").expect("a1 should parse");
        let h8 = algebraic_to_square("h8").expect("h8 should parse");
        assert_eq!(a1.index(), 0);
        assert_eq!(h8.index(), 63);
        assert_eq!(square_to_algebraic(a1), "a1");
        assert_eq!(square_to_algebraic(h8), "h8");
        assert!(algebraic_to_square("i1").is_err());
        assert!(algebraic_to_square("a9").is_err());
        assert!(algebraic_to_square("e").is_err());
    }

    #[test]
    fn plain_pawn_and_piece_moves() {
        let start = Position::new_game().get_fen();
        assert_eq!(san_of(&start, "e2", "e4"), "e4");
        assert_eq!(san_of(&start, "g1", "f3"), "Nf3");
    }

    #[test]
    fn captures_castles_and_promotion() {
        assert_eq!(
            san_of("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1", "e4", "d5"),
            "exd5"
        );
        assert_eq!(san_of("4k3/8/8/8/8/8/8/4K2R w K - 0 1", "e1", "g1"), "O-O");
        assert_eq!(san_of("r3k3/8/8/8/8/8/8/4K3 b q - 0 1", "e8", "c8"), "O-O-O");
        assert_eq!(san_of("7k/1P6/8/8/8/8/8/4K3 w - - 0 1", "b7", "b8"), "b8=Q+");
    }

    #[test]
    fn disambiguates_by_file_then_rank() {
        assert_eq!(san_of("4k3/8/8/8/8/8/8/R4RK1 w - - 0 1", "a1", "d1"), "Rad1");
        assert_eq!(san_of("4k3/R7/8/8/8/8/8/R3K3 w - - 0 1", "a1", "a4"), "R1a4");
    }

    #[test]
    fn check_and_mate_suffixes() {
        assert_eq!(
            san_of("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2", "d8", "h4"),
            "Qh4#"
        );
        assert_eq!(san_of("4k3/8/8/8/8/8/8/R3K3 w - - 0 1", "a1", "a8"), "Ra8+");
    }
}
