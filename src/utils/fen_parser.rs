//! FEN-to-Position parser.
//!
//! Accepts the six-field form: placement, side to move, castling subset of
//! `KQkq` or `-`, en-passant square or `-`, halfmove clock, fullmove number.

use crate::errors::{ChessError, ChessResult};
use crate::game_state::board::Board;
use crate::game_state::chess_types::*;
use crate::game_state::game_state::{GameState, Position};
use crate::utils::algebraic::algebraic_to_square;

fn invalid(reason: impl Into<String>) -> ChessError {
    ChessError::InvalidFen {
        reason: reason.into(),
    }
}

pub fn parse_fen(fen: &str) -> ChessResult<Position> {
    let mut parts = fen.split_whitespace();

    let board_part = parts.next().ok_or_else(|| invalid("missing board layout"))?;
    let side_part = parts.next().ok_or_else(|| invalid("missing side to move"))?;
    let castling_part = parts.next().ok_or_else(|| invalid("missing castling rights"))?;
    let en_passant_part = parts.next().ok_or_else(|| invalid("missing en-passant square"))?;
    let halfmove_part = parts.next().ok_or_else(|| invalid("missing halfmove clock"))?;
    let fullmove_part = parts.next().ok_or_else(|| invalid("missing fullmove number"))?;

    if parts.next().is_some() {
        return Err(invalid("extra trailing fields"));
    }

    let board = parse_board(board_part)?;

    let mut state = GameState {
        turn: parse_side_to_move(side_part)?,
        en_passant_target: parse_en_passant_square(en_passant_part)?,
        halfmove_clock: halfmove_part
            .parse::<u32>()
            .map_err(|_| invalid(format!("halfmove clock `{halfmove_part}`")))?,
        fullmove_number: fullmove_part
            .parse::<u32>()
            .map_err(|_| invalid(format!("fullmove number `{fullmove_part}`")))?,
        ..GameState::default()
    };
    parse_castling_rights(castling_part, &mut state)?;

    Ok(Position { board, state })
}

fn parse_board(board_part: &str) -> ChessResult<Board> {
    let ranks: Vec<&str> = board_part.split('/').collect();
    if ranks.len() != 8 {
        return Err(invalid("board layout must contain 8 ranks"));
    }

    let mut board = Board::empty();

    for (fen_rank_idx, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - fen_rank_idx as u8;
        let mut file = 0u8;

        for ch in rank_str.chars() {
            if let Some(empty_count) = ch.to_digit(10) {
                if !(1..=8).contains(&empty_count) {
                    return Err(invalid(format!("empty-square count '{ch}'")));
                }
                file += empty_count as u8;
                if file > 8 {
                    return Err(invalid(format!("rank {} has too many files", rank + 1)));
                }
                continue;
            }

            let piece = Piece::from_fen_char(ch)
                .ok_or_else(|| invalid(format!("piece character '{ch}'")))?;
            let square = Square::new(rank, file)
                .ok_or_else(|| invalid(format!("rank {} has too many files", rank + 1)))?;
            board.set(square, Some(piece));
            file += 1;
        }

        if file != 8 {
            return Err(invalid(format!("rank {} does not sum to 8 files", rank + 1)));
        }
    }

    Ok(board)
}

fn parse_side_to_move(side_part: &str) -> ChessResult<Color> {
    match side_part {
        "w" => Ok(Color::White),
        "b" => Ok(Color::Black),
        _ => Err(invalid(format!("side to move `{side_part}`"))),
    }
}

fn parse_castling_rights(castling_part: &str, state: &mut GameState) -> ChessResult<()> {
    state.white_kingside = false;
    state.white_queenside = false;
    state.black_kingside = false;
    state.black_queenside = false;

    if castling_part == "-" {
        return Ok(());
    }

    for ch in castling_part.chars() {
        match ch {
            'K' => state.white_kingside = true,
            'Q' => state.white_queenside = true,
            'k' => state.black_kingside = true,
            'q' => state.black_queenside = true,
            _ => return Err(invalid(format!("castling rights character '{ch}'"))),
        }
    }

    Ok(())
}

fn parse_en_passant_square(en_passant_part: &str) -> ChessResult<Option<Square>> {
    if en_passant_part == "-" {
        return Ok(None);
    }

    let square = algebraic_to_square(en_passant_part)
        .map_err(|_| invalid(format!("en-passant square `{en_passant_part}`")))?;
    if !matches!(square.rank(), 2 | 5) {
        return Err(invalid(format!(
            "en-passant square `{en_passant_part}` is not on rank 3 or 6"
        )));
    }
    Ok(Some(square))
}
