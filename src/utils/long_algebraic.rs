//! Four/five-character coordinate move strings (`e2e4`, `e7e8q`) and the
//! compact move list built from them.

use crate::errors::{ChessError, ChessResult};
use crate::game_state::chess_types::*;
use crate::game_state::move_history::MoveHistory;
use crate::utils::algebraic::algebraic_to_square;

/// Parse a coordinate move string. The optional fifth character must be a
/// promotion letter (`n`, `b`, `r`, `q`, either case).
pub fn parse_move_string(text: &str) -> ChessResult<Move> {
    let invalid = || ChessError::InvalidMoveString {
        text: text.to_owned(),
    };
    if !text.is_ascii() || !(4..=5).contains(&text.len()) {
        return Err(invalid());
    }

    let from = algebraic_to_square(&text[0..2]).map_err(|_| invalid())?;
    let to = algebraic_to_square(&text[2..4]).map_err(|_| invalid())?;

    let promotion = match text.chars().nth(4) {
        Some(ch) => Some(char_to_promotion(ch).ok_or_else(invalid)?),
        None => None,
    };

    Ok(Move {
        from,
        to,
        promotion,
    })
}

fn char_to_promotion(ch: char) -> Option<PieceKind> {
    match ch.to_ascii_lowercase() {
        'n' => Some(PieceKind::Knight),
        'b' => Some(PieceKind::Bishop),
        'r' => Some(PieceKind::Rook),
        'q' => Some(PieceKind::Queen),
        _ => None,
    }
}

/// `1.e2e4 e7e5 2.g1f3`, promotions suffixed `=Q`. A log whose first retained
/// record is Black's opens with `N...`.
pub fn compact_move_list(history: &MoveHistory, current: &Position) -> String {
    let mut parts = Vec::<String>::with_capacity(history.len());
    let positions = history.positions_before(current);

    for (record, before) in history.iter().zip(positions.iter()) {
        let mut token = format!("{}{}", record.from, record.to);
        if let Some(promo) = record.promoted_to {
            token.push('=');
            token.push(promo.letter());
        }

        let number = before.state.fullmove_number;
        match record.mover {
            Color::White => parts.push(format!("{number}.{token}")),
            Color::Black if parts.is_empty() => parts.push(format!("{number}...{token}")),
            Color::Black => parts.push(token),
        }
    }

    parts.join(" ")
}
