//! Position-to-FEN serializer. This is the exact payload handed to the
//! external move-source.

use crate::game_state::chess_types::*;
use crate::game_state::game_state::Position;

pub fn generate_fen(position: &Position) -> String {
    let state = &position.state;
    let mut fen = String::with_capacity(90);

    for rank in (0..8u8).rev() {
        let mut empty_run = 0u8;
        for file in 0..8u8 {
            let piece = Square::new(rank, file).and_then(|sq| position.board.piece_at(sq));
            match piece {
                Some(piece) => {
                    if empty_run > 0 {
                        fen.push(char::from(b'0' + empty_run));
                        empty_run = 0;
                    }
                    fen.push(piece.fen_char());
                }
                None => empty_run += 1,
            }
        }
        if empty_run > 0 {
            fen.push(char::from(b'0' + empty_run));
        }
        if rank > 0 {
            fen.push('/');
        }
    }

    fen.push(' ');
    fen.push(match state.turn {
        Color::White => 'w',
        Color::Black => 'b',
    });

    fen.push(' ');
    if state.any_castling() {
        for (flag, ch) in [
            (state.white_kingside, 'K'),
            (state.white_queenside, 'Q'),
            (state.black_kingside, 'k'),
            (state.black_queenside, 'q'),
        ] {
            if flag {
                fen.push(ch);
            }
        }
    } else {
        fen.push('-');
    }

    fen.push(' ');
    match state.en_passant_target {
        Some(square) => fen.push_str(&square.to_string()),
        None => fen.push('-'),
    }

    fen.push_str(&format!(" {} {}", state.halfmove_clock, state.fullmove_number));
    fen
}
