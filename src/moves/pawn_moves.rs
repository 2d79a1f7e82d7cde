//! Pawn capture patterns. Pushes are not attacks and live in
//! `move_generation::legal_moves_pawn`.

use crate::game_state::chess_types::{Color, Square};
use crate::moves::knight_moves::bit_if_on_board;

pub const WHITE_PAWN_ATTACKS: [u64; 64] = generate_pawn_attacks(1);
pub const BLACK_PAWN_ATTACKS: [u64; 64] = generate_pawn_attacks(-1);

#[inline]
pub const fn pawn_attacks(color: Color, square: Square) -> u64 {
    match color {
        Color::White => WHITE_PAWN_ATTACKS[square.index() as usize],
        Color::Black => BLACK_PAWN_ATTACKS[square.index() as usize],
    }
}

const fn generate_pawn_attacks(forward: i8) -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut sq = 0usize;

    while sq < 64 {
        let rank = (sq / 8) as i8;
        let file = (sq % 8) as i8;
        table[sq] =
            bit_if_on_board(rank + forward, file - 1) | bit_if_on_board(rank + forward, file + 1);
        sq += 1;
    }

    table
}
