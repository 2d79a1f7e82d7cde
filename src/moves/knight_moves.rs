//! Knight attack table, built at compile time from the eight L-shaped offsets.

use crate::game_state::chess_types::Square;

/// `(rank, file)` displacements.
pub const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, 1),
    (1, 2),
    (-1, 2),
    (-2, 1),
    (-2, -1),
    (-1, -2),
    (1, -2),
    (2, -1),
];

pub const KNIGHT_ATTACKS: [u64; 64] = generate_knight_attacks();

#[inline]
pub const fn knight_attacks(square: Square) -> u64 {
    KNIGHT_ATTACKS[square.index() as usize]
}

const fn generate_knight_attacks() -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut sq = 0usize;

    while sq < 64 {
        let rank = (sq / 8) as i8;
        let file = (sq % 8) as i8;
        let mut attacks = 0u64;
        let mut i = 0usize;

        while i < KNIGHT_OFFSETS.len() {
            let (dr, df) = KNIGHT_OFFSETS[i];
            attacks |= bit_if_on_board(rank + dr, file + df);
            i += 1;
        }

        table[sq] = attacks;
        sq += 1;
    }

    table
}

pub(crate) const fn bit_if_on_board(rank: i8, file: i8) -> u64 {
    if rank < 0 || rank > 7 || file < 0 || file > 7 {
        return 0;
    }
    1u64 << ((rank as u32) * 8 + file as u32)
}
