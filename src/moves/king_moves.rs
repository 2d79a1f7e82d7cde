use crate::game_state::chess_types::Square;
use crate::moves::knight_moves::bit_if_on_board;

pub const KING_OFFSETS: [(i8, i8); 8] = [
    (1, -1),
    (1, 0),
    (1, 1),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

pub const KING_ATTACKS: [u64; 64] = generate_king_attacks();

#[inline]
pub const fn king_attacks(square: Square) -> u64 {
    KING_ATTACKS[square.index() as usize]
}

const fn generate_king_attacks() -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut sq = 0usize;

    while sq < 64 {
        let rank = (sq / 8) as i8;
        let file = (sq % 8) as i8;
        let mut attacks = 0u64;
        let mut i = 0usize;

        while i < KING_OFFSETS.len() {
            let (dr, df) = KING_OFFSETS[i];
            attacks |= bit_if_on_board(rank + dr, file + df);
            i += 1;
        }

        table[sq] = attacks;
        sq += 1;
    }

    table
}
