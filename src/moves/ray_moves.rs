//! Sliding-piece ray casts against an occupancy mask.
//!
//! Each ray includes the first occupied square it meets and stops there; the
//! caller masks out its own pieces.

use crate::game_state::chess_types::Square;

pub const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
pub const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

#[inline]
pub fn rook_attacks(square: Square, occupancy: u64) -> u64 {
    ROOK_DIRECTIONS
        .iter()
        .fold(0u64, |acc, &(dr, df)| acc | trace_ray(square, dr, df, occupancy))
}

#[inline]
pub fn bishop_attacks(square: Square, occupancy: u64) -> u64 {
    BISHOP_DIRECTIONS
        .iter()
        .fold(0u64, |acc, &(dr, df)| acc | trace_ray(square, dr, df, occupancy))
}

#[inline]
pub fn queen_attacks(square: Square, occupancy: u64) -> u64 {
    rook_attacks(square, occupancy) | bishop_attacks(square, occupancy)
}

fn trace_ray(square: Square, rank_step: i8, file_step: i8, occupancy: u64) -> u64 {
    let mut attacks = 0u64;
    let mut cursor = square.offset(rank_step, file_step);

    while let Some(target) = cursor {
        attacks |= target.mask();
        if occupancy & target.mask() != 0 {
            break;
        }
        cursor = target.offset(rank_step, file_step);
    }

    attacks
}
