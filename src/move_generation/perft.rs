//! Node counting over the legal move generator.
//!
//! Promotions only ever produce a queen, so counts diverge from published
//! perft tables at depths where underpromotions appear.

use crate::game_state::chess_types::Position;
use crate::move_generation::legal_move_apply::{apply_move_unchecked, undo_move};
use crate::move_generation::legal_move_generator::legal_moves;

pub fn perft(position: &Position, depth: u8) -> u64 {
    let mut scratch = *position;
    perft_recurse(&mut scratch, depth)
}

fn perft_recurse(position: &mut Position, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = legal_moves(position);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0u64;
    for mv in moves {
        let Ok(record) = apply_move_unchecked(position, mv) else {
            continue;
        };
        nodes += perft_recurse(position, depth - 1);
        undo_move(position, &record);
    }
    nodes
}

/// Per-root-move node counts, in generation order.
pub fn perft_divide(position: &Position, depth: u8) -> Vec<(String, u64)> {
    let mut scratch = *position;
    let mut out = Vec::new();
    if depth == 0 {
        return out;
    }
    for mv in legal_moves(&scratch) {
        let Ok(record) = apply_move_unchecked(&mut scratch, mv) else {
            continue;
        };
        out.push((mv.to_string(), perft_recurse(&mut scratch, depth - 1)));
        undo_move(&mut scratch, &record);
    }
    out
}
