//! Bounded log of committed moves.
//!
//! Each `MoveRecord` carries enough to reverse itself exactly (including the
//! state flags it overwrote), so undo never needs the earlier log entries and
//! the oldest records can be evicted once the capacity is reached.

use std::collections::VecDeque;

use tracing::debug;

use crate::errors::{ChessError, ChessResult};
use crate::game_state::chess_rules::{CastleSide, MAX_MOVE_HISTORY};
use crate::game_state::chess_types::*;
use crate::game_state::game_state::GameState;
use crate::move_generation::legal_move_apply::undo_move;

/// Compound-move detail a plain from/to pair cannot express.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialMove {
    None,
    Castle(CastleSide),
    /// Captured pawn stood on `captured_square`, not on the destination.
    EnPassant { captured_square: Square },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRecord {
    pub from: Square,
    pub to: Square,
    /// The piece as it stood on `from`; a promoting pawn stays a pawn here.
    pub moved_piece: Piece,
    pub captured_piece: Option<Piece>,
    pub promoted_to: Option<PieceKind>,
    pub mover: Color,
    pub special: SpecialMove,
    pub prior_state: GameState,
}

impl MoveRecord {
    #[inline]
    pub fn as_move(&self) -> Move {
        Move {
            from: self.from,
            to: self.to,
            promotion: self.promoted_to,
        }
    }

    /// Square the captured piece was removed from.
    #[inline]
    pub fn capture_square(&self) -> Square {
        match self.special {
            SpecialMove::EnPassant { captured_square } => captured_square,
            _ => self.to,
        }
    }

    #[inline]
    pub fn is_capture(&self) -> bool {
        self.captured_piece.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct MoveHistory {
    records: VecDeque<MoveRecord>,
    capacity: usize,
}

impl Default for MoveHistory {
    fn default() -> Self {
        Self::with_capacity(MAX_MOVE_HISTORY)
    }
}

impl MoveHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a committed move, evicting the oldest record when full.
    pub fn record(&mut self, record: MoveRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Reverse the most recent move on `position` and drop it from the log.
    pub fn undo(&mut self, position: &mut Position) -> ChessResult<MoveRecord> {
        let record = self.records.pop_back().ok_or(ChessError::NoHistory)?;
        undo_move(position, &record);
        debug!(from = %record.from, to = %record.to, "undid move");
        Ok(record)
    }

    #[inline]
    pub fn last(&self) -> Option<&MoveRecord> {
        self.records.back()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &MoveRecord> + ExactSizeIterator {
        self.records.iter()
    }

    /// Positions before each retained record, rebuilt by undoing backwards
    /// from `current`. The first entry is the earliest position still
    /// reachable through the log.
    pub fn positions_before(&self, current: &Position) -> Vec<Position> {
        let mut scratch = *current;
        let mut positions = Vec::with_capacity(self.records.len());
        for record in self.records.iter().rev() {
            undo_move(&mut scratch, record);
            positions.push(scratch);
        }
        positions.reverse();
        positions
    }

    /// Earliest position reachable through the log (`current` when empty).
    pub fn initial_position(&self, current: &Position) -> Position {
        self.positions_before(current)
            .first()
            .copied()
            .unwrap_or(*current)
    }
}
