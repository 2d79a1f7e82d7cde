//! Board I/O seam: presence sensors in, indicators out.
//!
//! The core calls `read_sensors` once per tick and diffs the result against
//! the previous snapshot; `show` publishes every `set_indicator` made since
//! the last call.

use crate::acquisition::indicator::IndicatorColor;
use crate::game_state::chess_types::Square;

/// `[rank][file]`, true = piece present.
pub type SensorSnapshot = [[bool; 8]; 8];

pub trait BoardIo {
    fn read_sensors(&mut self) -> SensorSnapshot;

    fn set_indicator(&mut self, square: Square, color: IndicatorColor);

    fn show(&mut self);

    fn clear_indicators(&mut self) {
        for square in Square::all() {
            self.set_indicator(square, IndicatorColor::OFF);
        }
    }
}

#[inline]
pub fn is_present(snapshot: &SensorSnapshot, square: Square) -> bool {
    snapshot[square.rank() as usize][square.file() as usize]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorChange {
    /// present -> absent
    Lifted,
    /// absent -> present
    Placed,
}

/// Squares whose presence differs between two snapshots, in scan order
/// (lowest rank, then lowest file).
pub fn sensor_changes(
    previous: &SensorSnapshot,
    current: &SensorSnapshot,
) -> Vec<(Square, SensorChange)> {
    Square::all()
        .filter_map(|sq| match (is_present(previous, sq), is_present(current, sq)) {
            (true, false) => Some((sq, SensorChange::Lifted)),
            (false, true) => Some((sq, SensorChange::Placed)),
            _ => None,
        })
        .collect()
}
