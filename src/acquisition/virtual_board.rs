//! In-memory `BoardIo` used by the terminal front-end and the tests.

use crate::acquisition::board_io::{BoardIo, SensorSnapshot};
use crate::acquisition::indicator::IndicatorColor;
use crate::game_state::chess_types::{Position, Square};

#[derive(Debug, Clone)]
pub struct VirtualBoard {
    sensors: SensorSnapshot,
    pending: [[IndicatorColor; 8]; 8],
    shown: [[IndicatorColor; 8]; 8],
    show_count: u64,
}

impl Default for VirtualBoard {
    fn default() -> Self {
        Self::from_position(&Position::new_game())
    }
}

impl VirtualBoard {
    /// Sensors matching the pieces of `position`, all indicators off.
    pub fn from_position(position: &Position) -> Self {
        Self {
            sensors: position.board.presence(),
            pending: [[IndicatorColor::OFF; 8]; 8],
            shown: [[IndicatorColor::OFF; 8]; 8],
            show_count: 0,
        }
    }

    pub fn set_position(&mut self, position: &Position) {
        self.sensors = position.board.presence();
    }

    pub fn lift(&mut self, square: Square) {
        self.sensors[square.rank() as usize][square.file() as usize] = false;
    }

    pub fn place(&mut self, square: Square) {
        self.sensors[square.rank() as usize][square.file() as usize] = true;
    }

    pub fn is_present(&self, square: Square) -> bool {
        self.sensors[square.rank() as usize][square.file() as usize]
    }

    /// Indicator as of the last `show`.
    pub fn indicator(&self, square: Square) -> IndicatorColor {
        self.shown[square.rank() as usize][square.file() as usize]
    }

    pub fn lit_squares(&self) -> Vec<(Square, IndicatorColor)> {
        Square::all()
            .map(|sq| (sq, self.indicator(sq)))
            .filter(|(_, color)| !color.is_off())
            .collect()
    }

    pub fn show_count(&self) -> u64 {
        self.show_count
    }
}

impl BoardIo for VirtualBoard {
    fn read_sensors(&mut self) -> SensorSnapshot {
        self.sensors
    }

    fn set_indicator(&mut self, square: Square, color: IndicatorColor) {
        self.pending[square.rank() as usize][square.file() as usize] = color;
    }

    fn show(&mut self) {
        self.shown = self.pending;
        self.show_count += 1;
    }
}
