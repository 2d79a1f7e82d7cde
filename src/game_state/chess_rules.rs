//! Canonical chess-rule constants.
//!
//! Static rule literals: the standard starting FEN, the move-log capacity, and
//! the fixed castling geometry (king/rook home files and landing files).

/// Standard chess starting position in Forsyth-Edwards Notation (FEN).
pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Move records kept before the oldest is evicted.
pub const MAX_MOVE_HISTORY: usize = 200;

pub const KING_HOME_FILE: u8 = 4;
pub const KINGSIDE_ROOK_FILE: u8 = 7;
pub const QUEENSIDE_ROOK_FILE: u8 = 0;

/// Which wing a castle goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastleSide {
    Kingside,
    Queenside,
}

impl CastleSide {
    pub const BOTH: [CastleSide; 2] = [CastleSide::Kingside, CastleSide::Queenside];

    #[inline]
    pub const fn rook_home_file(self) -> u8 {
        match self {
            CastleSide::Kingside => KINGSIDE_ROOK_FILE,
            CastleSide::Queenside => QUEENSIDE_ROOK_FILE,
        }
    }

    /// File the king lands on.
    #[inline]
    pub const fn king_target_file(self) -> u8 {
        match self {
            CastleSide::Kingside => 6,
            CastleSide::Queenside => 2,
        }
    }

    /// File the king passes through, which is also where the rook lands.
    #[inline]
    pub const fn rook_target_file(self) -> u8 {
        match self {
            CastleSide::Kingside => 5,
            CastleSide::Queenside => 3,
        }
    }

    /// Classify a king move by its file delta; `None` for anything but a two-file hop.
    #[inline]
    pub const fn from_king_hop(from_file: u8, to_file: u8) -> Option<Self> {
        if from_file != KING_HOME_FILE {
            return None;
        }
        match to_file {
            6 => Some(CastleSide::Kingside),
            2 => Some(CastleSide::Queenside),
            _ => None,
        }
    }
}
