//! Crate-wide error taxonomy.
//!
//! None of these are fatal: every failure path leaves the board and game state
//! as they were before the failing call.

use thiserror::Error;

use crate::game_state::chess_types::{Color, Square};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    /// Destination is not in the legal set for the piece on `from`.
    #[error("illegal move {from}{to}")]
    IllegalMove { from: Square, to: Square },

    /// Undo requested with an empty move log.
    #[error("no move to undo")]
    NoHistory,

    /// External move-source returned something that is not a usable move.
    #[error("malformed move-source response: {reason}")]
    MalformedResponse { reason: String },

    /// External move-source proposed moving a piece the requester does not own.
    #[error("move from {square} does not belong to {expected}")]
    WrongMover { square: Square, expected: Color },

    /// Request deadline passed with no attempts left.
    #[error("move request timed out after {attempts} attempt(s)")]
    RequestTimeout { attempts: u32 },

    /// Both kings sensed absent at once.
    #[error("both kings lifted from {white_king} and {black_king}")]
    SensorAmbiguity {
        white_king: Square,
        black_king: Square,
    },

    #[error("invalid FEN: {reason}")]
    InvalidFen { reason: String },

    #[error("invalid square `{text}`")]
    InvalidSquare { text: String },

    #[error("invalid move string `{text}`")]
    InvalidMoveString { text: String },

    /// Transport could not send or lost the request.
    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

pub type ChessResult<T> = Result<T, ChessError>;
