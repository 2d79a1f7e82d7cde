//! Transport abstraction for external move-sources.
//!
//! The request lifecycle only needs to hand a position off, poll for a raw
//! reply once per tick, and drop a request it no longer wants. How the bytes
//! travel (HTTP, serial, in-process) is the implementor's business.

use serde::{Deserialize, Serialize};

use crate::errors::{ChessError, ChessResult};

/// Payload sent to the move-source: the position as FEN plus a search depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub fen: String,
    pub depth: u8,
}

impl MoveRequest {
    /// Wire body, `{"fen": "...", "depth": 8}`.
    pub fn to_json(&self) -> ChessResult<String> {
        serde_json::to_string(self).map_err(|e| ChessError::Transport {
            message: format!("cannot encode request: {e}"),
        })
    }

    pub fn from_json(body: &str) -> ChessResult<Self> {
        serde_json::from_str(body).map_err(|e| ChessError::Transport {
            message: format!("cannot decode request: {e}"),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    Pending,
    /// Raw response body, not yet validated.
    Ready(String),
    /// The transport gave up on the request (connection dropped, unknown handle).
    Closed,
}

pub trait Transport {
    fn send(&mut self, request: &MoveRequest) -> ChessResult<RequestHandle>;

    /// Non-blocking.
    fn poll(&mut self, handle: RequestHandle) -> PollStatus;

    /// Release whatever the transport holds for `handle`. Unknown handles are ignored.
    fn cancel(&mut self, handle: RequestHandle);
}
