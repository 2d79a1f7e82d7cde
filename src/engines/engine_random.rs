//! Offline move-source: answers each request with a uniformly random legal
//! move after a fixed number of polls.
//!
//! Replies use the same JSON shape a remote source would send, so they go
//! through the ordinary response validation.

use std::collections::HashMap;

use rand::prelude::IndexedRandom;
use serde_json::json;
use tracing::debug;

use crate::engines::engine_trait::{MoveRequest, PollStatus, RequestHandle, Transport};
use crate::errors::{ChessError, ChessResult};
use crate::game_state::chess_types::Position;
use crate::move_generation::legal_move_generator::legal_moves;

struct PendingReply {
    polls_left: u64,
    body: String,
}

pub struct LocalEngineTransport {
    latency_polls: u64,
    next_handle: u64,
    pending: HashMap<u64, PendingReply>,
}

impl LocalEngineTransport {
    /// `latency_polls` polls return `Pending` before the reply is ready.
    pub fn new(latency_polls: u64) -> Self {
        Self {
            latency_polls,
            next_handle: 1,
            pending: HashMap::new(),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Answer a JSON request body the way a remote source would.
    fn reply_for(payload: &str) -> ChessResult<String> {
        let request = MoveRequest::from_json(payload)?;
        let position = Position::from_fen(&request.fen).map_err(|e| ChessError::Transport {
            message: e.to_string(),
        })?;
        let moves = legal_moves(&position);
        debug!(legal_moves = moves.len(), depth = request.depth, "local engine choosing");

        let mut rng = rand::rng();
        let body = match moves.as_slice().choose(&mut rng) {
            Some(mv) => json!({
                "success": true,
                "bestmove": mv.to_string(),
                "depth": request.depth,
            }),
            None => json!({ "success": false, "error": "no legal moves" }),
        };
        Ok(body.to_string())
    }
}

impl Default for LocalEngineTransport {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Transport for LocalEngineTransport {
    fn send(&mut self, request: &MoveRequest) -> ChessResult<RequestHandle> {
        let body = Self::reply_for(&request.to_json()?)?;
        let handle = RequestHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.insert(
            handle.0,
            PendingReply {
                polls_left: self.latency_polls,
                body,
            },
        );
        Ok(handle)
    }

    fn poll(&mut self, handle: RequestHandle) -> PollStatus {
        let Some(reply) = self.pending.get_mut(&handle.0) else {
            return PollStatus::Closed;
        };
        if reply.polls_left > 0 {
            reply.polls_left -= 1;
            return PollStatus::Pending;
        }
        match self.pending.remove(&handle.0) {
            Some(reply) => PollStatus::Ready(reply.body),
            None => PollStatus::Closed,
        }
    }

    fn cancel(&mut self, handle: RequestHandle) {
        self.pending.remove(&handle.0);
    }
}

#[cfg(test)]
mod tests {
    use super::LocalEngineTransport;
    use crate::engines::engine_trait::{MoveRequest, PollStatus, Transport};
    use crate::engines::response_parser::parse_response;
    use crate::game_state::chess_types::Position;
    use crate::move_generation::legal_move_generator::is_legal;

    fn request_for(fen: &str) -> MoveRequest {
        MoveRequest {
            fen: fen.to_owned(),
            depth: 5,
        }
    }

    #[test]
    fn replies_with_a_legal_move_after_latency() {
        let position = Position::new_game();
        let mut transport = LocalEngineTransport::new(2);
        let handle = transport
            .send(&request_for(&position.get_fen()))
            .expect("start FEN should be accepted");

        assert_eq!(transport.poll(handle), PollStatus::Pending);
        assert_eq!(transport.poll(handle), PollStatus::Pending);
        let PollStatus::Ready(body) = transport.poll(handle) else {
            panic!("reply should be ready after the latency");
        };
        let parsed = parse_response(&body).expect("local reply should parse");
        assert!(is_legal(&position, parsed.mv));
        assert_eq!(transport.poll(handle), PollStatus::Closed);
    }

    #[test]
    fn mated_side_gets_a_failure_reply() {
        let mut transport = LocalEngineTransport::default();
        let handle = transport
            .send(&request_for(
                "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
            ))
            .expect("FEN should be accepted");
        let PollStatus::Ready(body) = transport.poll(handle) else {
            panic!("zero latency replies at once");
        };
        assert!(parse_response(&body).is_err());
    }

    #[test]
    fn bad_fen_and_cancel() {
        let mut transport = LocalEngineTransport::new(5);
        assert!(transport.send(&request_for("not a fen")).is_err());

        let handle = transport
            .send(&request_for(&Position::new_game().get_fen()))
            .expect("start FEN should be accepted");
        assert_eq!(transport.in_flight(), 1);
        transport.cancel(handle);
        assert_eq!(transport.in_flight(), 0);
        assert_eq!(transport.poll(handle), PollStatus::Closed);
    }
}
