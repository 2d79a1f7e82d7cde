//! Non-blocking lifecycle of one move request to an external move-source.
//!
//! `start` snapshots the position and sends; `tick` polls once and either
//! keeps waiting, resends after a missed deadline, or resolves. A resolved
//! reply is validated against the snapshot, never the live board, and nothing
//! here mutates game state.

use tracing::{debug, info, warn};

use crate::engines::difficulty::{ms_to_ticks, Difficulty, DifficultyParams};
use crate::engines::engine_trait::{MoveRequest, PollStatus, RequestHandle, Transport};
use crate::engines::response_parser::parse_response;
use crate::errors::{ChessError, ChessResult};
use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_generator::{is_legal, move_for};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Idle,
    AwaitingResponse { handle: RequestHandle },
}

/// A validated reply, ready to announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineMove {
    pub mv: Move,
    pub evaluation_cp: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// No request in flight.
    Idle,
    Pending,
    Completed(EngineMove),
    Failed(ChessError),
}

#[derive(Debug)]
pub struct EngineRequest {
    phase: RequestPhase,
    tick_interval_ms: u64,
    snapshot: Option<Position>,
    request: Option<MoveRequest>,
    difficulty: Difficulty,
    params: DifficultyParams,
    attempt: u32,
    deadline: u64,
}

impl EngineRequest {
    pub fn new(tick_interval_ms: u64) -> Self {
        let difficulty = Difficulty::Medium;
        Self {
            phase: RequestPhase::Idle,
            tick_interval_ms,
            snapshot: None,
            request: None,
            difficulty,
            params: difficulty.default_params(),
            attempt: 0,
            deadline: 0,
        }
    }

    #[inline]
    pub fn phase(&self) -> RequestPhase {
        self.phase
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self.phase, RequestPhase::AwaitingResponse { .. })
    }

    #[inline]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Side the in-flight (or last) request was made for.
    pub fn requester(&self) -> Option<Color> {
        self.snapshot.map(|p| p.side_to_move())
    }

    fn timeout_ticks(&self) -> u64 {
        ms_to_ticks(self.params.timeout_ms, self.tick_interval_ms)
    }

    /// Snapshot `position` and send the first attempt. Any request already in
    /// flight is cancelled first.
    pub fn start(
        &mut self,
        position: &Position,
        difficulty: Difficulty,
        params: DifficultyParams,
        tick: u64,
        transport: &mut dyn Transport,
    ) -> ChessResult<()> {
        self.reset(transport);

        let request = MoveRequest {
            fen: position.get_fen(),
            depth: params.search_depth,
        };
        self.snapshot = Some(*position);
        self.difficulty = difficulty;
        self.params = params;
        self.attempt = 1;

        let handle = transport.send(&request)?;
        self.deadline = tick + self.timeout_ticks();
        self.phase = RequestPhase::AwaitingResponse { handle };
        info!(
            %difficulty,
            depth = params.search_depth,
            deadline = self.deadline,
            fen = %request.fen,
            "move request sent"
        );
        self.request = Some(request);
        Ok(())
    }

    pub fn tick(&mut self, tick: u64, transport: &mut dyn Transport) -> RequestOutcome {
        let RequestPhase::AwaitingResponse { handle } = self.phase else {
            return RequestOutcome::Idle;
        };

        match transport.poll(handle) {
            PollStatus::Ready(raw) => {
                self.phase = RequestPhase::Idle;
                match self.validate(&raw) {
                    Ok(engine_move) => {
                        info!(mv = %engine_move.mv, eval = ?engine_move.evaluation_cp, "move request completed");
                        RequestOutcome::Completed(engine_move)
                    }
                    Err(err) => {
                        warn!(%err, "move request rejected");
                        RequestOutcome::Failed(err)
                    }
                }
            }
            PollStatus::Closed => {
                self.phase = RequestPhase::Idle;
                let err = ChessError::Transport {
                    message: format!("request {} closed without a reply", handle.0),
                };
                warn!(%err, "move request failed");
                RequestOutcome::Failed(err)
            }
            PollStatus::Pending if tick < self.deadline => RequestOutcome::Pending,
            PollStatus::Pending => self.on_deadline(handle, tick, transport),
        }
    }

    fn on_deadline(
        &mut self,
        handle: RequestHandle,
        tick: u64,
        transport: &mut dyn Transport,
    ) -> RequestOutcome {
        transport.cancel(handle);
        self.phase = RequestPhase::Idle;

        if self.attempt >= self.params.max_attempts {
            let err = ChessError::RequestTimeout {
                attempts: self.attempt,
            };
            warn!(%err, "move request gave up");
            return RequestOutcome::Failed(err);
        }

        let Some(request) = self.request.as_ref() else {
            return RequestOutcome::Failed(ChessError::Transport {
                message: "no request to resend".to_owned(),
            });
        };
        self.attempt += 1;
        match transport.send(request) {
            Ok(handle) => {
                self.deadline = tick + self.timeout_ticks();
                self.phase = RequestPhase::AwaitingResponse { handle };
                debug!(attempt = self.attempt, deadline = self.deadline, "move request resent");
                RequestOutcome::Pending
            }
            Err(err) => {
                warn!(%err, attempt = self.attempt, "move request resend failed");
                RequestOutcome::Failed(err)
            }
        }
    }

    /// Decode, then check ownership, then legality, all against the snapshot.
    fn validate(&self, raw: &str) -> ChessResult<EngineMove> {
        let parsed = parse_response(raw)?;
        let snapshot = self
            .snapshot
            .as_ref()
            .ok_or_else(|| ChessError::MalformedResponse {
                reason: "reply without a request".to_owned(),
            })?;

        let requester = snapshot.side_to_move();
        let (from, to) = (parsed.mv.from, parsed.mv.to);
        if let Some(piece) = snapshot.board.piece_at(from) {
            if piece.color != requester {
                return Err(ChessError::WrongMover {
                    square: from,
                    expected: requester,
                });
            }
        }
        if !is_legal(snapshot, parsed.mv) {
            return Err(ChessError::IllegalMove { from, to });
        }

        Ok(EngineMove {
            mv: move_for(snapshot, from, to),
            evaluation_cp: parsed.evaluation_cp,
        })
    }

    /// Drop any in-flight request. Late replies for it are never read.
    pub fn reset(&mut self, transport: &mut dyn Transport) {
        if let RequestPhase::AwaitingResponse { handle } = self.phase {
            transport.cancel(handle);
            debug!(handle = handle.0, "move request cancelled");
        }
        self.phase = RequestPhase::Idle;
        self.request = None;
        self.attempt = 0;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{EngineRequest, RequestOutcome, RequestPhase};
    use crate::engines::difficulty::{Difficulty, DifficultyParams};
    use crate::engines::engine_trait::{MoveRequest, PollStatus, RequestHandle, Transport};
    use crate::errors::{ChessError, ChessResult};
    use crate::game_state::chess_types::{Color, PieceKind, Position};

    const TICK_MS: u64 = 50;

    /// Replies are queued per send; a send with no queued reply never answers.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Vec<Option<String>>,
        live: HashMap<u64, Option<String>>,
        sent: Vec<MoveRequest>,
        cancelled: Vec<RequestHandle>,
        fail_send: bool,
    }

    impl ScriptedTransport {
        fn replying(replies: &[Option<&str>]) -> Self {
            Self {
                replies: replies.iter().rev().map(|&r| r.map(str::to_owned)).collect(),
                ..Self::default()
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&mut self, request: &MoveRequest) -> ChessResult<RequestHandle> {
            if self.fail_send {
                return Err(ChessError::Transport {
                    message: "offline".to_owned(),
                });
            }
            let id = self.sent.len() as u64 + 1;
            self.sent.push(request.clone());
            self.live.insert(id, self.replies.pop().flatten());
            Ok(RequestHandle(id))
        }

        fn poll(&mut self, handle: RequestHandle) -> PollStatus {
            match self.live.get(&handle.0) {
                Some(Some(body)) => PollStatus::Ready(body.clone()),
                Some(None) => PollStatus::Pending,
                None => PollStatus::Closed,
            }
        }

        fn cancel(&mut self, handle: RequestHandle) {
            self.live.remove(&handle.0);
            self.cancelled.push(handle);
        }
    }

    fn quick(max_attempts: u32) -> DifficultyParams {
        DifficultyParams {
            search_depth: 4,
            timeout_ms: 100,
            max_attempts,
        }
    }

    fn started(transport: &mut ScriptedTransport, params: DifficultyParams) -> EngineRequest {
        let mut request = EngineRequest::new(TICK_MS);
        request
            .start(&Position::new_game(), Difficulty::Easy, params, 0, transport)
            .expect("send should succeed");
        request
    }

    #[test]
    fn valid_reply_completes_with_evaluation() {
        let mut transport =
            ScriptedTransport::replying(&[Some(r#"{"success":true,"bestmove":"e2e4","evaluation":0.2}"#)]);
        let mut request = started(&mut transport, quick(2));
        assert_eq!(transport.sent[0].depth, 4);
        assert_eq!(request.requester(), Some(Color::White));

        let RequestOutcome::Completed(engine_move) = request.tick(1, &mut transport) else {
            panic!("reply should complete the request");
        };
        assert_eq!(engine_move.mv.to_string(), "e2e4");
        assert_eq!(engine_move.evaluation_cp, Some(20));
        assert_eq!(request.phase(), RequestPhase::Idle);
        assert_eq!(request.tick(2, &mut transport), RequestOutcome::Idle);
    }

    #[test]
    fn reply_moving_opponent_piece_is_wrong_mover() {
        let position = Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 1")
            .expect("test FEN should parse");
        let before = position;
        let mut transport = ScriptedTransport::replying(&[Some(r#"{"bestmove":"e7e5"}"#)]);
        let mut request = EngineRequest::new(TICK_MS);
        request
            .start(&position, Difficulty::Easy, quick(2), 0, &mut transport)
            .expect("send should succeed");

        let outcome = request.tick(1, &mut transport);
        assert!(matches!(
            outcome,
            RequestOutcome::Failed(ChessError::WrongMover {
                expected: Color::White,
                ..
            })
        ));
        assert_eq!(position, before);
        assert!(!request.is_active());
    }

    #[test]
    fn own_piece_illegal_destination_is_illegal_move() {
        let mut transport = ScriptedTransport::replying(&[Some(r#"{"bestmove":"e2e5"}"#)]);
        let mut request = started(&mut transport, quick(2));
        assert!(matches!(
            request.tick(1, &mut transport),
            RequestOutcome::Failed(ChessError::IllegalMove { .. })
        ));
    }

    #[test]
    fn unparsable_reply_is_malformed() {
        let mut transport = ScriptedTransport::replying(&[Some("{\"success\":false}")]);
        let mut request = started(&mut transport, quick(2));
        assert!(matches!(
            request.tick(1, &mut transport),
            RequestOutcome::Failed(ChessError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn promotion_reply_becomes_queen() {
        let position = Position::from_fen("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1").expect("test FEN should parse");
        let mut transport = ScriptedTransport::replying(&[Some(r#"{"move":"b7b8n"}"#)]);
        let mut request = EngineRequest::new(TICK_MS);
        request
            .start(&position, Difficulty::Easy, quick(1), 0, &mut transport)
            .expect("send should succeed");
        let RequestOutcome::Completed(engine_move) = request.tick(1, &mut transport) else {
            panic!("promotion should complete");
        };
        assert_eq!(engine_move.mv.promotion, Some(PieceKind::Queen));
    }

    #[test]
    fn deadline_resends_then_times_out() {
        // 100 ms at 50 ms per tick: deadline two ticks after each send.
        let mut transport = ScriptedTransport::replying(&[None, None]);
        let mut request = started(&mut transport, quick(2));

        assert_eq!(request.tick(1, &mut transport), RequestOutcome::Pending);
        assert_eq!(request.tick(2, &mut transport), RequestOutcome::Pending);
        assert_eq!(transport.sent.len(), 2);
        assert_eq!(transport.cancelled, vec![RequestHandle(1)]);
        assert_eq!(request.attempt(), 2);

        assert_eq!(request.tick(3, &mut transport), RequestOutcome::Pending);
        assert_eq!(
            request.tick(4, &mut transport),
            RequestOutcome::Failed(ChessError::RequestTimeout { attempts: 2 })
        );
        assert_eq!(transport.cancelled.len(), 2);
        assert!(!request.is_active());
    }

    #[test]
    fn second_attempt_can_still_answer() {
        let mut transport = ScriptedTransport::replying(&[None, Some(r#"{"bestmove":"g1f3"}"#)]);
        let mut request = started(&mut transport, quick(3));
        assert_eq!(request.tick(2, &mut transport), RequestOutcome::Pending);
        assert!(matches!(
            request.tick(3, &mut transport),
            RequestOutcome::Completed(_)
        ));
    }

    #[test]
    fn closed_handle_fails_with_transport_error() {
        let mut transport = ScriptedTransport::replying(&[None]);
        let mut request = started(&mut transport, quick(2));
        transport.live.clear();
        assert!(matches!(
            request.tick(1, &mut transport),
            RequestOutcome::Failed(ChessError::Transport { .. })
        ));
    }

    #[test]
    fn send_failure_leaves_request_idle() {
        let mut transport = ScriptedTransport {
            fail_send: true,
            ..ScriptedTransport::default()
        };
        let mut request = EngineRequest::new(TICK_MS);
        let result = request.start(&Position::new_game(), Difficulty::Hard, quick(2), 0, &mut transport);
        assert!(matches!(result, Err(ChessError::Transport { .. })));
        assert!(!request.is_active());
    }

    #[test]
    fn reset_cancels_in_flight_request() {
        let mut transport = ScriptedTransport::replying(&[None]);
        let mut request = started(&mut transport, quick(2));
        request.reset(&mut transport);
        assert_eq!(transport.cancelled, vec![RequestHandle(1)]);
        assert_eq!(request.tick(5, &mut transport), RequestOutcome::Idle);
    }
}
