//! Move acquisition: reconciling logical moves with physical sensor changes.
//!
//! One parameterised state machine serves both move sources:
//!
//! * `Human`: `Idle -> SourceSelected -> (AwaitingPlacement) -> commit`
//! * `Engine`: `Idle -> Announced -> AwaitingPickup -> AwaitingPlacement -> commit`
//!
//! After a commit the session may stay alive in `Settling` while the board
//! still owes physical follow-ups (queen swap, castling rook, en-passant
//! victim). Every tick reads one snapshot, diffs it against the previous one,
//! performs at most one transition, and returns. Nothing here blocks.
//!
//! Independent of the session, every tick checks whether both kings have left
//! their squares; that aborts the session and raises a reset request.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::acquisition::board_io::{is_present, sensor_changes, BoardIo, SensorChange, SensorSnapshot};
use crate::acquisition::indicator::{IndicatorColor, IndicatorTimer};
use crate::errors::{ChessError, ChessResult};
use crate::game_state::chess_types::*;
use crate::game_state::move_history::{MoveHistory, MoveRecord, SpecialMove};
use crate::move_generation::legal_move_apply::commit_move;
use crate::move_generation::legal_move_generator::{legal_destinations, move_for};
use crate::move_generation::legal_moves_king::castle_rook_squares;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSource {
    Human,
    Engine,
}

/// Physical work still owed after a logical commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    /// Pawn lifted from `square`, then a queen placed there.
    PromotionSwap { square: Square, pawn_lifted: bool },
    /// Rook leaves `from` and stands on `to`, in either order.
    RookRelocation { from: Square, to: Square },
    /// En-passant victim removed from `square`.
    CapturedPawnRemoval { square: Square },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FollowUpProgress {
    Waiting,
    Advanced,
    Done,
}

impl FollowUp {
    /// Level-triggered: looks at presence, not at edges, so work done ahead of
    /// time (e.g. the victim pawn removed before the capture) still counts.
    fn progress(&mut self, snapshot: &SensorSnapshot) -> FollowUpProgress {
        match self {
            FollowUp::CapturedPawnRemoval { square } => {
                if is_present(snapshot, *square) {
                    FollowUpProgress::Waiting
                } else {
                    FollowUpProgress::Done
                }
            }
            FollowUp::RookRelocation { from, to } => {
                if !is_present(snapshot, *from) && is_present(snapshot, *to) {
                    FollowUpProgress::Done
                } else {
                    FollowUpProgress::Waiting
                }
            }
            FollowUp::PromotionSwap {
                square,
                pawn_lifted,
            } => match (*pawn_lifted, is_present(snapshot, *square)) {
                (false, false) => {
                    *pawn_lifted = true;
                    FollowUpProgress::Advanced
                }
                (true, true) => FollowUpProgress::Done,
                _ => FollowUpProgress::Waiting,
            },
        }
    }

    fn squares(&self) -> Vec<Square> {
        match *self {
            FollowUp::PromotionSwap { square, .. } => vec![square],
            FollowUp::RookRelocation { from, to } => vec![from, to],
            FollowUp::CapturedPawnRemoval { square } => vec![square],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionPhase {
    SourceSelected,
    Announced,
    AwaitingPickup,
    AwaitingPlacement { destination: Square },
    Settling { follow_ups: VecDeque<FollowUp> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionSession {
    pub source: MoveSource,
    pub origin: Square,
    /// Legal destinations captured when the session started.
    pub candidates: u64,
    /// Known once the destination is fixed (immediately for engine moves).
    pub expected_move: Option<Move>,
    pub phase: AcquisitionPhase,
    pub indicator_timer: IndicatorTimer,
    /// Square where a piece was set down illegally, until it is lifted again.
    pub rejected: Option<Square>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionEvent {
    Nothing,
    PieceLifted { square: Square },
    /// Human put the lifted piece back; session dropped.
    Replaced { square: Square },
    /// Engine move: the piece went back on its origin before being placed.
    PickupReverted { square: Square },
    CaptureStarted { square: Square },
    Announced { mv: Move },
    Committed(MoveRecord),
    Rejected(ChessError),
    FollowUpProgress,
    Settled,
    ResetRequested(ChessError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ConfirmFlash {
    squares: [Square; 2],
    until_tick: u64,
}

#[derive(Debug, Clone)]
pub struct MoveAcquisition {
    session: Option<AcquisitionSession>,
    previous: Option<SensorSnapshot>,
    kings_lifted: bool,
    flash: Option<ConfirmFlash>,
    blink_ticks: u64,
    confirm_ticks: u64,
}

impl MoveAcquisition {
    pub fn new(blink_ticks: u64, confirm_ticks: u64) -> Self {
        Self {
            session: None,
            previous: None,
            kings_lifted: false,
            flash: None,
            blink_ticks: blink_ticks.max(1),
            confirm_ticks,
        }
    }

    #[inline]
    pub fn session(&self) -> Option<&AcquisitionSession> {
        self.session.as_ref()
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.session.is_none()
    }

    /// True while both kings are off the board.
    #[inline]
    pub fn is_halted(&self) -> bool {
        self.kings_lifted
    }

    /// Drop any live session without touching the board.
    pub fn abort(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(origin = %session.origin, "acquisition session aborted");
        }
        self.flash = None;
    }

    /// Use `snapshot` as the baseline for the next diff.
    pub fn resync(&mut self, snapshot: SensorSnapshot) {
        self.previous = Some(snapshot);
    }

    /// Present an externally-sourced move for the human to carry out.
    pub fn announce(&mut self, mv: Move, position: &Position, tick: u64) -> ChessResult<()> {
        if self.session.is_some() || self.kings_lifted {
            return Err(ChessError::IllegalMove {
                from: mv.from,
                to: mv.to,
            });
        }
        if !position.board.is_color(mv.from, position.side_to_move()) {
            return Err(ChessError::WrongMover {
                square: mv.from,
                expected: position.side_to_move(),
            });
        }

        info!(%mv, "announcing move");
        self.session = Some(AcquisitionSession {
            source: MoveSource::Engine,
            origin: mv.from,
            candidates: mv.to.mask(),
            expected_move: Some(mv),
            phase: AcquisitionPhase::Announced,
            indicator_timer: IndicatorTimer::new(self.blink_ticks, tick),
            rejected: None,
        });
        Ok(())
    }

    /// Advance the protocol by at most one transition.
    ///
    /// `allow_pickup` gates starting a new human session (false on an engine
    /// turn or once the game is over); sessions already live keep running.
    pub fn tick(
        &mut self,
        tick: u64,
        snapshot: &SensorSnapshot,
        position: &mut Position,
        history: &mut MoveHistory,
        io: &mut dyn BoardIo,
        allow_pickup: bool,
    ) -> AcquisitionEvent {
        let previous = self.previous.unwrap_or(*snapshot);
        self.previous = Some(*snapshot);
        let changes = sensor_changes(&previous, snapshot);

        if let Some(event) = self.check_kings(snapshot, position, io) {
            return event;
        }
        if self.kings_lifted {
            return AcquisitionEvent::Nothing;
        }

        let mut redraw = self.expire_flash(tick);
        if let Some(session) = self.session.as_mut() {
            redraw |= session.indicator_timer.advance(tick);
        }

        let event = match self.session.take() {
            None => self.tick_idle(tick, &changes, position, allow_pickup),
            Some(session) => self.tick_session(session, tick, snapshot, &changes, position, history),
        };

        if redraw || event != AcquisitionEvent::Nothing {
            self.render(position, io);
        }
        event
    }

    fn check_kings(
        &mut self,
        snapshot: &SensorSnapshot,
        position: &Position,
        io: &mut dyn BoardIo,
    ) -> Option<AcquisitionEvent> {
        let (Some(white_king), Some(black_king)) = (
            position.board.king_square(Color::White),
            position.board.king_square(Color::Black),
        ) else {
            return None;
        };

        let both_absent = !is_present(snapshot, white_king) && !is_present(snapshot, black_king);
        if both_absent && !self.kings_lifted {
            self.kings_lifted = true;
            self.abort();
            warn!(%white_king, %black_king, "both kings lifted, requesting reset");
            self.render(position, io);
            return Some(AcquisitionEvent::ResetRequested(ChessError::SensorAmbiguity {
                white_king,
                black_king,
            }));
        }
        if !both_absent && self.kings_lifted {
            self.kings_lifted = false;
            info!("kings back on the board");
            self.render(position, io);
        }
        None
    }

    fn expire_flash(&mut self, tick: u64) -> bool {
        match self.flash {
            Some(flash) if tick >= flash.until_tick => {
                self.flash = None;
                true
            }
            _ => false,
        }
    }

    fn tick_idle(
        &mut self,
        tick: u64,
        changes: &[(Square, SensorChange)],
        position: &Position,
        allow_pickup: bool,
    ) -> AcquisitionEvent {
        if !allow_pickup {
            return AcquisitionEvent::Nothing;
        }
        let side = position.side_to_move();
        let lifted = changes.iter().find(|(sq, change)| {
            *change == SensorChange::Lifted && position.board.is_color(*sq, side)
        });
        let Some(&(origin, _)) = lifted else {
            return AcquisitionEvent::Nothing;
        };

        let candidates = legal_destinations(position, origin);
        debug!(%origin, destinations = candidates.count_ones(), "piece lifted");
        self.session = Some(AcquisitionSession {
            source: MoveSource::Human,
            origin,
            candidates,
            expected_move: None,
            phase: AcquisitionPhase::SourceSelected,
            indicator_timer: IndicatorTimer::new(self.blink_ticks, tick),
            rejected: None,
        });
        AcquisitionEvent::PieceLifted { square: origin }
    }

    fn tick_session(
        &mut self,
        mut session: AcquisitionSession,
        tick: u64,
        snapshot: &SensorSnapshot,
        changes: &[(Square, SensorChange)],
        position: &mut Position,
        history: &mut MoveHistory,
    ) -> AcquisitionEvent {
        if let Some(rejected) = session.rejected {
            if changes.contains(&(rejected, SensorChange::Lifted)) {
                session.rejected = None;
            }
        }

        let phase = std::mem::replace(&mut session.phase, AcquisitionPhase::SourceSelected);
        match phase {
            AcquisitionPhase::SourceSelected => {
                self.source_selected(session, tick, changes, position, history)
            }
            AcquisitionPhase::Announced => {
                session.phase = AcquisitionPhase::AwaitingPickup;
                session.indicator_timer.restart(tick);
                // A piece already off its origin counts as picked up.
                Self::pick_up_if_lifted(&mut session, snapshot);
                let mv = session.expected_move;
                self.session = Some(session);
                match mv {
                    Some(mv) => AcquisitionEvent::Announced { mv },
                    None => AcquisitionEvent::Nothing,
                }
            }
            AcquisitionPhase::AwaitingPickup => {
                session.phase = AcquisitionPhase::AwaitingPickup;
                let origin = session.origin;
                let picked_up = Self::pick_up_if_lifted(&mut session, snapshot);
                self.session = Some(session);
                if picked_up {
                    AcquisitionEvent::PieceLifted { square: origin }
                } else {
                    AcquisitionEvent::Nothing
                }
            }
            AcquisitionPhase::AwaitingPlacement { destination } => {
                session.phase = AcquisitionPhase::AwaitingPlacement { destination };
                self.awaiting_placement(session, destination, tick, changes, position, history)
            }
            AcquisitionPhase::Settling { follow_ups } => {
                self.settling(session, follow_ups, snapshot)
            }
        }
    }

    /// Level-triggered: moves to `AwaitingPlacement` whenever the origin reads
    /// empty, whether or not the lift was seen as an edge.
    fn pick_up_if_lifted(session: &mut AcquisitionSession, snapshot: &SensorSnapshot) -> bool {
        let origin = session.origin;
        let Some(mv) = session.expected_move else {
            return false;
        };
        if is_present(snapshot, origin) {
            return false;
        }
        session.phase = AcquisitionPhase::AwaitingPlacement { destination: mv.to };
        debug!(%origin, "announced piece picked up");
        true
    }

    fn source_selected(
        &mut self,
        mut session: AcquisitionSession,
        tick: u64,
        changes: &[(Square, SensorChange)],
        position: &mut Position,
        history: &mut MoveHistory,
    ) -> AcquisitionEvent {
        let origin = session.origin;
        if changes.contains(&(origin, SensorChange::Placed)) {
            debug!(%origin, "piece replaced on origin");
            return AcquisitionEvent::Replaced { square: origin };
        }

        let opponent = position.side_to_move().opposite();
        for &(square, change) in changes {
            let is_candidate = session.candidates & square.mask() != 0;
            match change {
                SensorChange::Lifted if is_candidate && position.board.is_color(square, opponent) => {
                    session.phase = AcquisitionPhase::AwaitingPlacement {
                        destination: square,
                    };
                    session.expected_move = Some(move_for(position, origin, square));
                    debug!(%origin, target = %square, "capture started");
                    self.session = Some(session);
                    return AcquisitionEvent::CaptureStarted { square };
                }
                SensorChange::Placed if is_candidate => {
                    let mv = move_for(position, origin, square);
                    return self.commit(session, mv, tick, position, history);
                }
                SensorChange::Placed if position.board.is_empty(square) => {
                    return self.reject(session, square);
                }
                // Re-seated piece on an occupied square: sensor noise.
                SensorChange::Placed | SensorChange::Lifted => {}
            }
        }

        session.phase = AcquisitionPhase::SourceSelected;
        self.session = Some(session);
        AcquisitionEvent::Nothing
    }

    fn awaiting_placement(
        &mut self,
        mut session: AcquisitionSession,
        destination: Square,
        tick: u64,
        changes: &[(Square, SensorChange)],
        position: &mut Position,
        history: &mut MoveHistory,
    ) -> AcquisitionEvent {
        let origin = session.origin;
        if changes.contains(&(origin, SensorChange::Placed)) {
            return match session.source {
                MoveSource::Human => {
                    debug!(%origin, "capture abandoned, piece replaced");
                    AcquisitionEvent::Replaced { square: origin }
                }
                MoveSource::Engine => {
                    debug!(%origin, "announced piece put back, awaiting pickup");
                    session.phase = AcquisitionPhase::AwaitingPickup;
                    session.indicator_timer.restart(tick);
                    self.session = Some(session);
                    AcquisitionEvent::PickupReverted { square: origin }
                }
            };
        }

        for &(square, change) in changes {
            if change != SensorChange::Placed {
                continue;
            }
            if square == destination {
                let mv = session
                    .expected_move
                    .unwrap_or_else(|| move_for(position, origin, destination));
                return self.commit(session, mv, tick, position, history);
            }
            if position.board.is_empty(square) {
                return self.reject(session, square);
            }
        }

        self.session = Some(session);
        AcquisitionEvent::Nothing
    }

    fn reject(&mut self, mut session: AcquisitionSession, square: Square) -> AcquisitionEvent {
        warn!(origin = %session.origin, %square, "piece placed on an illegal square");
        session.rejected = Some(square);
        let origin = session.origin;
        self.session = Some(session);
        AcquisitionEvent::Rejected(ChessError::IllegalMove {
            from: origin,
            to: square,
        })
    }

    fn commit(
        &mut self,
        session: AcquisitionSession,
        mv: Move,
        tick: u64,
        position: &mut Position,
        history: &mut MoveHistory,
    ) -> AcquisitionEvent {
        let record = match commit_move(position, mv) {
            Ok(record) => record,
            Err(err) => {
                warn!(%mv, error = %err, "commit refused");
                self.session = Some(session);
                return AcquisitionEvent::Rejected(err);
            }
        };
        history.record(record);
        info!(%mv, source = ?session.source, "move committed");

        self.flash = Some(ConfirmFlash {
            squares: [record.from, record.to],
            until_tick: tick + self.confirm_ticks,
        });

        let follow_ups = follow_ups_for(&record);
        if !follow_ups.is_empty() {
            self.session = Some(AcquisitionSession {
                phase: AcquisitionPhase::Settling { follow_ups },
                candidates: 0,
                rejected: None,
                ..session
            });
        }
        AcquisitionEvent::Committed(record)
    }

    fn settling(
        &mut self,
        mut session: AcquisitionSession,
        mut follow_ups: VecDeque<FollowUp>,
        snapshot: &SensorSnapshot,
    ) -> AcquisitionEvent {
        let progress = match follow_ups.front_mut() {
            Some(front) => front.progress(snapshot),
            None => return AcquisitionEvent::Settled,
        };

        let event = match progress {
            FollowUpProgress::Waiting => AcquisitionEvent::Nothing,
            FollowUpProgress::Advanced => AcquisitionEvent::FollowUpProgress,
            FollowUpProgress::Done => {
                follow_ups.pop_front();
                if follow_ups.is_empty() {
                    debug!("board settled");
                    return AcquisitionEvent::Settled;
                }
                AcquisitionEvent::FollowUpProgress
            }
        };

        session.phase = AcquisitionPhase::Settling { follow_ups };
        self.session = Some(session);
        event
    }

    fn render(&self, position: &Position, io: &mut dyn BoardIo) {
        io.clear_indicators();

        if self.kings_lifted {
            for square in Square::all() {
                io.set_indicator(square, IndicatorColor::HALT);
            }
            io.show();
            return;
        }

        if let Some(flash) = self.flash {
            for square in flash.squares {
                io.set_indicator(square, IndicatorColor::CONFIRM);
            }
        }

        if let Some(session) = &self.session {
            let lit = session.indicator_timer.lit();
            match &session.phase {
                AcquisitionPhase::SourceSelected => {
                    let opponent = position.side_to_move().opposite();
                    for square in Square::iter_mask(session.candidates) {
                        let color = if position.board.is_color(square, opponent) {
                            IndicatorColor::CAPTURE
                        } else {
                            IndicatorColor::LEGAL_MOVE
                        };
                        io.set_indicator(square, color);
                    }
                    io.set_indicator(session.origin, IndicatorColor::ORIGIN);
                }
                AcquisitionPhase::Announced | AcquisitionPhase::AwaitingPickup => {
                    if let Some(mv) = session.expected_move {
                        io.set_indicator(mv.to, IndicatorColor::ANNOUNCE);
                    }
                    let origin_color = if lit {
                        IndicatorColor::ANNOUNCE
                    } else {
                        IndicatorColor::OFF
                    };
                    io.set_indicator(session.origin, origin_color);
                }
                AcquisitionPhase::AwaitingPlacement { destination } => {
                    io.set_indicator(session.origin, IndicatorColor::ORIGIN);
                    let color = match session.source {
                        MoveSource::Engine => IndicatorColor::ANNOUNCE,
                        MoveSource::Human if position.board.is_empty(*destination) => {
                            IndicatorColor::LEGAL_MOVE
                        }
                        MoveSource::Human => IndicatorColor::CAPTURE,
                    };
                    io.set_indicator(*destination, color);
                }
                AcquisitionPhase::Settling { follow_ups } => {
                    if let Some(front) = follow_ups.front() {
                        let color = if lit {
                            IndicatorColor::FOLLOW_UP
                        } else {
                            IndicatorColor::OFF
                        };
                        for square in front.squares() {
                            io.set_indicator(square, color);
                        }
                    }
                }
            }
            if let Some(rejected) = session.rejected {
                io.set_indicator(rejected, IndicatorColor::REJECT);
            }
        }

        io.show();
    }
}

/// Physical follow-ups owed after `record`, in the order they are indicated.
pub fn follow_ups_for(record: &MoveRecord) -> VecDeque<FollowUp> {
    let mut follow_ups = VecDeque::new();
    match record.special {
        SpecialMove::Castle(side) => {
            if let Some((from, to)) = castle_rook_squares(record.mover, side) {
                follow_ups.push_back(FollowUp::RookRelocation { from, to });
            }
        }
        SpecialMove::EnPassant { captured_square } => {
            follow_ups.push_back(FollowUp::CapturedPawnRemoval {
                square: captured_square,
            });
        }
        SpecialMove::None => {}
    }
    if record.promoted_to.is_some() {
        follow_ups.push_back(FollowUp::PromotionSwap {
            square: record.to,
            pawn_lifted: false,
        });
    }
    follow_ups
}
