//! One game on one board: rules state, history, the acquisition state
//! machine, and the engine request, advanced together once per tick.
//!
//! A tick after any position change (start, load, undo) only takes the
//! sensors as the new baseline. Otherwise it advances the acquisition
//! protocol and, when that produced nothing and no session is live, drives
//! the engine side for an engine-controlled side to move. At most one
//! `SessionEvent` comes out of each tick.
//!
//! While an engine request is in flight the four corner squares pulse.

use tracing::{debug, info, warn};

use crate::acquisition::board_io::BoardIo;
use crate::acquisition::indicator::{IndicatorColor, ThinkingPulse};
use crate::acquisition::move_acquisition::{AcquisitionEvent, MoveAcquisition};
use crate::config::{GameConfig, PlayerKind};
use crate::engines::difficulty::Difficulty;
use crate::engines::engine_request::{EngineRequest, RequestOutcome};
use crate::engines::engine_trait::Transport;
use crate::errors::{ChessError, ChessResult};
use crate::game_state::chess_types::*;
use crate::game_state::move_history::{MoveHistory, MoveRecord};
use crate::move_generation::legal_move_generator::classify;
use crate::utils::long_algebraic::compact_move_list;
use crate::utils::pgn::write_pgn;

fn thinking_corners() -> impl Iterator<Item = Square> {
    [(0, 0), (0, 7), (7, 0), (7, 7)]
        .into_iter()
        .filter_map(|(rank, file)| Square::new(rank, file))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Nothing,
    Acquisition(AcquisitionEvent),
    EngineRequested { side: Color, difficulty: Difficulty },
    EngineAnnounced { mv: Move, evaluation_cp: Option<i32> },
    /// Request failed; a fresh one follows after the retry delay.
    EngineFailed(ChessError),
}

#[derive(Debug)]
pub struct GameSession {
    config: GameConfig,
    position: Position,
    history: MoveHistory,
    acquisition: MoveAcquisition,
    engine: EngineRequest,
    status: GameStatus,
    evaluation_cp: Option<i32>,
    started: bool,
    resync_pending: bool,
    retry_at: Option<u64>,
    thinking: Option<ThinkingPulse>,
    tick: u64,
}

impl GameSession {
    pub fn new(config: GameConfig) -> ChessResult<Self> {
        config.validate()?;
        Ok(Self {
            position: Position::new_game(),
            history: MoveHistory::with_capacity(config.history_capacity),
            acquisition: MoveAcquisition::new(config.blink_ticks(), config.confirm_ticks()),
            engine: EngineRequest::new(config.tick_interval_ms),
            status: GameStatus::Continuing,
            evaluation_cp: None,
            started: false,
            resync_pending: true,
            retry_at: None,
            thinking: None,
            tick: 0,
            config,
        })
    }

    /// New game from the standard position; ticks do nothing until this is called.
    pub fn start(&mut self) {
        self.install(Position::new_game());
        self.started = true;
        info!(white = %self.config.white, black = %self.config.black, "game started");
    }

    /// Cancel everything and return to the standard position, stopped.
    pub fn reset(&mut self) {
        self.install(Position::new_game());
        self.started = false;
        info!("game reset");
    }

    /// Board edit: replace the position outright and forget the history.
    pub fn load_fen(&mut self, fen: &str) -> ChessResult<()> {
        let position = Position::from_fen(fen)?;
        self.install(position);
        info!(%fen, status = ?self.status, "position loaded");
        Ok(())
    }

    fn install(&mut self, position: Position) {
        self.position = position;
        self.history.clear();
        self.status = classify(&self.position);
        self.evaluation_cp = None;
        self.acquisition.abort();
        self.resync_pending = true;
        self.retry_at = None;
    }

    /// Take back the last committed move. The physical board is expected to
    /// be put back by hand; the next tick takes its sensors as the new baseline.
    pub fn undo(&mut self) -> ChessResult<MoveRecord> {
        let record = self.history.undo(&mut self.position)?;
        self.status = classify(&self.position);
        self.acquisition.abort();
        self.resync_pending = true;
        self.retry_at = None;
        info!(mv = %record.as_move(), "move taken back");
        Ok(record)
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn fen(&self) -> String {
        self.position.get_fen()
    }

    pub fn pgn(&self) -> String {
        write_pgn(
            &self.history,
            &self.position,
            &self.config.white.to_string(),
            &self.config.black.to_string(),
        )
    }

    pub fn move_list(&self) -> String {
        compact_move_list(&self.history, &self.position)
    }

    #[inline]
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Last evaluation reported by a move-source, in centipawns for the side
    /// it moved for.
    #[inline]
    pub fn evaluation(&self) -> Option<i32> {
        self.evaluation_cp
    }

    #[inline]
    pub fn position(&self) -> &Position {
        &self.position
    }

    #[inline]
    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    #[inline]
    pub fn acquisition(&self) -> &MoveAcquisition {
        &self.acquisition
    }

    #[inline]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.started
    }

    #[inline]
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn player(&self, color: Color) -> PlayerKind {
        match color {
            Color::White => self.config.white,
            Color::Black => self.config.black,
        }
    }

    /// Switch who moves for `color`. Any half-finished move is dropped.
    pub fn set_player(&mut self, color: Color, kind: PlayerKind) {
        match color {
            Color::White => self.config.white = kind,
            Color::Black => self.config.black = kind,
        }
        self.acquisition.abort();
        self.resync_pending = true;
        self.retry_at = None;
    }

    pub fn tick(&mut self, io: &mut dyn BoardIo, transport: &mut dyn Transport) -> SessionEvent {
        self.tick += 1;
        let now = self.tick;
        let snapshot = io.read_sensors();

        if self.resync_pending {
            self.resync_pending = false;
            self.acquisition.resync(snapshot);
            self.engine.reset(transport);
            self.thinking = None;
            io.clear_indicators();
            io.show();
            debug!(tick = now, "sensor baseline resynchronised");
            return SessionEvent::Nothing;
        }
        if !self.started {
            return SessionEvent::Nothing;
        }

        let side = self.position.side_to_move();
        let engine_turn = self.player(side).is_engine();
        let allow_pickup = !engine_turn && !self.status.is_terminal();

        let event = self.acquisition.tick(
            now,
            &snapshot,
            &mut self.position,
            &mut self.history,
            io,
            allow_pickup,
        );
        match &event {
            AcquisitionEvent::Nothing => {}
            AcquisitionEvent::Committed(record) => {
                self.status = classify(&self.position);
                info!(mv = %record.as_move(), status = ?self.status, fen = %self.position.get_fen(), "position updated");
                if self.status.is_terminal() {
                    info!(status = ?self.status, "game over");
                }
                return SessionEvent::Acquisition(event);
            }
            AcquisitionEvent::ResetRequested(_) => {
                self.engine.reset(transport);
                self.thinking = None;
                self.retry_at = None;
                return SessionEvent::Acquisition(event);
            }
            _ => return SessionEvent::Acquisition(event),
        }

        if !engine_turn
            || self.status.is_terminal()
            || self.acquisition.is_halted()
            || !self.acquisition.is_idle()
        {
            return SessionEvent::Nothing;
        }
        self.drive_engine(now, side, io, transport)
    }

    fn drive_engine(
        &mut self,
        now: u64,
        side: Color,
        io: &mut dyn BoardIo,
        transport: &mut dyn Transport,
    ) -> SessionEvent {
        if self.engine.is_active() {
            let outcome = self.engine.tick(now, transport);
            if !matches!(outcome, RequestOutcome::Pending) {
                self.stop_thinking(io);
            }
            return match outcome {
                RequestOutcome::Idle => SessionEvent::Nothing,
                RequestOutcome::Pending => {
                    self.show_thinking(now, io);
                    SessionEvent::Nothing
                }
                RequestOutcome::Completed(engine_move) => {
                    match self.acquisition.announce(engine_move.mv, &self.position, now) {
                        Ok(()) => {
                            self.evaluation_cp = engine_move.evaluation_cp;
                            SessionEvent::EngineAnnounced {
                                mv: engine_move.mv,
                                evaluation_cp: engine_move.evaluation_cp,
                            }
                        }
                        Err(err) => self.engine_failed(now, err),
                    }
                }
                RequestOutcome::Failed(err) => self.engine_failed(now, err),
            };
        }

        if matches!(self.retry_at, Some(at) if now < at) {
            return SessionEvent::Nothing;
        }
        self.retry_at = None;

        let PlayerKind::Engine(difficulty) = self.player(side) else {
            return SessionEvent::Nothing;
        };
        let params = self.config.params(difficulty);
        match self
            .engine
            .start(&self.position, difficulty, params, now, transport)
        {
            Ok(()) => {
                self.thinking = Some(ThinkingPulse::new(self.config.blink_ticks(), now));
                self.show_thinking(now, io);
                SessionEvent::EngineRequested { side, difficulty }
            }
            Err(err) => self.engine_failed(now, err),
        }
    }

    /// Redrawn every pending tick, since acquisition redraws clear the board.
    fn show_thinking(&mut self, now: u64, io: &mut dyn BoardIo) {
        let Some(pulse) = self.thinking.as_mut() else {
            return;
        };
        pulse.advance(now);
        let color = pulse.color();
        for square in thinking_corners() {
            io.set_indicator(square, color);
        }
        io.show();
    }

    fn stop_thinking(&mut self, io: &mut dyn BoardIo) {
        if self.thinking.take().is_some() {
            for square in thinking_corners() {
                io.set_indicator(square, IndicatorColor::OFF);
            }
            io.show();
        }
    }

    fn engine_failed(&mut self, now: u64, err: ChessError) -> SessionEvent {
        let retry_at = now + self.config.retry_delay_ticks();
        warn!(%err, retry_at, "engine move unavailable");
        self.retry_at = Some(retry_at);
        SessionEvent::EngineFailed(err)
    }
}
