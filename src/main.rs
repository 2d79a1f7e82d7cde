//! Terminal front-end: drives one game session over an in-memory sensor board.
//!
//! Commands are read line by line from stdin; sensor commands (`lift`,
//! `place`, `move`) change the virtual board and run one tick.

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use plum_board::acquisition::move_acquisition::AcquisitionEvent;
use plum_board::acquisition::virtual_board::VirtualBoard;
use plum_board::config::{GameConfig, PlayerKind};
use plum_board::engines::engine_random::LocalEngineTransport;
use plum_board::game_state::chess_types::Color;
use plum_board::session::game_session::{GameSession, SessionEvent};
use plum_board::utils::algebraic::algebraic_to_square;
use plum_board::utils::long_algebraic::parse_move_string;
use plum_board::utils::render_game_state::render_position;

#[derive(Parser, Debug)]
#[command(name = "plum_board")]
#[command(about = "Sensor chessboard core with a virtual board on stdin")]
struct Args {
    /// JSON game configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// `human` or a difficulty (easy, medium, hard, expert)
    #[arg(long)]
    white: Option<PlayerKind>,

    #[arg(long)]
    black: Option<PlayerKind>,

    /// Start from this position instead of the standard one
    #[arg(long)]
    fen: Option<String>,

    /// Polls before the local engine answers
    #[arg(long, default_value_t = 10)]
    engine_latency: u64,
}

const HELP: &str = "\
commands:
  lift <sq> | place <sq>   change one sensor, then tick
  move <from><to>          lift, tick, place, tick
  tick [n]                 advance n ticks (default 1)
  board | fen | pgn | moves | status
  undo | load <fen> | new
  white <kind> | black <kind>
  quit";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(white) = args.white {
        config.white = white;
    }
    if let Some(black) = args.black {
        config.black = black;
    }

    let mut session = GameSession::new(config)?;
    session.start();
    if let Some(fen) = &args.fen {
        session.load_fen(fen)?;
    }

    let mut frontend = Frontend {
        board: VirtualBoard::from_position(session.position()),
        session,
        transport: LocalEngineTransport::new(args.engine_latency),
    };
    frontend.run_stdio_loop()?;
    Ok(())
}

struct Frontend {
    session: GameSession,
    board: VirtualBoard,
    transport: LocalEngineTransport,
}

impl Frontend {
    fn run_stdio_loop(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        self.step(&mut stdout)?;
        writeln!(stdout, "{}", render_position(self.session.position()))?;
        stdout.flush()?;

        for line in stdin.lock().lines() {
            let line = line?;
            let should_quit = self.handle_command(&line, &mut stdout)?;
            stdout.flush()?;
            if should_quit {
                break;
            }
        }
        Ok(())
    }

    fn handle_command(&mut self, line: &str, out: &mut impl Write) -> io::Result<bool> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }

        let mut parts = trimmed.split_whitespace();
        let cmd = parts.next().unwrap_or_default();
        let arg = parts.next();

        match (cmd, arg) {
            ("lift" | "place", Some(text)) => match algebraic_to_square(text) {
                Ok(square) => {
                    if cmd == "lift" {
                        self.board.lift(square);
                    } else {
                        self.board.place(square);
                    }
                    self.step(out)?;
                }
                Err(err) => writeln!(out, "error: {err}")?,
            },
            ("move", Some(text)) => match parse_move_string(text) {
                Ok(mv) => {
                    self.board.lift(mv.from);
                    self.step(out)?;
                    self.board.place(mv.to);
                    self.step(out)?;
                }
                Err(err) => writeln!(out, "error: {err}")?,
            },
            ("tick", count) => {
                let count = count.and_then(|c| c.parse::<u64>().ok()).unwrap_or(1);
                for _ in 0..count {
                    self.step(out)?;
                }
            }
            ("board", _) => {
                writeln!(out, "{}", render_position(self.session.position()))?;
                for (square, color) in self.board.lit_squares() {
                    writeln!(out, "  {square}: rgbw({}, {}, {}, {})", color.r, color.g, color.b, color.w)?;
                }
            }
            ("fen", _) => writeln!(out, "{}", self.session.fen())?,
            ("pgn", _) => writeln!(out, "{}", self.session.pgn())?,
            ("moves", _) => writeln!(out, "{}", self.session.move_list())?,
            ("status", _) => {
                let eval = self
                    .session
                    .evaluation()
                    .map_or_else(|| "-".to_owned(), |cp| cp.to_string());
                writeln!(
                    out,
                    "{:?}, {} to move, eval {eval}",
                    self.session.status(),
                    self.session.position().side_to_move()
                )?;
            }
            ("undo", _) => match self.session.undo() {
                Ok(record) => {
                    self.board.set_position(self.session.position());
                    writeln!(out, "took back {}", record.as_move())?;
                }
                Err(err) => writeln!(out, "error: {err}")?,
            },
            ("load", Some(_)) => {
                let fen = trimmed["load".len()..].trim();
                match self.session.load_fen(fen) {
                    Ok(()) => {
                        self.board.set_position(self.session.position());
                        writeln!(out, "{}", render_position(self.session.position()))?;
                    }
                    Err(err) => writeln!(out, "error: {err}")?,
                }
            }
            ("new", _) => self.new_game(out)?,
            ("white" | "black", Some(text)) => match text.parse::<PlayerKind>() {
                Ok(kind) => {
                    let color = if cmd == "white" { Color::White } else { Color::Black };
                    self.session.set_player(color, kind);
                    writeln!(out, "{color}: {kind}")?;
                }
                Err(err) => writeln!(out, "error: {err}")?,
            },
            ("help", _) => writeln!(out, "{HELP}")?,
            ("quit", _) => return Ok(true),
            _ => writeln!(out, "unknown command `{trimmed}` (try `help`)")?,
        }

        Ok(false)
    }

    fn new_game(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.session.reset();
        self.session.start();
        self.board.set_position(self.session.position());
        writeln!(out, "{}", render_position(self.session.position()))
    }

    /// One tick, reporting whatever it produced.
    fn step(&mut self, out: &mut impl Write) -> io::Result<()> {
        match self.session.tick(&mut self.board, &mut self.transport) {
            SessionEvent::Nothing => {}
            SessionEvent::Acquisition(AcquisitionEvent::Committed(record)) => {
                writeln!(out, "committed {}", record.as_move())?;
                writeln!(out, "{}", render_position(self.session.position()))?;
                if self.session.status().is_terminal() {
                    writeln!(out, "game over: {:?}", self.session.status())?;
                }
            }
            SessionEvent::Acquisition(AcquisitionEvent::ResetRequested(err)) => {
                writeln!(out, "{err}; put both kings back and type `new` to reset")?;
            }
            SessionEvent::Acquisition(event) => writeln!(out, "{event:?}")?,
            SessionEvent::EngineRequested { side, difficulty } => {
                info!(%side, %difficulty, "waiting for engine");
                writeln!(out, "engine ({difficulty}) thinking for {side}")?;
            }
            SessionEvent::EngineAnnounced { mv, evaluation_cp } => {
                writeln!(out, "engine plays {mv} (eval {evaluation_cp:?}); carry it out on the board")?;
            }
            SessionEvent::EngineFailed(err) => writeln!(out, "engine error: {err}")?,
        }
        Ok(())
    }
}
