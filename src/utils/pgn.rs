//! PGN export of the move log.
//!
//! Movetext is SAN built from positions rebuilt out of the history, so the
//! output always starts at the earliest retained move. When that is not the
//! standard starting position a `SetUp`/`FEN` header pair is written.

use std::collections::BTreeMap;

use chrono::Local;

use crate::game_state::chess_rules::STARTING_POSITION_FEN;
use crate::game_state::chess_types::*;
use crate::game_state::move_history::MoveHistory;
use crate::move_generation::legal_move_generator::classify;
use crate::utils::algebraic::record_to_san;

pub fn write_pgn(history: &MoveHistory, current: &Position, white: &str, black: &str) -> String {
    let mut headers = BTreeMap::<String, String>::new();
    headers.insert("Event".to_owned(), "Plum Board Game".to_owned());
    headers.insert("Site".to_owned(), "Local".to_owned());
    headers.insert("Date".to_owned(), Local::now().format("%Y.%m.%d").to_string());
    headers.insert("Round".to_owned(), "-".to_owned());
    headers.insert("White".to_owned(), white.to_owned());
    headers.insert("Black".to_owned(), black.to_owned());
    headers.insert("Result".to_owned(), game_result(current).to_owned());

    let initial_fen = history.initial_position(current).get_fen();
    if initial_fen != STARTING_POSITION_FEN {
        headers.insert("SetUp".to_owned(), "1".to_owned());
        headers.insert("FEN".to_owned(), initial_fen);
    }

    write_pgn_with_headers(history, current, &headers)
}

pub fn write_pgn_with_headers(
    history: &MoveHistory,
    current: &Position,
    headers: &BTreeMap<String, String>,
) -> String {
    let mut out = String::new();

    for (key, value) in headers {
        out.push_str(&format!("[{} \"{}\"]\n", key, escape_pgn_value(value)));
    }
    out.push('\n');

    let mut body = movetext(history, current);
    let result = headers.get("Result").map(String::as_str).unwrap_or("*");
    if !body.is_empty() {
        body.push(' ');
    }
    body.push_str(result);
    out.push_str(&body);
    out.push('\n');

    out
}

/// `1. e4 e5 2. Nf3` for the retained history.
pub fn movetext(history: &MoveHistory, current: &Position) -> String {
    let positions = history.positions_before(current);
    let mut parts = Vec::<String>::with_capacity(history.len() + history.len() / 2);

    for (idx, (record, before)) in history.iter().zip(positions.iter()).enumerate() {
        let after = positions.get(idx + 1).unwrap_or(current);
        let san = record_to_san(before, record, after);
        let number = before.state.fullmove_number;
        match record.mover {
            Color::White => parts.push(format!("{number}. {san}")),
            Color::Black if idx == 0 => parts.push(format!("{number}... {san}")),
            Color::Black => parts.push(san),
        }
    }

    parts.join(" ")
}

/// `1-0`, `0-1`, `1/2-1/2` for finished positions, `*` otherwise.
pub fn game_result(current: &Position) -> &'static str {
    match classify(current) {
        GameStatus::Checkmate => match current.side_to_move() {
            Color::White => "0-1",
            Color::Black => "1-0",
        },
        GameStatus::Stalemate => "1/2-1/2",
        GameStatus::Check | GameStatus::Continuing => "*",
    }
}

fn escape_pgn_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::{game_result, movetext, write_pgn};
    use crate::game_state::chess_types::Position;
    use crate::game_state::move_history::MoveHistory;
    use crate::move_generation::legal_move_apply::commit_move;
    use crate::utils::fen_parser::parse_fen;
    use crate::utils::long_algebraic::parse_move_string;

    fn play(position: &mut Position, history: &mut MoveHistory, moves: &[&str]) {
        for text in moves {
            let mv = parse_move_string(text).expect("test move should parse");
            history.record(commit_move(position, mv).expect("test move should be legal"));
        }
    }

    #[test]
    fn fools_mate_pgn_has_result_and_mate_suffix() {
        let mut position = Position::new_game();
        let mut history = MoveHistory::default();
        play(&mut position, &mut history, &["f2f3", "e7e5", "g2g4", "d8h4"]);

        assert_eq!(movetext(&history, &position), "1. f3 e5 2. g4 Qh4#");
        assert_eq!(game_result(&position), "0-1");

        let pgn = write_pgn(&history, &position, "Human", "Engine");
        assert!(pgn.contains("[Result \"0-1\"]"));
        assert!(pgn.contains("[White \"Human\"]"));
        assert!(!pgn.contains("[SetUp"));
        assert!(pgn.trim_end().ends_with("1. f3 e5 2. g4 Qh4# 0-1"));
    }

    #[test]
    fn custom_start_writes_setup_and_fen_headers() {
        let fen = "4k3/8/8/8/8/8/4P3/4K3 b - - 0 12";
        let mut position = parse_fen(fen).expect("FEN should parse");
        let mut history = MoveHistory::default();
        play(&mut position, &mut history, &["e8d7", "e2e4"]);

        let pgn = write_pgn(&history, &position, "White", "Black");
        assert!(pgn.contains("[SetUp \"1\"]"));
        assert!(pgn.contains(&format!("[FEN \"{fen}\"]")));
        assert!(pgn.contains("12... Kd7 13. e4 *"));
    }
}
