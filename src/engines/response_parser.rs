//! Decoding of move-source replies.
//!
//! Replies are JSON objects, sometimes wrapped in transport noise, so decoding
//! starts at the first `{` and reads one value. Accepted shapes:
//!
//! ```text
//! {"success": true, "bestmove": "e2e4", "evaluation": 0.31}
//! {"move": "e7e8q", "score": "-45"}
//! {"bestmove": "bestmove g1f3 ponder g8f6", "cp": 12}
//! ```

use serde_json::{Deserializer, Map, Value};

use crate::errors::{ChessError, ChessResult};
use crate::game_state::chess_types::Move;
use crate::utils::long_algebraic::parse_move_string;

const MOVE_KEYS: [&str; 2] = ["bestmove", "move"];
const EVALUATION_KEYS: [&str; 3] = ["evaluation", "score", "cp"];

/// Magnitudes below this are taken to be in pawns rather than centipawns.
const PAWN_UNIT_LIMIT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedResponse {
    pub mv: Move,
    /// Centipawns from the mover's point of view, when the source reported one.
    pub evaluation_cp: Option<i32>,
}

fn malformed(reason: impl Into<String>) -> ChessError {
    ChessError::MalformedResponse {
        reason: reason.into(),
    }
}

pub fn parse_response(raw: &str) -> ChessResult<ParsedResponse> {
    let start = raw.find('{').ok_or_else(|| malformed("no JSON object"))?;
    let value = Deserializer::from_str(&raw[start..])
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| malformed("empty body"))?
        .map_err(|e| malformed(format!("invalid JSON: {e}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| malformed("response is not an object"))?;

    if let Some(success) = object.get("success") {
        if success.as_bool() != Some(true) {
            return Err(malformed("source reported failure"));
        }
    }

    let move_text = MOVE_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .ok_or_else(|| malformed("no move field"))?;
    let token = move_token(move_text).ok_or_else(|| malformed("empty move field"))?;
    let mv = parse_move_string(token).map_err(|e| malformed(e.to_string()))?;

    Ok(ParsedResponse {
        mv,
        evaluation_cp: evaluation(object),
    })
}

/// `"bestmove e2e4 ponder e7e5"` -> `"e2e4"`; a bare token passes through.
fn move_token(text: &str) -> Option<&str> {
    let mut tokens = text.split_whitespace();
    match tokens.next()? {
        "bestmove" => tokens.next(),
        first => Some(first),
    }
}

fn evaluation(object: &Map<String, Value>) -> Option<i32> {
    let raw = EVALUATION_KEYS.iter().find_map(|key| match object.get(*key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })?;
    if !raw.is_finite() {
        return None;
    }
    let centipawns = if raw.abs() < PAWN_UNIT_LIMIT {
        raw * 100.0
    } else {
        raw
    };
    Some(centipawns.round() as i32)
}
