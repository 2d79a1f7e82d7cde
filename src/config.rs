//! Game configuration.
//!
//! Loaded from JSON; every field has a default, so `{}` is a valid file.
//! Millisecond settings are converted to tick counts with the configured tick
//! interval.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engines::difficulty::{ms_to_ticks, Difficulty, DifficultyParams, DifficultyTable};
use crate::errors::{ChessError, ChessResult};
use crate::game_state::chess_rules::MAX_MOVE_HISTORY;

/// Who moves for one side: a person at the board, or an external move-source
/// whose moves the person carries out.
///
/// Serialized as `"human"` or `{"engine": "hard"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    Human,
    Engine(Difficulty),
}

impl PlayerKind {
    #[inline]
    pub fn is_engine(self) -> bool {
        matches!(self, PlayerKind::Engine(_))
    }
}

impl fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerKind::Human => f.write_str("Human"),
            PlayerKind::Engine(difficulty) => write!(f, "Engine ({difficulty})"),
        }
    }
}

/// `human`, or a difficulty name meaning an engine at that tier.
impl std::str::FromStr for PlayerKind {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("human") {
            return Ok(PlayerKind::Human);
        }
        s.parse::<Difficulty>().map(PlayerKind::Engine)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub white: PlayerKind,
    pub black: PlayerKind,
    pub tick_interval_ms: u64,
    pub blink_interval_ms: u64,
    pub confirm_flash_ms: u64,
    pub engine_retry_delay_ms: u64,
    pub history_capacity: usize,
    pub difficulty: DifficultyTable,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            white: PlayerKind::Human,
            black: PlayerKind::Engine(Difficulty::Medium),
            tick_interval_ms: 50,
            blink_interval_ms: 500,
            confirm_flash_ms: 300,
            engine_retry_delay_ms: 1_000,
            history_capacity: MAX_MOVE_HISTORY,
            difficulty: DifficultyTable::default(),
        }
    }
}

impl GameConfig {
    pub fn from_json(text: &str) -> ChessResult<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| ChessError::InvalidConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ChessResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ChessError::InvalidConfig {
            message: format!("{}: {e}", path.display()),
        })?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> ChessResult<()> {
        let invalid = |message: &str| {
            Err(ChessError::InvalidConfig {
                message: message.to_owned(),
            })
        };
        if self.tick_interval_ms == 0 {
            return invalid("tick_interval_ms must be positive");
        }
        if self.history_capacity == 0 {
            return invalid("history_capacity must be positive");
        }
        for difficulty in Difficulty::ALL {
            let params = self.difficulty.params(difficulty);
            if params.max_attempts == 0 {
                return Err(ChessError::InvalidConfig {
                    message: format!("{difficulty}: max_attempts must be positive"),
                });
            }
            if params.timeout_ms == 0 {
                return Err(ChessError::InvalidConfig {
                    message: format!("{difficulty}: timeout_ms must be positive"),
                });
            }
        }
        Ok(())
    }

    #[inline]
    pub fn params(&self, difficulty: Difficulty) -> DifficultyParams {
        self.difficulty.params(difficulty)
    }

    pub fn blink_ticks(&self) -> u64 {
        ms_to_ticks(self.blink_interval_ms, self.tick_interval_ms)
    }

    pub fn confirm_ticks(&self) -> u64 {
        ms_to_ticks(self.confirm_flash_ms, self.tick_interval_ms)
    }

    pub fn retry_delay_ticks(&self) -> u64 {
        ms_to_ticks(self.engine_retry_delay_ms, self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::{GameConfig, PlayerKind};
    use crate::engines::difficulty::Difficulty;
    use crate::errors::ChessError;

    #[test]
    fn empty_object_yields_defaults() {
        let config = GameConfig::from_json("{}").expect("defaults should validate");
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.blink_ticks(), 10);
        assert_eq!(config.confirm_ticks(), 6);
        assert_eq!(config.retry_delay_ticks(), 20);
    }

    #[test]
    fn players_and_tier_overrides_deserialize() {
        let config = GameConfig::from_json(
            r#"{
                "white": {"engine": "expert"},
                "black": "human",
                "tick_interval_ms": 20,
                "difficulty": {"easy": {"search_depth": 3, "timeout_ms": 4000, "max_attempts": 1}}
            }"#,
        )
        .expect("config should parse");
        assert_eq!(config.white, PlayerKind::Engine(Difficulty::Expert));
        assert_eq!(config.black, PlayerKind::Human);
        assert_eq!(config.params(Difficulty::Easy).search_depth, 3);
        assert_eq!(config.params(Difficulty::Hard), Difficulty::Hard.default_params());
        assert_eq!(config.blink_ticks(), 25);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for text in [
            r#"{"tick_interval_ms": 0}"#,
            r#"{"history_capacity": 0}"#,
            r#"{"difficulty": {"hard": {"search_depth": 12, "timeout_ms": 25000, "max_attempts": 0}}}"#,
            r#"{"white": "grandmaster"}"#,
            "not json",
        ] {
            assert!(
                matches!(GameConfig::from_json(text), Err(ChessError::InvalidConfig { .. })),
                "expected InvalidConfig for {text}"
            );
        }
    }

    #[test]
    fn player_kind_parses_from_cli_text() {
        assert_eq!("human".parse::<PlayerKind>().ok(), Some(PlayerKind::Human));
        assert_eq!(
            "Hard".parse::<PlayerKind>().ok(),
            Some(PlayerKind::Engine(Difficulty::Hard))
        );
        assert_eq!(PlayerKind::Engine(Difficulty::Easy).to_string(), "Engine (easy)");
    }
}
