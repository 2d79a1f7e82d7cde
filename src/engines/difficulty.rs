//! Difficulty tiers and the request parameters each one selects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ChessError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyParams {
    pub search_depth: u8,
    pub timeout_ms: u64,
    pub max_attempts: u32,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    pub const fn default_params(self) -> DifficultyParams {
        match self {
            Difficulty::Easy => DifficultyParams {
                search_depth: 5,
                timeout_ms: 15_000,
                max_attempts: 2,
            },
            Difficulty::Medium => DifficultyParams {
                search_depth: 8,
                timeout_ms: 20_000,
                max_attempts: 2,
            },
            Difficulty::Hard => DifficultyParams {
                search_depth: 12,
                timeout_ms: 25_000,
                max_attempts: 3,
            },
            Difficulty::Expert => DifficultyParams {
                search_depth: 15,
                timeout_ms: 30_000,
                max_attempts: 3,
            },
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        };
        f.write_str(name)
    }
}

impl FromStr for Difficulty {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            _ => Err(ChessError::InvalidConfig {
                message: format!("unknown difficulty `{s}`"),
            }),
        }
    }
}

/// Per-tier parameters, overridable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTable {
    pub easy: DifficultyParams,
    pub medium: DifficultyParams,
    pub hard: DifficultyParams,
    pub expert: DifficultyParams,
}

impl Default for DifficultyTable {
    fn default() -> Self {
        Self {
            easy: Difficulty::Easy.default_params(),
            medium: Difficulty::Medium.default_params(),
            hard: Difficulty::Hard.default_params(),
            expert: Difficulty::Expert.default_params(),
        }
    }
}

impl DifficultyTable {
    pub fn params(&self, difficulty: Difficulty) -> DifficultyParams {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
            Difficulty::Expert => self.expert,
        }
    }
}

/// Whole ticks covering `ms`, rounded up, never zero.
#[inline]
pub fn ms_to_ticks(ms: u64, tick_interval_ms: u64) -> u64 {
    ms.div_ceil(tick_interval_ms.max(1)).max(1)
}
