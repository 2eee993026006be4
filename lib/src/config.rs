//! Module for the `SessionConfig` struct.
//!
//! A config is fixed when a session starts. Starting a new game means
//! building a new config and a new session.

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

use crate::types::Color;

pub const DEFAULT_KOMI: f64 = 7.5;
pub const DEFAULT_THINK_SECONDS: u8 = 5;
pub const MIN_THINK_SECONDS: u8 = 1;
pub const MAX_THINK_SECONDS: u8 = 10;

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Board size {0} is not supported, use 9, 13 or 19.")]
    UnsupportedBoardSize(i64),
    #[error("Komi must be a finite number, got {0}.")]
    KomiNotFinite(f64),
    #[error("Unknown play mode: {0}")]
    UnknownMode(String),
    #[error("Unknown color: {0}")]
    UnknownColor(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BoardSize {
    Nine = 9,
    Thirteen = 13,
    Nineteen = 19,
}

impl BoardSize {
    pub fn lines(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for BoardSize {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            9 => Ok(BoardSize::Nine),
            13 => Ok(BoardSize::Thirteen),
            19 => Ok(BoardSize::Nineteen),
            other => Err(ConfigError::UnsupportedBoardSize(other as i64)),
        }
    }
}

impl From<BoardSize> for u8 {
    fn from(size: BoardSize) -> Self {
        size.lines()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayMode {
    #[serde(rename = "human-ai")]
    HumanVsEngine,
    #[serde(rename = "ai-ai")]
    EngineVsEngine,
    #[serde(rename = "human-human")]
    HumanVsHuman,
}

impl PlayMode {
    pub fn wire_name(self) -> &'static str {
        match self {
            PlayMode::HumanVsEngine => "human-ai",
            PlayMode::EngineVsEngine => "ai-ai",
            PlayMode::HumanVsHuman => "human-human",
        }
    }

    pub fn from_wire_name(name: &str) -> Result<Self, ConfigError> {
        match name {
            "human-ai" => Ok(PlayMode::HumanVsEngine),
            "ai-ai" => Ok(PlayMode::EngineVsEngine),
            "human-human" => Ok(PlayMode::HumanVsHuman),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

impl Default for PlayMode {
    fn default() -> Self {
        PlayMode::HumanVsEngine
    }
}

/// The engine only ever plays with one ruleset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Ruleset {
    #[default]
    Chinese,
}

/// Everything the engine needs to know to set up a game.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    board_size: BoardSize,
    komi: f64,
    ruleset: Ruleset,
    mode: PlayMode,
    human_color: Color,
    engine_think_seconds: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            board_size: BoardSize::Nineteen,
            komi: DEFAULT_KOMI,
            ruleset: Ruleset::Chinese,
            mode: PlayMode::HumanVsEngine,
            human_color: Color::Black,
            engine_think_seconds: DEFAULT_THINK_SECONDS,
        }
    }
}

impl SessionConfig {
    /// Validates the board size and komi. The think time is clamped into
    /// `MIN_THINK_SECONDS..=MAX_THINK_SECONDS` instead of being rejected.
    pub fn new(
        board_size: i64,
        komi: f64,
        mode: PlayMode,
        human_color: Color,
        engine_think_seconds: i64,
    ) -> Result<Self, ConfigError> {
        let board_size = u8::try_from(board_size)
            .map_err(|_| ConfigError::UnsupportedBoardSize(board_size))
            .and_then(BoardSize::try_from)?;
        if !komi.is_finite() {
            return Err(ConfigError::KomiNotFinite(komi));
        }
        Ok(Self {
            board_size,
            komi,
            ruleset: Ruleset::Chinese,
            mode,
            human_color,
            engine_think_seconds: clamp_think_seconds(engine_think_seconds),
        })
    }

    pub fn board_size(&self) -> BoardSize {
        self.board_size
    }
    pub fn lines(&self) -> u8 {
        self.board_size.lines()
    }
    pub fn komi(&self) -> f64 {
        self.komi
    }
    pub fn ruleset(&self) -> Ruleset {
        self.ruleset
    }
    pub fn mode(&self) -> PlayMode {
        self.mode
    }
    pub fn human_color(&self) -> Color {
        self.human_color
    }
    pub fn engine_think_seconds(&self) -> u8 {
        self.engine_think_seconds
    }

    /// Applies the `size`, `komi` and `color` query parameters used by the
    /// autostart link. Values that don't parse are ignored.
    pub fn with_query_overrides(&self, get: impl Fn(&str) -> Option<String>) -> Self {
        let mut result = self.clone();
        if let Some(size) = get("size")
            .and_then(|s| s.trim().parse::<u8>().ok())
            .and_then(|s| BoardSize::try_from(s).ok())
        {
            result.board_size = size;
        }
        if let Some(komi) = get("komi")
            .and_then(|k| k.trim().parse::<f64>().ok())
            .filter(|k| k.is_finite())
        {
            result.komi = komi;
        }
        if let Some(color) = get("color").and_then(|c| Color::from_initial(&c)) {
            result.human_color = color;
        }
        result
    }
}

/// Think time outside of the supported range is pulled to the nearest bound.
pub fn clamp_think_seconds(seconds: i64) -> u8 {
    seconds.clamp(MIN_THINK_SECONDS as i64, MAX_THINK_SECONDS as i64) as u8
}

/// True if the page was opened with `autostart=1`.
pub fn wants_autostart(get: impl Fn(&str) -> Option<String>) -> bool {
    get("autostart").as_deref() == Some("1")
}
