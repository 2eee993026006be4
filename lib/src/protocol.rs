//! Messages exchanged with the engine server. Every message is wrapped in the
//! envelope `{"type": ..., "payload": ...}`.
//!
//! Outgoing messages are plain serde types. Incoming messages are decoded by
//! hand into `ServerMessage`, because the server is lenient about what it puts
//! into payloads: a `board` that is not an array is treated as absent rather
//! than as an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::board::BoardGrid;
use crate::config::{PlayMode, Ruleset, SessionConfig};
use crate::types::{Color, Move, Point};

/// Reason string the server sends while the engine process is still booting.
pub const ENGINE_NOT_READY: &str = "engine not ready";

#[derive(thiserror::Error, Debug)]
pub enum ProtocolError {
    #[error("The message is not valid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),
}

/// All messages the client sends to the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ClientMessage {
    Init(InitPayload),
    HumanMove(HumanMovePayload),
    Genmove(GenmovePayload),
    StartAuto,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPayload {
    pub board_size: u8,
    pub komi: f64,
    pub rules: Ruleset,
    pub mode: PlayMode,
    pub human_color: Color,
    pub ai_time: u8,
}

impl From<&SessionConfig> for InitPayload {
    fn from(config: &SessionConfig) -> Self {
        InitPayload {
            board_size: config.lines(),
            komi: config.komi(),
            rules: config.ruleset(),
            mode: config.mode(),
            human_color: config.human_color(),
            ai_time: config.engine_think_seconds(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HumanMovePayload {
    pub color: Color,
    #[serde(rename = "move")]
    pub mv: Move,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenmovePayload {
    pub color: Color,
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Init(_) => "init",
            ClientMessage::HumanMove(_) => "humanMove",
            ClientMessage::Genmove(_) => "genmove",
            ClientMessage::StartAuto => "startAuto",
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// All messages the server may send to the client.
#[derive(Clone, Debug, PartialEq)]
pub enum ServerMessage {
    Inited,
    SyncBoard(SyncBoard),
    AiMove(AiMove),
    Illegal(Illegal),
    Error(String),
    /// A message type this client does not know. It is logged and dropped.
    Unknown(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SyncBoard {
    pub board: Option<BoardGrid>,
    pub next: Option<Color>,
    pub raw_board: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AiMove {
    pub coord: Move,
    pub board: Option<BoardGrid>,
    pub next: Option<Color>,
    pub raw_board: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Illegal {
    pub message: Option<String>,
    pub board: Option<BoardGrid>,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

impl ServerMessage {
    pub fn kind(&self) -> &str {
        match self {
            ServerMessage::Inited => "inited",
            ServerMessage::SyncBoard(_) => "syncBoard",
            ServerMessage::AiMove(_) => "aiMove",
            ServerMessage::Illegal(_) => "illegal",
            ServerMessage::Error(_) => "error",
            ServerMessage::Unknown(kind) => kind,
        }
    }

    /// Decodes one text frame. Only a frame that is not a JSON envelope at all
    /// is an error, missing or malformed payload fields fall back to `None`.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let Envelope { kind, payload } = serde_json::from_str(text)?;
        let message = match kind.as_str() {
            "inited" => ServerMessage::Inited,
            "syncBoard" => ServerMessage::SyncBoard(SyncBoard {
                board: board_field(&payload),
                next: color_field(&payload, "next"),
                raw_board: string_field(&payload, "rawBoard"),
            }),
            "aiMove" => ServerMessage::AiMove(AiMove {
                coord: payload
                    .get("coord")
                    .and_then(|coord| Point::deserialize(coord).ok())
                    .into(),
                board: board_field(&payload),
                next: color_field(&payload, "next"),
                raw_board: string_field(&payload, "rawBoard"),
            }),
            "illegal" => ServerMessage::Illegal(Illegal {
                message: string_field(&payload, "message"),
                board: board_field(&payload),
            }),
            "error" => ServerMessage::Error(match payload {
                Value::String(reason) => reason,
                Value::Null => String::new(),
                other => other.to_string(),
            }),
            _ => ServerMessage::Unknown(kind),
        };
        Ok(message)
    }

    pub fn is_engine_not_ready(&self) -> bool {
        matches!(self, ServerMessage::Error(reason) if reason == ENGINE_NOT_READY)
    }
}

/// A board is only trusted if it is an array that forms a square grid.
fn board_field(payload: &Value) -> Option<BoardGrid> {
    payload
        .get("board")
        .filter(|board| board.is_array())
        .and_then(|board| BoardGrid::deserialize(board).ok())
}

fn color_field(payload: &Value, key: &str) -> Option<Color> {
    payload.get(key).and_then(|c| Color::deserialize(c).ok())
}

fn string_field(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_string)
}
