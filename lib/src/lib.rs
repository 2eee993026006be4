//! Client side of a game of Go played against a remote engine.
//!
//! The rules live on the server. This library keeps an optimistic copy of
//! the board, reconciles it with what the server reports and decides who may
//! move next. It is shared by the native client and the browser frontend.

pub mod board;
pub mod channel;
pub mod config;
pub mod protocol;
pub mod session;
pub mod types;

pub use board::{BoardGrid, GridError};
pub use channel::{ChannelError, ChannelEvent, ConnectionChannel, ConnectionState, PageOrigin};
pub use config::{BoardSize, ConfigError, PlayMode, Ruleset, SessionConfig};
pub use protocol::{ClientMessage, ProtocolError, ServerMessage};
pub use session::{
    ActiveTurn, Effect, MoveError, Phase, Session, SessionError, Snapshot, Status, TentativeMove,
};
pub use types::{Color, Move, Point};
