//! The client side of one game. A `Session` owns the config, the local board
//! and the turn, and turns user intents and server messages into `Effect`s.
//!
//! The session does no IO. Whoever drives it (the native event loop or the
//! browser frontend) feeds it channel notifications and user input, then
//! carries out the returned effects in order. All handlers run to completion,
//! so no locking is involved.

mod controller;
mod reconcile;

use std::fmt;

use serde::Serialize;

pub use controller::MoveError;

use crate::board::BoardGrid;
use crate::channel::ConnectionState;
use crate::config::{PlayMode, SessionConfig};
use crate::protocol::ClientMessage;
use crate::types::{Color, Move, Point};

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("A session can only be started once, create a new one instead.")]
    AlreadyStarted,
    #[error("The channel opened while the session was {0:?}.")]
    UnexpectedOpen(Phase),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    Idle,
    Connecting,
    /// The channel is open and `init` was sent, waiting for `inited`.
    AwaitingInit,
    Active(ActiveTurn),
    /// The connection ended. Only a new session can continue.
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ActiveTurn {
    /// Local input is accepted.
    AwaitingHuman,
    /// Waiting for the server, either for the engine or for the resolution
    /// of a submitted move.
    AwaitingRemote,
}

/// The move that was applied locally but not yet confirmed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TentativeMove {
    pub color: Color,
    pub mv: Move,
}

/// Text for the status line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Connecting,
    InitializingEngine,
    GameStarted,
    YourTurn,
    /// Seconds since the engine was asked for a move.
    EngineThinking(u64),
    EngineNotReady,
    ServerError(String),
    ConnectionClosed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Connecting => write!(f, "Connecting..."),
            Status::InitializingEngine => write!(f, "Connected, initializing engine..."),
            Status::GameStarted => write!(f, "Game started"),
            Status::YourTurn => write!(f, "Your turn"),
            Status::EngineThinking(secs) => write!(f, "Engine thinking... {secs}s"),
            Status::EngineNotReady => write!(f, "Engine not ready, please wait..."),
            Status::ServerError(reason) => write!(f, "Error: {reason}"),
            Status::ConnectionClosed => write!(f, "Connection closed"),
        }
    }
}

/// Something the driver of a session has to do.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Send(ClientMessage),
    /// Start the "engine is thinking" ticker, replacing a running one.
    StartThinking,
    StopThinking,
    Status(Status),
    /// Must be acknowledged by the user, e.g. a rejected move.
    Alert(String),
    Log(String),
    /// Board, turn or marker changed.
    Redraw,
}

/// Read-only view for the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub board: BoardGrid,
    pub turn: Color,
    pub last_move: Option<Point>,
    pub tentative: Option<TentativeMove>,
    pub phase: Phase,
    pub accepts_input: bool,
}

pub struct Session {
    config: SessionConfig,
    board: BoardGrid,
    turn: Color,
    tentative: Option<TentativeMove>,
    last_move: Option<Point>,
    phase: Phase,
    connection: ConnectionState,
}

impl Session {
    /// A fresh session with an empty board, Black to move.
    pub fn new(config: SessionConfig) -> Self {
        Session {
            board: BoardGrid::new(config.lines()),
            config,
            turn: Color::Black,
            tentative: None,
            last_move: None,
            phase: Phase::Idle,
            connection: ConnectionState::Disconnected,
        }
    }

    pub fn board(&self) -> &BoardGrid {
        &self.board
    }
    pub fn turn(&self) -> Color {
        self.turn
    }
    pub fn tentative(&self) -> Option<TentativeMove> {
        self.tentative
    }
    pub fn last_move(&self) -> Option<Point> {
        self.last_move
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// True if a click or pass would currently be submitted. Frontends use
    /// this to enable the pass button.
    pub fn accepts_input(&self) -> bool {
        self.connection == ConnectionState::Open
            && self.phase == Phase::Active(ActiveTurn::AwaitingHuman)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.board.clone(),
            turn: self.turn,
            last_move: self.last_move,
            tentative: self.tentative,
            phase: self.phase,
            accepts_input: self.accepts_input(),
        }
    }

    /// Idle -> Connecting. The driver opens the channel afterwards.
    pub fn start(&mut self) -> Result<Vec<Effect>, SessionError> {
        if self.phase != Phase::Idle {
            return Err(SessionError::AlreadyStarted);
        }
        self.phase = Phase::Connecting;
        self.connection = ConnectionState::Connecting;
        Ok(vec![Effect::Status(Status::Connecting), Effect::Redraw])
    }

    /// Connecting -> AwaitingInit, asking the server to set up the engine.
    pub fn on_open(&mut self) -> Result<Vec<Effect>, SessionError> {
        if self.phase != Phase::Connecting {
            return Err(SessionError::UnexpectedOpen(self.phase));
        }
        self.connection = ConnectionState::Open;
        self.phase = Phase::AwaitingInit;
        Ok(vec![
            Effect::Status(Status::InitializingEngine),
            Effect::Send(ClientMessage::Init((&self.config).into())),
        ])
    }

    /// The channel is gone. This is terminal for the session, there is no
    /// reconnect.
    pub fn on_closed(&mut self) -> Vec<Effect> {
        if self.phase == Phase::Closed {
            return vec![];
        }
        self.connection = ConnectionState::Closed;
        self.phase = Phase::Closed;
        vec![
            Effect::StopThinking,
            Effect::Status(Status::ConnectionClosed),
            Effect::Redraw,
        ]
    }

    /// Who may act next, given the mode, the turn and the outstanding move.
    fn settle(&self) -> ActiveTurn {
        if self.tentative.is_some() {
            return ActiveTurn::AwaitingRemote;
        }
        match self.config.mode() {
            PlayMode::HumanVsEngine if self.turn == self.config.human_color() => {
                ActiveTurn::AwaitingHuman
            }
            PlayMode::HumanVsEngine => ActiveTurn::AwaitingRemote,
            PlayMode::HumanVsHuman => ActiveTurn::AwaitingHuman,
            PlayMode::EngineVsEngine => ActiveTurn::AwaitingRemote,
        }
    }

    fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Active(_))
    }
}
