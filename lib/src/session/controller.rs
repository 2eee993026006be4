//! Turns clicks and passes into moves. Every check happens before anything is
//! sent, so a refused move costs no network round-trip and changes nothing.

use log::{debug, info, warn};

use super::{ActiveTurn, Effect, Phase, Session, TentativeMove};
use crate::channel::ConnectionState;
use crate::config::PlayMode;
use crate::protocol::{ClientMessage, HumanMovePayload};
use crate::types::{Color, Move, Point};

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum MoveError {
    #[error("The connection is not open.")]
    ChannelNotOpen,
    #[error("The game has not started yet.")]
    NotStarted,
    #[error("Engine-vs-engine games are only watched.")]
    Spectating,
    #[error("Waiting for the previous move to be answered.")]
    RequestPending,
    #[error("The point {0} is outside of the board.")]
    OutOfBounds(Point),
    #[error("The point {0} is already occupied.")]
    Occupied(Point),
    #[error("It is not your turn.")]
    NotYourTurn,
}

impl Session {
    /// Places a stone for the color that may act locally. `channel` is what
    /// the channel reports right now, it may already be gone before its
    /// `Closed` event was handled.
    pub fn play(
        &mut self,
        channel: ConnectionState,
        point: Point,
    ) -> Result<Vec<Effect>, MoveError> {
        self.submit(channel, Move::Place(point))
    }

    pub fn pass(&mut self, channel: ConnectionState) -> Result<Vec<Effect>, MoveError> {
        self.submit(channel, Move::Pass)
    }

    /// Takes back the tentative move after its `humanMove` could not be
    /// handed to the channel.
    pub fn withdraw(&mut self) -> Vec<Effect> {
        let Some(tentative) = self.tentative.take() else {
            return vec![];
        };
        if let Some(point) = tentative.mv.point() {
            if let Err(e) = self.board.set(point, None) {
                warn!("Could not take back {}: {}", point, e);
            }
        }
        self.turn = tentative.color;
        if self.is_active() {
            self.phase = Phase::Active(self.settle());
        }
        info!(
            "Took back {} for {}, it was not sent",
            tentative.mv, tentative.color
        );
        vec![Effect::StopThinking, Effect::Redraw]
    }

    fn submit(&mut self, channel: ConnectionState, mv: Move) -> Result<Vec<Effect>, MoveError> {
        let color = self.check_move(channel, mv).inspect_err(|e| {
            info!("Move {} refused: {}", mv, e);
        })?;

        // Optimistic write, the server will confirm, replace or reject it.
        if let Move::Place(point) = mv {
            self.board
                .set(point, Some(color))
                .map_err(|_| MoveError::OutOfBounds(point))?;
        }
        self.turn = color.other();
        self.tentative = Some(TentativeMove { color, mv });
        self.phase = Phase::Active(ActiveTurn::AwaitingRemote);
        debug!("Submitting {} for {}", mv, color);

        let mut effects = vec![Effect::Redraw];
        if self.config.mode() == PlayMode::HumanVsEngine {
            effects.push(Effect::StartThinking);
        }
        effects.push(Effect::Send(ClientMessage::HumanMove(HumanMovePayload {
            color,
            mv,
        })));
        Ok(effects)
    }

    /// Returns the color that would play `mv`.
    fn check_move(&self, channel: ConnectionState, mv: Move) -> Result<Color, MoveError> {
        if self.connection != ConnectionState::Open || channel != ConnectionState::Open {
            return Err(MoveError::ChannelNotOpen);
        }
        if !self.is_active() {
            return Err(MoveError::NotStarted);
        }
        if self.config.mode() == PlayMode::EngineVsEngine {
            return Err(MoveError::Spectating);
        }
        if self.tentative.is_some() {
            return Err(MoveError::RequestPending);
        }
        if let Move::Place(point) = mv {
            match self.board.get(point) {
                Err(_) => return Err(MoveError::OutOfBounds(point)),
                Ok(Some(_)) => return Err(MoveError::Occupied(point)),
                Ok(None) => {}
            }
        }
        match self.config.mode() {
            PlayMode::HumanVsEngine if self.turn != self.config.human_color() => {
                Err(MoveError::NotYourTurn)
            }
            PlayMode::HumanVsEngine => Ok(self.config.human_color()),
            // Both sides are played from this client.
            _ => Ok(self.turn),
        }
    }
}
