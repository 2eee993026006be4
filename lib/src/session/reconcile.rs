//! Resolves server messages against the optimistic local state.
//!
//! A board sent by the server always replaces the local one as a whole. The
//! client does not know the rules, so it never tries to merge.

use log::{info, warn};

use super::{ActiveTurn, Effect, Phase, Session, Status};
use crate::board::BoardGrid;
use crate::config::PlayMode;
use crate::protocol::{AiMove, ClientMessage, GenmovePayload, Illegal, ServerMessage, SyncBoard};
use crate::types::{Color, Move};

impl Session {
    /// Applies one inbound message. Messages must be passed in the order they
    /// arrived on the socket.
    pub fn on_message(&mut self, message: ServerMessage) -> Vec<Effect> {
        if self.phase == Phase::Closed {
            warn!("Dropping {} received after close.", message.kind());
            return vec![];
        }
        match message {
            ServerMessage::Inited => self.on_inited(),
            ServerMessage::SyncBoard(sync) => self.on_sync_board(sync),
            ServerMessage::AiMove(ai_move) => self.on_ai_move(ai_move),
            ServerMessage::Illegal(illegal) => self.on_illegal(illegal),
            message if message.is_engine_not_ready() => {
                vec![Effect::Status(Status::EngineNotReady)]
            }
            ServerMessage::Error(reason) => self.on_error(reason),
            ServerMessage::Unknown(kind) => {
                warn!("Ignoring unknown message type {kind}.");
                vec![]
            }
        }
    }

    fn on_inited(&mut self) -> Vec<Effect> {
        if self.phase != Phase::AwaitingInit {
            warn!("Ignoring inited while {:?}.", self.phase);
            return vec![];
        }
        self.phase = Phase::Active(self.settle());
        let mut effects = vec![Effect::Status(Status::GameStarted)];

        match self.config.mode() {
            PlayMode::HumanVsEngine if self.config.human_color() == Color::White => {
                effects.push(Effect::StartThinking);
                effects.push(Effect::Send(ClientMessage::Genmove(GenmovePayload {
                    color: Color::Black,
                })));
            }
            PlayMode::EngineVsEngine => {
                effects.push(Effect::Send(ClientMessage::StartAuto));
            }
            _ => {}
        }
        effects.push(Effect::Redraw);
        effects
    }

    fn on_sync_board(&mut self, sync: SyncBoard) -> Vec<Effect> {
        if !self.is_active() {
            warn!("Ignoring syncBoard while {:?}.", self.phase);
            return vec![];
        }
        let Some(board) = self.authoritative(sync.board) else {
            warn!("syncBoard without a usable board, ignoring it.");
            return vec![];
        };
        self.board = board;
        if let Some(tentative) = self.tentative.take() {
            self.last_move = tentative.mv.point();
        }
        if let Some(next) = sync.next {
            self.turn = next;
        }
        self.phase = Phase::Active(self.settle());

        let mut effects = vec![Effect::Redraw, Effect::Log("Board synchronized".to_string())];
        if let Some(raw) = sync.raw_board {
            effects.push(Effect::Log(raw));
        }
        if self.phase == Phase::Active(ActiveTurn::AwaitingHuman) {
            if self.config.mode() == PlayMode::HumanVsEngine {
                effects.push(Effect::StopThinking);
            }
            effects.push(Effect::Status(Status::YourTurn));
        }
        effects
    }

    fn on_ai_move(&mut self, ai_move: AiMove) -> Vec<Effect> {
        if !self.is_active() {
            warn!("Ignoring aiMove while {:?}.", self.phase);
            return vec![];
        }
        // An engine reply also settles a move we were waiting on.
        self.tentative = None;

        match self.authoritative(ai_move.board) {
            Some(board) => {
                self.board = board;
                self.turn = ai_move.next.unwrap_or(self.turn.other());
            }
            None => {
                if let Move::Place(point) = ai_move.coord {
                    if let Err(e) = self.board.set(point, Some(self.turn)) {
                        warn!("Engine reported an unusable move: {e}");
                    }
                }
                self.turn = self.turn.other();
            }
        }
        self.last_move = ai_move
            .coord
            .point()
            .filter(|point| self.board.contains(*point));
        self.phase = Phase::Active(self.settle());

        let mut effects = vec![
            Effect::Redraw,
            Effect::StopThinking,
            Effect::Log(format!("AI: {}", ai_move.coord)),
        ];
        if let Some(raw) = ai_move.raw_board {
            effects.push(Effect::Log(raw));
        }
        if self.phase == Phase::Active(ActiveTurn::AwaitingHuman) {
            effects.push(Effect::Status(Status::YourTurn));
        }
        effects
    }

    fn on_illegal(&mut self, illegal: Illegal) -> Vec<Effect> {
        if !self.is_active() {
            warn!("Ignoring illegal while {:?}.", self.phase);
            return vec![];
        }
        let reason = illegal
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "illegal move".to_string());
        info!("Move rejected: {reason}");

        let tentative = self.tentative.take();
        if tentative.is_none() {
            warn!("Got illegal without an outstanding move.");
        }
        match self.authoritative(illegal.board) {
            Some(board) => self.board = board,
            None => {
                if let Some(point) = tentative.and_then(|t| t.mv.point()) {
                    if let Err(e) = self.board.set(point, None) {
                        warn!("Could not roll back {point}: {e}");
                    }
                }
            }
        }
        self.last_move = None;
        self.turn = self.config.human_color();
        self.phase = Phase::Active(self.settle());

        vec![
            Effect::Log(format!("[illegal] {reason}")),
            Effect::StopThinking,
            Effect::Redraw,
            Effect::Alert(format!("Your move is not legal: {reason}")),
        ]
    }

    fn on_error(&mut self, reason: String) -> Vec<Effect> {
        warn!("Server error: {reason}");
        vec![Effect::Status(Status::ServerError(reason))]
    }

    /// Boards of the wrong size are not trusted.
    fn authoritative(&self, board: Option<BoardGrid>) -> Option<BoardGrid> {
        let board = board?;
        if board.size() == self.config.lines() {
            Some(board)
        } else {
            warn!(
                "Server sent a {0}x{0} board for a {1}x{1} game.",
                board.size(),
                self.config.lines()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::protocol::{Illegal, ENGINE_NOT_READY};
    use crate::session::TentativeMove;
    use crate::types::Point;

    const OPEN: crate::channel::ConnectionState = crate::channel::ConnectionState::Open;

    fn active(mode: PlayMode, human: Color) -> (Session, Vec<Effect>) {
        let config = SessionConfig::new(9, 7.5, mode, human, 5).unwrap();
        let mut session = Session::new(config);
        session.start().unwrap();
        session.on_open().unwrap();
        let effects = session.on_message(ServerMessage::Inited);
        (session, effects)
    }

    fn board_with(stones: &[(u8, u8, Color)]) -> BoardGrid {
        let mut board = BoardGrid::new(9);
        for &(x, y, color) in stones {
            board.set(Point::new(x, y), Some(color)).unwrap();
        }
        board
    }

    #[test]
    fn white_human_asks_the_engine_to_open() {
        let (session, effects) = active(PlayMode::HumanVsEngine, Color::White);
        assert_eq!(session.phase(), Phase::Active(ActiveTurn::AwaitingRemote));
        assert!(effects.contains(&Effect::StartThinking));
        assert!(effects.contains(&Effect::Send(ClientMessage::Genmove(GenmovePayload {
            color: Color::Black
        }))));
    }

    #[test]
    fn black_human_moves_first() {
        let (session, effects) = active(PlayMode::HumanVsEngine, Color::Black);
        assert_eq!(session.phase(), Phase::Active(ActiveTurn::AwaitingHuman));
        assert!(!effects.iter().any(|e| matches!(e, Effect::Send(_))));
    }

    #[test]
    fn inited_twice_is_ignored() {
        let (mut session, _) = active(PlayMode::EngineVsEngine, Color::Black);
        assert!(session.on_message(ServerMessage::Inited).is_empty());
    }

    #[test]
    fn sync_board_promotes_the_tentative_move() {
        let (mut session, _) = active(PlayMode::HumanVsEngine, Color::Black);
        session.play(OPEN, Point::new(2, 2)).unwrap();
        let board = board_with(&[(2, 2, Color::Black)]);
        session.on_message(ServerMessage::SyncBoard(SyncBoard {
            board: Some(board.clone()),
            next: Some(Color::White),
            raw_board: None,
        }));
        assert_eq!(session.board(), &board);
        assert_eq!(session.tentative(), None);
        assert_eq!(session.last_move(), Some(Point::new(2, 2)));
        assert_eq!(session.turn(), Color::White);
        // Still waiting for the engine to answer.
        assert_eq!(session.phase(), Phase::Active(ActiveTurn::AwaitingRemote));
    }

    #[test]
    fn sync_board_without_board_changes_nothing() {
        let (mut session, _) = active(PlayMode::HumanVsHuman, Color::Black);
        session.play(OPEN, Point::new(2, 2)).unwrap();
        let effects = session.on_message(ServerMessage::SyncBoard(SyncBoard {
            board: None,
            next: Some(Color::Black),
            raw_board: None,
        }));
        assert!(effects.is_empty());
        assert!(session.tentative().is_some());
        assert_eq!(session.turn(), Color::White);
    }

    #[test]
    fn wrong_sized_boards_are_not_trusted() {
        let (mut session, _) = active(PlayMode::HumanVsEngine, Color::Black);
        session.play(OPEN, Point::new(0, 0)).unwrap();
        session.on_message(ServerMessage::AiMove(AiMove {
            coord: Move::Place(Point::new(1, 1)),
            board: Some(BoardGrid::new(13)),
            next: None,
            raw_board: None,
        }));
        assert_eq!(session.board().size(), 9);
        assert_eq!(session.board()[Point::new(0, 0)], Some(Color::Black));
        assert_eq!(session.board()[Point::new(1, 1)], Some(Color::White));
        assert_eq!(session.turn(), Color::Black);
    }

    #[test]
    fn ai_move_without_board_is_placed_locally() {
        let (mut session, _) = active(PlayMode::HumanVsEngine, Color::Black);
        session.play(OPEN, Point::new(2, 2)).unwrap();
        let effects = session.on_message(ServerMessage::AiMove(AiMove {
            coord: Move::Place(Point::new(6, 6)),
            board: None,
            next: None,
            raw_board: Some("raw".to_string()),
        }));
        assert_eq!(session.board()[Point::new(6, 6)], Some(Color::White));
        assert_eq!(session.board()[Point::new(2, 2)], Some(Color::Black));
        assert_eq!(session.turn(), Color::Black);
        assert_eq!(session.last_move(), Some(Point::new(6, 6)));
        assert_eq!(session.tentative(), None);
        assert!(effects.contains(&Effect::StopThinking));
        assert!(effects.contains(&Effect::Log("AI: 6,6".to_string())));
        assert!(effects.contains(&Effect::Log("raw".to_string())));
        assert!(session.accepts_input());
    }

    #[test]
    fn ai_pass_clears_the_marker() {
        let (mut session, _) = active(PlayMode::HumanVsEngine, Color::White);
        session.on_message(ServerMessage::AiMove(AiMove {
            coord: Move::Pass,
            board: None,
            next: None,
            raw_board: None,
        }));
        assert_eq!(session.last_move(), None);
        assert_eq!(session.turn(), Color::White);
        assert_eq!(session.board().stone_count(), 0);
        assert_eq!(session.phase(), Phase::Active(ActiveTurn::AwaitingHuman));
    }

    #[test]
    fn engine_vs_engine_keeps_watching() {
        let (mut session, effects) = active(PlayMode::EngineVsEngine, Color::Black);
        assert!(effects.contains(&Effect::Send(ClientMessage::StartAuto)));
        let effects = session.on_message(ServerMessage::AiMove(AiMove {
            coord: Move::Place(Point::new(4, 4)),
            board: None,
            next: None,
            raw_board: None,
        }));
        assert_eq!(session.phase(), Phase::Active(ActiveTurn::AwaitingRemote));
        assert!(!effects.contains(&Effect::Status(Status::YourTurn)));
        assert_eq!(session.turn(), Color::White);
    }

    #[test]
    fn illegal_with_board_replaces() {
        let (mut session, _) = active(PlayMode::HumanVsEngine, Color::Black);
        session.play(OPEN, Point::new(3, 3)).unwrap();
        let board = board_with(&[(5, 5, Color::White)]);
        let effects = session.on_message(ServerMessage::Illegal(Illegal {
            message: Some("ko".to_string()),
            board: Some(board.clone()),
        }));
        assert_eq!(session.board(), &board);
        assert_eq!(session.turn(), Color::Black);
        assert!(effects.contains(&Effect::Alert("Your move is not legal: ko".to_string())));
        assert!(effects.contains(&Effect::StopThinking));
    }

    #[test]
    fn illegal_pass_only_restores_the_turn() {
        let (mut session, _) = active(PlayMode::HumanVsHuman, Color::Black);
        session.play(OPEN, Point::new(3, 3)).unwrap();
        session.on_message(ServerMessage::SyncBoard(SyncBoard {
            board: Some(board_with(&[(3, 3, Color::Black)])),
            next: Some(Color::White),
            raw_board: None,
        }));
        session.pass(OPEN).unwrap();
        assert_eq!(
            session.tentative(),
            Some(TentativeMove {
                color: Color::White,
                mv: Move::Pass
            })
        );
        session.on_message(ServerMessage::Illegal(Illegal {
            message: None,
            board: None,
        }));
        assert_eq!(session.board(), &board_with(&[(3, 3, Color::Black)]));
        assert_eq!(session.turn(), Color::Black);
        assert_eq!(session.last_move(), None);
    }

    #[test]
    fn engine_not_ready_is_transient() {
        let (mut session, _) = active(PlayMode::HumanVsEngine, Color::Black);
        session.play(OPEN, Point::new(1, 1)).unwrap();
        let board = session.board().clone();
        let effects = session.on_message(ServerMessage::Error(ENGINE_NOT_READY.to_string()));
        assert_eq!(effects, vec![Effect::Status(Status::EngineNotReady)]);
        assert_eq!(session.board(), &board);
        assert_eq!(session.turn(), Color::White);
        assert!(session.tentative().is_some());
    }

    #[test]
    fn other_errors_are_shown() {
        let (mut session, _) = active(PlayMode::HumanVsEngine, Color::Black);
        let effects = session.on_message(ServerMessage::Error("boom".to_string()));
        assert_eq!(
            effects,
            vec![Effect::Status(Status::ServerError("boom".to_string()))]
        );
    }

    #[test]
    fn nothing_happens_after_close() {
        let (mut session, _) = active(PlayMode::HumanVsEngine, Color::Black);
        session.on_closed();
        assert!(session.on_message(ServerMessage::Inited).is_empty());
        assert!(session
            .on_message(ServerMessage::Error("late".to_string()))
            .is_empty());
    }
}
