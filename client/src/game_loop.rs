//! Drives one session from the terminal: socket events and typed commands are
//! fed into the session, and the effects it returns are carried out here.

use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use weiqi::{
    ChannelError, ChannelEvent, ClientMessage, ConnectionChannel, ConnectionState, Effect, Session,
    SessionConfig, Status,
};

use crate::board_view;
use crate::channel::SocketChannel;
use crate::input::{parse_command, Command, HELP};
use crate::thinking::ThinkingTimer;

/// How long quitting waits for the server to answer the close frame.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Owns the session and everything its effects act on.
pub struct Driver<C, W> {
    session: Session,
    channel: Option<C>,
    thinking: ThinkingTimer,
    out: W,
}

impl<C: ConnectionChannel, W: Write> Driver<C, W> {
    pub fn new(session: Session, thinking: ThinkingTimer, out: W) -> Self {
        Driver {
            session,
            channel: None,
            thinking,
            out,
        }
    }

    pub fn attach(&mut self, channel: C) {
        self.channel = Some(channel);
    }

    /// Carries out effects in the order the session returned them.
    pub fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            if let Err(e) = self.apply_one(effect) {
                error!("Could not write to the terminal: {}", e);
            }
        }
    }

    fn apply_one(&mut self, effect: Effect) -> std::io::Result<()> {
        match effect {
            Effect::Send(message) => {
                let result = match &self.channel {
                    Some(channel) => channel.send(&message),
                    None => Err(ChannelError::NotOpen),
                };
                if let Err(e) = result {
                    warn!("Could not send {}: {}", message.kind(), e);
                    if matches!(message, ClientMessage::HumanMove(_)) {
                        let effects = self.session.withdraw();
                        self.apply(effects);
                        writeln!(self.out, "!! Your move was not sent: {e}")?;
                    }
                }
            }
            Effect::StartThinking => self.thinking.start(),
            Effect::StopThinking => self.thinking.stop(),
            Effect::Status(status) => writeln!(self.out, "== {status}")?,
            Effect::Alert(text) => writeln!(self.out, "!! {text}")?,
            Effect::Log(text) => writeln!(self.out, "{text}")?,
            Effect::Redraw => write!(self.out, "{}", board_view::render(&self.session.snapshot()))?,
        }
        self.out.flush()
    }

    pub fn on_event(&mut self, event: ChannelEvent) {
        let effects = match event {
            ChannelEvent::Message(message) => self.session.on_message(message),
            ChannelEvent::Closed => self.session.on_closed(),
        };
        self.apply(effects);
    }

    /// Returns false once the player wants to leave.
    pub fn on_command(&mut self, command: Command) -> bool {
        let channel = self
            .channel
            .as_ref()
            .map_or(ConnectionState::Disconnected, |c| c.state());
        let result = match command {
            Command::Play(point) => self.session.play(channel, point),
            Command::Pass => self.session.pass(channel),
            Command::Help => {
                self.say(HELP);
                return true;
            }
            Command::Quit => return false,
        };
        match result {
            Ok(effects) => self.apply(effects),
            Err(e) => self.say(&e.to_string()),
        }
        true
    }

    fn say(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}") {
            error!("Could not write to the terminal: {}", e);
        }
    }
}

/// Plays one game against the server at `url` until the connection closes or
/// the player quits.
pub async fn run(config: SessionConfig, url: &str) -> anyhow::Result<()> {
    let thinking = ThinkingTimer::new(|secs| println!("== {}", Status::EngineThinking(secs)));
    let mut driver: Driver<SocketChannel, _> =
        Driver::new(Session::new(config), thinking, std::io::stdout());
    let effects = driver.session.start()?;
    driver.apply(effects);

    let mut inbound = match SocketChannel::connect(url).await {
        Ok((channel, inbound)) => {
            driver.attach(channel);
            inbound
        }
        Err(e) => {
            let effects = driver.session.on_closed();
            driver.apply(effects);
            return Err(e.into());
        }
    };
    let effects = driver.session.on_open()?;
    driver.apply(effects);
    driver.say(HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = inbound.recv() => match event {
                Some(ChannelEvent::Closed) | None => {
                    driver.on_event(ChannelEvent::Closed);
                    break;
                }
                Some(event) => driver.on_event(event),
            },
            line = lines.next_line() => match line? {
                Some(line) => match parse_command(&line) {
                    Ok(command) => {
                        if !driver.on_command(command) {
                            info!("Leaving the game.");
                            break;
                        }
                    }
                    Err(e) => driver.say(&e.to_string()),
                },
                // Stdin is gone, keep watching until the server closes.
                None => {
                    info!("Input closed, watching only.");
                    while let Some(event) = inbound.recv().await {
                        driver.on_event(event);
                    }
                    break;
                }
            },
        }
    }

    if let Some(channel) = &driver.channel {
        if !channel.shutdown(&mut inbound, CLOSE_GRACE).await {
            warn!("The server did not answer the close frame in time.");
        }
    }
    let effects = driver.session.on_closed();
    driver.apply(effects);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use weiqi::{Color, PlayMode, Point, ServerMessage};

    struct RecordingChannel {
        state: Cell<ConnectionState>,
        /// The socket died, but the reader did not notice yet.
        broken: Cell<bool>,
        sent: RefCell<Vec<ClientMessage>>,
    }

    impl Default for RecordingChannel {
        fn default() -> Self {
            RecordingChannel {
                state: Cell::new(ConnectionState::Open),
                broken: Cell::new(false),
                sent: RefCell::new(vec![]),
            }
        }
    }

    impl ConnectionChannel for RecordingChannel {
        fn state(&self) -> ConnectionState {
            self.state.get()
        }
        fn send(&self, message: &ClientMessage) -> Result<(), ChannelError> {
            if self.state.get() != ConnectionState::Open || self.broken.get() {
                return Err(ChannelError::NotOpen);
            }
            self.sent.borrow_mut().push(message.clone());
            Ok(())
        }
    }

    fn driver(mode: PlayMode, human: Color) -> Driver<RecordingChannel, Vec<u8>> {
        let config = SessionConfig::new(9, 7.5, mode, human, 5).unwrap();
        let mut driver = Driver::new(Session::new(config), ThinkingTimer::new(|_| {}), vec![]);
        let effects = driver.session.start().unwrap();
        driver.apply(effects);
        driver.attach(RecordingChannel::default());
        let effects = driver.session.on_open().unwrap();
        driver.apply(effects);
        driver
    }

    fn output(driver: &mut Driver<RecordingChannel, Vec<u8>>) -> String {
        String::from_utf8(std::mem::take(&mut driver.out)).unwrap()
    }

    #[tokio::test]
    async fn engine_opens_for_a_white_human() {
        let mut driver = driver(PlayMode::HumanVsEngine, Color::White);
        driver.on_event(ChannelEvent::Message(ServerMessage::Inited));
        assert!(driver.thinking.is_running());
        let sent = driver.channel.as_ref().unwrap().sent.borrow().clone();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].kind(), "genmove");
        assert!(output(&mut driver).contains("== Game started"));

        driver.on_event(ChannelEvent::Message(
            ServerMessage::decode(r#"{"type": "aiMove", "payload": {"coord": {"x": 4, "y": 4}}}"#)
                .unwrap(),
        ));
        assert!(!driver.thinking.is_running());
        let text = output(&mut driver);
        assert!(text.contains("AI: 4,4"));
        assert!(text.contains("(X)"));
        assert!(text.contains("== Your turn"));
    }

    #[tokio::test]
    async fn refused_moves_are_explained() {
        let mut driver = driver(PlayMode::HumanVsEngine, Color::Black);
        driver.on_event(ChannelEvent::Message(ServerMessage::Inited));
        output(&mut driver);

        assert!(driver.on_command(Command::Play(Point::new(2, 2))));
        assert!(driver.on_command(Command::Play(Point::new(3, 3))));
        assert!(output(&mut driver).contains("Waiting for the previous move"));
        assert_eq!(driver.channel.as_ref().unwrap().sent.borrow().len(), 2);

        driver.on_event(ChannelEvent::Message(
            ServerMessage::decode(r#"{"type": "illegal", "payload": {"message": "ko"}}"#).unwrap(),
        ));
        assert!(output(&mut driver).contains("!! Your move is not legal: ko"));
        assert_eq!(driver.session.board().stone_count(), 0);
    }

    #[tokio::test]
    async fn closed_channel_refuses_moves_before_its_event() {
        let mut driver = driver(PlayMode::HumanVsHuman, Color::Black);
        driver.on_event(ChannelEvent::Message(ServerMessage::Inited));
        output(&mut driver);
        let channel = driver.channel.as_ref().unwrap();
        channel.state.set(ConnectionState::Closed);

        assert!(driver.on_command(Command::Play(Point::new(2, 2))));
        assert!(output(&mut driver).contains("The connection is not open."));
        assert_eq!(driver.session.board()[Point::new(2, 2)], None);
        assert_eq!(driver.session.tentative(), None);
        assert_eq!(driver.session.turn(), Color::Black);
        assert_eq!(
            driver.session.pass(ConnectionState::Closed),
            Err(weiqi::MoveError::ChannelNotOpen)
        );
        assert_eq!(driver.channel.as_ref().unwrap().sent.borrow().len(), 1);
    }

    #[tokio::test]
    async fn failed_send_takes_the_move_back() {
        let mut driver = driver(PlayMode::HumanVsEngine, Color::Black);
        driver.on_event(ChannelEvent::Message(ServerMessage::Inited));
        output(&mut driver);
        driver.channel.as_ref().unwrap().broken.set(true);

        assert!(driver.on_command(Command::Play(Point::new(2, 2))));
        assert!(output(&mut driver).contains("!! Your move was not sent"));
        assert_eq!(driver.session.board().stone_count(), 0);
        assert_eq!(driver.session.tentative(), None);
        assert_eq!(driver.session.turn(), Color::Black);
        assert!(!driver.thinking.is_running());
        assert!(driver.session.accepts_input());

        driver.channel.as_ref().unwrap().broken.set(false);
        assert!(driver.on_command(Command::Pass));
        let sent = driver.channel.as_ref().unwrap().sent.borrow().clone();
        assert_eq!(sent.last().map(ClientMessage::kind), Some("humanMove"));
    }

    #[tokio::test]
    async fn close_and_quit() {
        let mut driver = driver(PlayMode::HumanVsHuman, Color::Black);
        assert!(!driver.on_command(Command::Quit));
        driver.on_event(ChannelEvent::Closed);
        assert!(output(&mut driver).contains("== Connection closed"));
        assert!(driver.on_command(Command::Pass));
        assert!(output(&mut driver).contains("The connection is not open."));
    }
}
