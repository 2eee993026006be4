mod page;
mod queue;
mod socket;
mod thinking;
mod utils;

use std::rc::{Rc, Weak};

use serde::Serialize;
use wasm_bindgen::{prelude::wasm_bindgen, JsValue};
use weiqi::config::wants_autostart;
use weiqi::{
    ChannelError, ChannelEvent, ClientMessage, Color, ConnectionChannel, ConnectionState, Effect,
    PlayMode, Point, Session, SessionConfig,
};

use queue::Serialized;
use socket::{BrowserSocket, SocketEvent};
use thinking::ThinkingInterval;

/// This module provides everything the page needs to play one game in the
/// browser. The page draws; all game state lives in here.
///
/// Updates reach the page through `forwardToUi(kind, data)` with the kinds
/// `status` (text), `log` (text) and `board` (a JSON snapshot). Calls back into
/// the client from inside `forwardToUi` are refused: `play` and `pass` return
/// false and `snapshot` fails. Socket events that arrive meanwhile are kept
/// and handled in order right after.

#[wasm_bindgen]
extern "C" {
    fn forwardToUi(kind: &str, data: &str);
}

fn console_log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

/// One game: a session together with the socket and ticker its effects use.
struct BrowserSession {
    session: Session,
    socket: Option<BrowserSocket>,
    thinking: ThinkingInterval,
}

impl BrowserSession {
    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send(message) => {
                    let result = match &self.socket {
                        Some(socket) => socket.send(&message),
                        None => Err(ChannelError::NotOpen),
                    };
                    if let Err(e) = result {
                        console_log(&format!("Could not send {}: {}", message.kind(), e));
                        if matches!(message, ClientMessage::HumanMove(_)) {
                            let effects = self.session.withdraw();
                            self.apply(effects);
                        }
                    }
                }
                Effect::StartThinking => {
                    let started = self
                        .thinking
                        .start(|status| forwardToUi("status", &status.to_string()));
                    if let Err(e) = started {
                        web_sys::console::error_1(&e);
                    }
                }
                Effect::StopThinking => self.thinking.stop(),
                Effect::Status(status) => forwardToUi("status", &status.to_string()),
                Effect::Alert(text) => {
                    if let Err(e) = page::window().and_then(|w| w.alert_with_message(&text)) {
                        web_sys::console::error_1(&e);
                    }
                }
                Effect::Log(text) => forwardToUi("log", &text),
                Effect::Redraw => match serde_json::to_string(&self.session.snapshot()) {
                    Ok(json) => forwardToUi("board", &json),
                    Err(e) => console_log(&format!("Could not encode the board: {e}")),
                },
            }
        }
    }

    fn channel_state(&self) -> ConnectionState {
        self.socket
            .as_ref()
            .map_or(ConnectionState::Disconnected, |socket| socket.state())
    }

    fn on_socket(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::Open => match self.session.on_open() {
                Ok(effects) => self.apply(effects),
                Err(e) => console_log(&e.to_string()),
            },
            SocketEvent::Channel(ChannelEvent::Message(message)) => {
                forwardToUi("log", &format!("[ws] {}", message.kind()));
                let effects = self.session.on_message(message);
                self.apply(effects);
            }
            SocketEvent::Channel(ChannelEvent::Closed) => {
                let effects = self.session.on_closed();
                self.apply(effects);
            }
        }
    }
}

type Shared = Serialized<BrowserSession, SocketEvent>;

/// Socket callbacks only hold a weak reference, a freed client ignores them.
fn dispatch(target: &Weak<Shared>, event: SocketEvent) {
    if let Some(inner) = target.upgrade() {
        inner.push(event);
    }
}

#[wasm_bindgen]
pub struct GoClient {
    inner: Rc<Shared>,
}

#[wasm_bindgen]
impl GoClient {
    /// Starts a new game and connects to the engine server. Replacing a game
    /// means calling `close()` and `free()` on the old client first.
    #[wasm_bindgen(constructor)]
    pub fn new(
        board_size: i32,
        komi: f64,
        mode: &str,
        human_color: &str,
        ai_time: i32,
    ) -> Result<GoClient, JsValue> {
        utils::set_panic_hook();
        let mode = PlayMode::from_wire_name(mode).map_err(|e| e.to_string())?;
        let human_color = Color::from_initial(human_color)
            .ok_or_else(|| format!("Unknown color: {human_color}"))?;
        let config = SessionConfig::new(
            board_size as i64,
            komi,
            mode,
            human_color,
            ai_time as i64,
        )
        .map_err(|e| e.to_string())?;
        start(config)
    }

    /// Places a stone. Returns false if the move was refused locally, in which
    /// case nothing was sent.
    pub fn play(&self, x: u8, y: u8) -> bool {
        self.submit(|session, channel| session.play(channel, Point::new(x, y)))
    }

    pub fn pass(&self) -> bool {
        self.submit(Session::pass)
    }

    /// The current board, turn, marker and input state as JSON.
    pub fn snapshot(&self) -> Result<String, JsValue> {
        self.inner
            .with(|inner| serde_json::to_string(&inner.session.snapshot()))
            .ok_or_else(|| JsValue::from_str("The client is busy."))?
            .map_err(|e| e.to_string().into())
    }

    pub fn close(&self) {
        let closed = self.inner.with(|inner| {
            if let Some(socket) = &inner.socket {
                socket.close();
            }
        });
        if closed.is_none() {
            console_log("The client is busy, not closing.");
        }
    }

    fn submit(
        &self,
        act: impl FnOnce(&mut Session, ConnectionState) -> Result<Vec<Effect>, weiqi::MoveError>,
    ) -> bool {
        let submitted = self.inner.with_mut(|inner| {
            let channel = inner.channel_state();
            act(&mut inner.session, channel).map(|effects| inner.apply(effects))
        });
        match submitted {
            Some(Ok(())) => true,
            Some(Err(e)) => {
                console_log(&format!("Move refused: {e}"));
                false
            }
            None => {
                console_log("Move refused: the client is busy.");
                false
            }
        }
    }
}

fn start(config: SessionConfig) -> Result<GoClient, JsValue> {
    let url = page::socket_url()?;
    console_log(&format!("Connecting to {url}"));

    let mut game = BrowserSession {
        session: Session::new(config),
        socket: None,
        thinking: ThinkingInterval::default(),
    };
    let effects = game.session.start().map_err(|e| e.to_string())?;
    game.apply(effects);
    let inner = Rc::new(Serialized::new(game, BrowserSession::on_socket));

    let target = Rc::downgrade(&inner);
    let socket = BrowserSocket::open(&url, move |event| dispatch(&target, event))?;
    inner
        .with_mut(|game| game.socket = Some(socket))
        .ok_or_else(|| JsValue::from_str("The client is busy."))?;
    Ok(GoClient { inner })
}

/// Form values for a game started from the query string.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AutostartSettings {
    board_size: u8,
    komi: f64,
    mode: PlayMode,
    human_color: Color,
    ai_time: u8,
}

impl From<&SessionConfig> for AutostartSettings {
    fn from(config: &SessionConfig) -> Self {
        AutostartSettings {
            board_size: config.lines(),
            komi: config.komi(),
            mode: config.mode(),
            human_color: config.human_color(),
            ai_time: config.engine_think_seconds(),
        }
    }
}

/// If the page was opened with `autostart=1`, returns the settings from
/// `size`, `komi` and `color` as JSON so the page can fill in its form, and
/// starts that game. Returns nothing otherwise.
#[wasm_bindgen(js_name = "autostart")]
pub fn autostart() -> Result<Option<AutostartGame>, JsValue> {
    utils::set_panic_hook();
    if !wants_autostart(page::query_param) {
        return Ok(None);
    }
    let config = SessionConfig::default().with_query_overrides(page::query_param);
    let settings =
        serde_json::to_string(&AutostartSettings::from(&config)).map_err(|e| e.to_string())?;
    Ok(Some(AutostartGame {
        settings,
        client: Some(start(config)?),
    }))
}

#[wasm_bindgen]
pub struct AutostartGame {
    settings: String,
    client: Option<GoClient>,
}

#[wasm_bindgen]
impl AutostartGame {
    #[wasm_bindgen(getter)]
    pub fn settings(&self) -> String {
        self.settings.clone()
    }

    /// Hands out the running client. Can only be taken once.
    #[wasm_bindgen(js_name = "takeClient")]
    pub fn take_client(&mut self) -> Option<GoClient> {
        self.client.take()
    }
}
