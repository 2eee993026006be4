//! The browser `ConnectionChannel`, a thin layer over `web_sys::WebSocket`.

use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

use weiqi::{ChannelError, ChannelEvent, ClientMessage, ConnectionChannel, ConnectionState, ServerMessage};

/// What the socket reports to its owner.
pub enum SocketEvent {
    Open,
    Channel(ChannelEvent),
}

pub struct BrowserSocket {
    ws: WebSocket,
    _on_open: Closure<dyn FnMut(Event)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_error: Closure<dyn FnMut(Event)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
}

impl BrowserSocket {
    /// Opens a socket to `url`. The handler is called for every event; it must
    /// not drop the socket while it runs.
    pub fn open(url: &str, handler: impl Fn(SocketEvent) + 'static) -> Result<Self, JsValue> {
        let ws = WebSocket::new(url)?;
        let handler: Rc<dyn Fn(SocketEvent)> = Rc::new(handler);

        let on_open = {
            let handler = handler.clone();
            Closure::<dyn FnMut(Event)>::new(move |_: Event| handler(SocketEvent::Open))
        };
        let on_message = {
            let handler = handler.clone();
            Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
                let Some(text) = event.data().as_string() else {
                    web_sys::console::warn_1(&"Ignoring a binary frame.".into());
                    return;
                };
                match ServerMessage::decode(&text) {
                    Ok(message) => handler(SocketEvent::Channel(ChannelEvent::Message(message))),
                    Err(e) => web_sys::console::warn_1(
                        &format!("Dropping frame that is not a message: {e}").into(),
                    ),
                }
            })
        };
        // The browser follows every error with a close event.
        let on_error = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
            web_sys::console::error_1(&"Websocket error.".into());
        });
        let on_close = {
            let handler = handler.clone();
            Closure::<dyn FnMut(CloseEvent)>::new(move |event: CloseEvent| {
                web_sys::console::log_1(
                    &format!("Websocket closed with code {}.", event.code()).into(),
                );
                handler(SocketEvent::Channel(ChannelEvent::Closed))
            })
        };

        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        Ok(BrowserSocket {
            ws,
            _on_open: on_open,
            _on_message: on_message,
            _on_error: on_error,
            _on_close: on_close,
        })
    }

    pub fn close(&self) {
        if let Err(e) = self.ws.close() {
            web_sys::console::error_1(&e);
        }
    }
}

impl ConnectionChannel for BrowserSocket {
    fn state(&self) -> ConnectionState {
        match self.ws.ready_state() {
            WebSocket::CONNECTING => ConnectionState::Connecting,
            WebSocket::OPEN => ConnectionState::Open,
            _ => ConnectionState::Closed,
        }
    }

    fn send(&self, message: &ClientMessage) -> Result<(), ChannelError> {
        if self.state() != ConnectionState::Open {
            return Err(ChannelError::NotOpen);
        }
        let text = message.encode()?;
        self.ws
            .send_with_str(&text)
            .map_err(|e| ChannelError::Transport(format!("{e:?}")))
    }
}

impl Drop for BrowserSocket {
    fn drop(&mut self) {
        // The closures die with this struct, the socket must not call them.
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onerror(None);
        self.ws.set_onclose(None);
        let _ = self.ws.close();
    }
}
