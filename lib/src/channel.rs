//! Shared vocabulary for the socket that connects a session to the engine
//! server. The native client and the browser frontend each bring their own
//! transport and implement `ConnectionChannel` for it.

use crate::protocol::{ClientMessage, ProtocolError, ServerMessage};

/// Key under which the browser remembers a socket url override.
pub const STORED_URL_KEY: &str = "weiqi_ws";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Closed,
}

#[derive(thiserror::Error, Debug)]
pub enum ChannelError {
    #[error("The connection is not open.")]
    NotOpen,
    #[error("Could not encode message: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("Transport error: {0}")]
    Transport(String),
}

/// One socket per session. Sending is fire and forget; a channel that is not
/// `Open` refuses to send.
pub trait ConnectionChannel {
    fn state(&self) -> ConnectionState;
    fn send(&self, message: &ClientMessage) -> Result<(), ChannelError>;
}

/// What a channel hands to the session, in the order it arrived on the socket.
/// `Closed` is delivered exactly once and is always the last event.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelEvent {
    Message(ServerMessage),
    Closed,
}

/// Origin of the page (or configured host) used to derive a default url.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageOrigin {
    pub secure: bool,
    pub host: String,
}

impl PageOrigin {
    /// Takes the protocol the way `window.location.protocol` reports it,
    /// e.g. `"https:"`.
    pub fn new(protocol: &str, host: impl Into<String>) -> Self {
        PageOrigin {
            secure: protocol.trim_end_matches(':').eq_ignore_ascii_case("https"),
            host: host.into(),
        }
    }

    /// Parses `http://host:port` or `https://host`. Anything without a scheme
    /// is taken as a plain host.
    pub fn parse(origin: &str) -> Self {
        match origin.split_once("://") {
            Some((scheme, rest)) => PageOrigin::new(scheme, rest.trim_end_matches('/')),
            None => PageOrigin::new("http", origin.trim_end_matches('/')),
        }
    }

    pub fn socket_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}", scheme, self.host)
    }
}

/// Picks the socket url: an explicit override wins over a stored override,
/// which wins over the page origin. Empty overrides count as missing.
pub fn resolve_socket_url(
    explicit: Option<&str>,
    stored: Option<&str>,
    origin: &PageOrigin,
) -> String {
    explicit
        .filter(|url| !url.is_empty())
        .or_else(|| stored.filter(|url| !url.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| origin.socket_url())
}
