//! The native `ConnectionChannel`: one websocket to the engine server, driven
//! by a reader task and a writer task.
//!
//! Outgoing messages go through an unbounded queue into the writer task, so
//! `send` never blocks. The reader task decodes every text frame and forwards
//! it as a `ChannelEvent`. When the socket ends for whatever reason, the reader
//! marks the channel as closed and delivers `ChannelEvent::Closed` last.

use async_tungstenite::tokio::connect_async;
use async_tungstenite::tungstenite::{Error as WsError, Message};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::AbortHandle;

use weiqi::{ChannelError, ChannelEvent, ClientMessage, ConnectionChannel, ConnectionState, ServerMessage};

pub struct SocketChannel {
    to_socket: mpsc::UnboundedSender<Message>,
    state: Arc<watch::Sender<ConnectionState>>,
    writer_task_abort_handle: AbortHandle,
    reader_task_abort_handle: AbortHandle,
}

impl SocketChannel {
    /// Opens the socket. The returned receiver yields inbound events in the
    /// order they arrived and ends after `ChannelEvent::Closed`.
    pub async fn connect(
        url: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ChannelEvent>), ChannelError> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| ChannelError::Transport(format!("Could not connect to {url}: {e}")))?;
        info!("Connected to {}", url);

        let (sender, receiver) = ws_stream.split();
        let (to_socket, from_session) = mpsc::unbounded_channel();
        let (events, inbound) = mpsc::unbounded_channel();
        let state = Arc::new(watch::Sender::new(ConnectionState::Open));

        let writer_task_abort_handle = tokio::spawn(write(sender, from_session)).abort_handle();
        let reader_task_abort_handle =
            tokio::spawn(read(receiver, events, state.clone())).abort_handle();

        let channel = SocketChannel {
            to_socket,
            state,
            writer_task_abort_handle,
            reader_task_abort_handle,
        };
        Ok((channel, inbound))
    }

    /// Starts the closing handshake. `ChannelEvent::Closed` follows once the
    /// server answered it.
    pub fn close(&self) {
        if self.state() != ConnectionState::Open {
            return;
        }
        info!("Closing websocket.");
        // If the writer is gone, the reader is about to report the close.
        let _ = self.to_socket.send(Message::Close(None));
    }

    /// Closes the socket and waits up to `grace` for `ChannelEvent::Closed`,
    /// so the close frame is out before the tasks are dropped. Messages that
    /// still arrive are discarded. Returns false if the server did not answer
    /// in time.
    pub async fn shutdown(
        &self,
        inbound: &mut mpsc::UnboundedReceiver<ChannelEvent>,
        grace: Duration,
    ) -> bool {
        if self.state() != ConnectionState::Open {
            return true;
        }
        self.close();
        let closed = async {
            while let Some(event) = inbound.recv().await {
                match event {
                    ChannelEvent::Closed => break,
                    ChannelEvent::Message(message) => {
                        debug!("Discarding {} while closing.", message.kind())
                    }
                }
            }
        };
        tokio::time::timeout(grace, closed).await.is_ok()
    }
}

impl ConnectionChannel for SocketChannel {
    fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    fn send(&self, message: &ClientMessage) -> Result<(), ChannelError> {
        if self.state() != ConnectionState::Open {
            return Err(ChannelError::NotOpen);
        }
        let text = message.encode()?;
        debug!("Sending {}: {}", message.kind(), text);
        self.to_socket
            .send(Message::Text(text))
            .map_err(|_| ChannelError::NotOpen)
    }
}

impl Drop for SocketChannel {
    fn drop(&mut self) {
        self.writer_task_abort_handle.abort();
        self.reader_task_abort_handle.abort();
    }
}

/// Forwards queued messages to the socket until the queue or the socket ends.
async fn write<S>(mut sender: S, mut from_session: mpsc::UnboundedReceiver<Message>)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    while let Some(msg) = from_session.recv().await {
        if let Err(e) = sender.send(msg).await {
            error!("Error writing to websocket: {}", e);
            break;
        }
    }
    debug!("Stopped forwarding messages to websocket.");
}

async fn read<S>(
    mut receiver: S,
    events: mpsc::UnboundedSender<ChannelEvent>,
    state: Arc<watch::Sender<ConnectionState>>,
) where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match ServerMessage::decode(&text) {
                Ok(message) => {
                    info!("[ws] {}", message.kind());
                    if events.send(ChannelEvent::Message(message)).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("Dropping frame that is not a message: {}", e),
            },
            Ok(Message::Close(frame)) => {
                debug!("Server closed the websocket: {:?}", frame);
                break;
            }
            // Pings are answered by tungstenite itself.
            Ok(_) => {}
            Err(WsError::ConnectionClosed) => break,
            Err(e) => {
                warn!("Error reading from websocket: {}", e);
                break;
            }
        }
    }
    state.send_replace(ConnectionState::Closed);
    let _ = events.send(ChannelEvent::Closed);
}
