//! Connection handle
//!
//! `Connection` holds the sending side of a per-client channel used by the
//! registry and the session handler to push frames. Sending never blocks: the
//! frame is queued and the writer task performs the socket write. A send fails
//! once the writer task has gone away, which is how a dead peer is detected.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

pub type ConnectionId = String;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("connection {0} is closed")]
    Closed(ConnectionId),

    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    sender: UnboundedSender<WsMessage>,
}

impl Connection {
    /// Create a new connection around a sender channel. The `id` is a UUID
    /// that identifies the connection across registry operations.
    pub fn new(sender: UnboundedSender<WsMessage>) -> Self {
        Self {
            id: format!("conn-{}", Uuid::new_v4()),
            sender,
        }
    }

    /// Convenience constructor returning the receiving half as well.
    pub fn channel() -> (Self, UnboundedReceiver<WsMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Queue a raw frame for delivery.
    pub fn send(&self, frame: WsMessage) -> Result<(), SendError> {
        self.sender
            .send(frame)
            .map_err(|_| SendError::Closed(self.id.clone()))
    }

    /// Serialize `msg` as a JSON text frame and queue it.
    pub fn send_json<T: Serialize>(&self, msg: &T) -> Result<(), SendError> {
        let text = serde_json::to_string(msg)?;
        self.send(WsMessage::text(text))
    }

    /// Ask the writer task to send a close frame and stop. Closing an already
    /// closed connection is a no-op.
    pub fn close(&self) {
        let _ = self.sender.send(WsMessage::Close(None));
    }

    /// Whether the writer side has gone away.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
