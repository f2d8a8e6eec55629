//! Session handler
//!
//! One `Session` per connection. It interprets the client's intents in
//! order, drives the registry and the event log, and tells the socket loop
//! whether to keep reading.
//!
//! States: `Unjoined` until a topic is accepted, then `Joined` for the rest of
//! the connection (a username is registry data, not a separate state), and
//! `Closed` once the connection is rejected or gone.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::persistence::EventLog;
use crate::room::{RoomError, RoomRegistry};
use crate::transport::message::{
    ClientMessage, EMPTY_TOPIC, SET_TOPIC_FIRST, ServerMessage, TOPIC_ALREADY_SET, TOPIC_FULL,
    log_payload,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unjoined,
    Joined { topic: String },
    Closed,
}

/// What the socket loop should do after a message was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

#[derive(Debug)]
pub struct Session {
    connection: Connection,
    registry: Arc<RoomRegistry>,
    log: Arc<dyn EventLog>,
    state: SessionState,
}

impl Session {
    pub fn new(
        connection: Connection,
        registry: Arc<RoomRegistry>,
        log: Arc<dyn EventLog>,
    ) -> Self {
        Self {
            connection,
            registry,
            log,
            state: SessionState::Unjoined,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_topic(&self) -> Option<&str> {
        match &self.state {
            SessionState::Joined { topic } => Some(topic),
            _ => None,
        }
    }

    /// Parses and handles one text frame. Frames that are not valid protocol
    /// JSON are dropped.
    pub async fn handle_text(&mut self, text: &str) -> Flow {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(msg) => self.handle(msg).await,
            Err(err) => {
                warn!(
                    "Invalid client message from {}: {err} | {}",
                    self.connection.id,
                    text.chars().take(100).collect::<String>()
                );
                Flow::Continue
            }
        }
    }

    pub async fn handle(&mut self, msg: ClientMessage) -> Flow {
        if self.state == SessionState::Closed {
            return Flow::Close;
        }

        match msg {
            ClientMessage::SetTopic { topic } => self.set_topic(topic),
            ClientMessage::SetUsername { data } => self.set_username(data),
            ClientMessage::Message { data } => self.relay(data).await,
            ClientMessage::Unknown => {
                debug!("Ignoring unknown message type from {}", self.connection.id);
                Flow::Continue
            }
        }
    }

    fn set_topic(&mut self, topic: String) -> Flow {
        if self.current_topic().is_some() {
            self.reply_error(TOPIC_ALREADY_SET);
            return Flow::Continue;
        }

        match self.registry.join(&topic, &self.connection) {
            Ok(()) => {
                info!("{} joined topic {}", self.connection.id, topic);
                self.state = SessionState::Joined { topic };
                Flow::Continue
            }
            Err(RoomError::Full(_)) => {
                info!("{} rejected: topic {} is full", self.connection.id, topic);
                self.reject(TOPIC_FULL)
            }
            Err(RoomError::EmptyTopic) => {
                self.reply_error(EMPTY_TOPIC);
                Flow::Continue
            }
            Err(err @ RoomError::NotJoined(_)) => {
                warn!("Unexpected join failure for {}: {err}", self.connection.id);
                Flow::Continue
            }
        }
    }

    fn set_username(&mut self, name: String) -> Flow {
        let SessionState::Joined { topic } = &self.state else {
            return self.reject(SET_TOPIC_FIRST);
        };

        match self
            .registry
            .set_username(topic, &self.connection.id, &name)
        {
            Ok(()) => {
                debug!("{} is now known as {:?}", self.connection.id, name);
                Flow::Continue
            }
            // the registry dropped us, e.g. after a failed delivery
            Err(_) => self.reject(SET_TOPIC_FIRST),
        }
    }

    async fn relay(&mut self, data: String) -> Flow {
        let Some(topic) = self.current_topic().map(str::to_string) else {
            self.reply_error(SET_TOPIC_FIRST);
            return Flow::Continue;
        };

        // evicted after a failed delivery; the seat may already be taken
        if !self.registry.contains(&topic, &self.connection.id) {
            return self.reject(SET_TOPIC_FIRST);
        }

        let username = self.registry.username_of(&topic, &self.connection.id);

        if let Err(err) = self.log.publish(&topic, &log_payload(&username, &data)).await {
            warn!("Failed to publish message on {topic} to the event log: {err}");
        }

        let frame = match ServerMessage::chat(username, data).to_frame() {
            Ok(frame) => frame,
            Err(err) => {
                warn!("Failed to serialize message for {topic}: {err}");
                return Flow::Continue;
            }
        };

        for failure in self.registry.broadcast(&topic, &self.connection.id, frame) {
            warn!(
                "Failed to deliver to {} on {topic}: {}",
                failure.connection_id, failure.error
            );
        }
        debug!("{} relayed a message on {}", self.connection.id, topic);
        Flow::Continue
    }

    /// Leaves the joined room, if any. Called when the connection goes away.
    pub fn disconnect(&mut self) {
        if let SessionState::Joined { topic } =
            std::mem::replace(&mut self.state, SessionState::Closed)
        {
            self.registry.leave(&topic, &self.connection.id);
        }
    }

    fn reject(&mut self, reason: &str) -> Flow {
        self.reply_error(reason);
        self.connection.close();
        self.disconnect();
        Flow::Close
    }

    fn reply_error(&self, reason: &str) {
        if let Err(err) = self.connection.send_json(&ServerMessage::error(reason)) {
            debug!("Could not send error to {}: {err}", self.connection.id);
        }
    }
}
