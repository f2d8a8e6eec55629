//! Wire protocol
//!
//! Every frame is a JSON object discriminated by `type`. Inbound intents are
//! parsed leniently: missing string fields default to empty, and an
//! unrecognised `type` parses as [`ClientMessage::Unknown`] so newer clients
//! do not break older servers.

use serde::{Deserialize, Serialize};
use tungstenite::protocol::Message as WsMessage;

pub const TOPIC_FULL: &str = "Topic is full";
pub const SET_TOPIC_FIRST: &str = "Set a topic first";
pub const EMPTY_TOPIC: &str = "Topic must not be empty";
pub const TOPIC_ALREADY_SET: &str = "Topic already set";

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    SetTopic {
        #[serde(default)]
        topic: String,
    },
    /// The name travels in `data`; the topic is whatever the session joined.
    SetUsername {
        #[serde(default)]
        data: String,
    },
    Message {
        #[serde(default)]
        data: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Error { data: String },
    Message { username: String, data: String },
}

impl ServerMessage {
    pub fn error(reason: &str) -> Self {
        ServerMessage::Error {
            data: reason.to_string(),
        }
    }

    pub fn chat(username: impl Into<String>, data: impl Into<String>) -> Self {
        ServerMessage::Message {
            username: username.into(),
            data: data.into(),
        }
    }

    /// JSON text frame carrying this message.
    pub fn to_frame(&self) -> Result<WsMessage, serde_json::Error> {
        Ok(WsMessage::text(serde_json::to_string(self)?))
    }
}

/// Payload republished to the event log for one chat message.
pub fn log_payload(username: &str, data: &str) -> String {
    format!("{username}: {data}")
}
