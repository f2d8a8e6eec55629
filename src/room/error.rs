use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoomError {
    #[error("topic {0:?} is full")]
    Full(String),

    #[error("connection is not a participant of topic {0:?}")]
    NotJoined(String),

    #[error("topic name must not be empty")]
    EmptyTopic,
}
