//! The `error` module defines the top-level error returned while starting and
//! running the relay.
//!
//! Module-specific failures ([`RoomError`](crate::room::RoomError),
//! [`LogError`](crate::persistence::LogError)) live next to the code that
//! raises them and convert into [`RelayError`] at the process boundary.

use thiserror::Error;

use crate::persistence::LogError;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("event log error: {0}")]
    Log(#[from] LogError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
}
