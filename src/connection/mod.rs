//! The `connection` module defines the server-side handle of one connected
//! WebSocket client.
//!
//! A [`Connection`] is the sending half of the client's channel: frames pushed
//! into it are drained by a per-connection writer task onto the socket. It is
//! cheap to clone, so the room registry can keep one per participant while the
//! session handler keeps its own.

pub mod handle;
pub use handle::{Connection, ConnectionId, SendError};
