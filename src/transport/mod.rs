//! The `transport` module is responsible for handling network communication
//! with clients over WebSockets.
//!
//! It defines the JSON protocol spoken with clients, the per-connection
//! session state machine, and the WebSocket server that ties a socket to a
//! session.

pub mod message;
pub mod session;
pub mod websocket;

pub use message::{ClientMessage, ServerMessage};
pub use session::{Flow, Session, SessionState};
pub use websocket::{serve, start_websocket_server};
