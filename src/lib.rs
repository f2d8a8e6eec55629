//! # PairSub
//!
//! `pairsub` is a real-time relay that pairs two WebSocket clients in a named
//! topic room, relays their chat messages to each other, and republishes every
//! message to a durable event log.
//!
//! ## Core Modules
//!
//! The library is structured into several modules, each with a distinct responsibility:
//!
//! - `room`: The shared registry of topic rooms, their two participants and usernames.
//! - `connection`: The server-side handle used to push frames to one client.
//! - `config`: Handles loading and managing relay configuration.
//! - `persistence`: The durable event log chat messages are published to.
//! - `transport`: The wire protocol, the per-connection session and the WebSocket server.
//! - `utils`: Shared utilities such as the top-level error type and logging setup.

pub mod config;
pub mod connection;
pub mod persistence;
pub mod room;
pub mod transport;
pub mod utils;
