//! The `room` module holds the process-wide room registry.
//!
//! A room is a named topic shared by at most two participants. The registry
//! is the only shared mutable state in the relay and exposes atomic
//! operations (join, set username, leave, broadcast) instead of its map and
//! lock, so every membership invariant is enforced in one place.

pub mod error;
pub mod registry;
pub mod topic;

pub use error::RoomError;
pub use registry::{DeliveryFailure, EchoPolicy, RoomRegistry};
pub use topic::{Participant, Room, ROOM_CAPACITY};

#[cfg(test)]
mod tests;
