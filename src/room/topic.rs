//! Topic rooms
//!
//! A `Room` maps connection ids to participants. It enforces nothing on its
//! own; callers go through the registry, which holds the lock and the
//! capacity rule.

use std::collections::HashMap;

use crate::connection::{Connection, ConnectionId};

/// Maximum number of participants in one room.
pub const ROOM_CAPACITY: usize = 2;

#[derive(Debug, Clone)]
pub struct Participant {
    pub connection: Connection,
    /// Empty until the client sends `setUsername`.
    pub username: String,
}

#[derive(Debug, Default)]
pub struct Room {
    pub name: String,
    pub participants: HashMap<ConnectionId, Participant>,
}

impl Room {
    /// Create an empty room with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            participants: HashMap::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= ROOM_CAPACITY
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.participants.contains_key(id)
    }

    /// Add a participant with an empty username. Re-adding an existing
    /// participant keeps its current username.
    pub fn add(&mut self, connection: Connection) {
        self.participants
            .entry(connection.id.clone())
            .or_insert(Participant {
                connection,
                username: String::new(),
            });
    }

    pub fn remove(&mut self, id: &ConnectionId) -> Option<Participant> {
        self.participants.remove(id)
    }
}
