//! Room registry
//!
//! This module contains the shared registry responsible for:
//! - mapping topic names to rooms and their participants
//! - admitting at most [`ROOM_CAPACITY`] participants per room
//! - storing each participant's username
//! - fanning a frame out to the members of a room
//!
//! Concurrency and usage notes:
//! - One `Mutex` covers the whole table. Every public method takes it for a
//!   single short critical section and never holds it across I/O, so the
//!   registry is shared as a plain `Arc<RoomRegistry>`.
//! - `broadcast` snapshots the recipients under the lock, releases it, queues
//!   the frame to each recipient, and re-locks only to evict recipients whose
//!   channel turned out to be dead. A stalled peer therefore never blocks
//!   other rooms.
//! - A poisoned lock is recovered: no critical section can leave the map
//!   half-updated.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::connection::{Connection, ConnectionId, SendError};
use crate::room::error::RoomError;
use crate::room::topic::{ROOM_CAPACITY, Room};

/// Whether the sender of a chat message also receives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EchoPolicy {
    #[default]
    IncludeSender,
    ExcludeSender,
}

impl EchoPolicy {
    pub fn from_echo(echo_to_sender: bool) -> Self {
        if echo_to_sender {
            EchoPolicy::IncludeSender
        } else {
            EchoPolicy::ExcludeSender
        }
    }
}

/// A recipient that could not be reached during a broadcast. It has already
/// been evicted from the room and its channel closed.
#[derive(Debug)]
pub struct DeliveryFailure {
    pub connection_id: ConnectionId,
    pub error: SendError,
}

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, Room>>,
    echo: EchoPolicy,
}

impl RoomRegistry {
    pub fn new(echo: EchoPolicy) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            echo,
        }
    }

    pub fn echo_policy(&self) -> EchoPolicy {
        self.echo
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<String, Room>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds `connection` to `topic`, creating the room if needed.
    ///
    /// The capacity check and the insert happen under the same lock, so two
    /// racing joiners can never both take the last seat.
    pub fn join(&self, topic: &str, connection: &Connection) -> Result<(), RoomError> {
        if topic.is_empty() {
            return Err(RoomError::EmptyTopic);
        }

        let mut rooms = self.rooms();
        let room = rooms
            .entry(topic.to_string())
            .or_insert_with(|| Room::new(topic));

        if room.contains(&connection.id) {
            return Ok(());
        }
        if room.is_full() {
            return Err(RoomError::Full(topic.to_string()));
        }

        room.add(connection.clone());
        debug!(
            "{} joined {} ({}/{})",
            connection.id,
            topic,
            room.participants.len(),
            ROOM_CAPACITY
        );
        Ok(())
    }

    /// Overwrites the username of a participant of `topic`.
    pub fn set_username(
        &self,
        topic: &str,
        connection_id: &ConnectionId,
        name: &str,
    ) -> Result<(), RoomError> {
        let mut rooms = self.rooms();
        let participant = rooms
            .get_mut(topic)
            .and_then(|room| room.participants.get_mut(connection_id))
            .ok_or_else(|| RoomError::NotJoined(topic.to_string()))?;

        participant.username = name.to_string();
        Ok(())
    }

    /// Removes a participant. Unknown topics and connections are ignored.
    /// A room left empty is dropped from the table.
    pub fn leave(&self, topic: &str, connection_id: &ConnectionId) {
        let mut rooms = self.rooms();
        let now_empty = match rooms.get_mut(topic) {
            Some(room) => {
                if room.remove(connection_id).is_some() {
                    debug!("{connection_id} left {topic}");
                }
                room.is_empty()
            }
            None => return,
        };
        if now_empty {
            rooms.remove(topic);
        }
    }

    /// Username of a participant, or an empty string when it has none or is
    /// not in the room.
    pub fn username_of(&self, topic: &str, connection_id: &ConnectionId) -> String {
        self.rooms()
            .get(topic)
            .and_then(|room| room.participants.get(connection_id))
            .map(|p| p.username.clone())
            .unwrap_or_default()
    }

    /// Queues `frame` to every member of `topic` (the sender included or not
    /// according to the echo policy).
    ///
    /// Each recipient whose channel is gone is removed from the room and
    /// closed; delivery to the others continues. The failures are returned
    /// for the caller to report and are never an error for the sender.
    pub fn broadcast(
        &self,
        topic: &str,
        sender_id: &ConnectionId,
        frame: WsMessage,
    ) -> Vec<DeliveryFailure> {
        let recipients: Vec<Connection> = {
            let rooms = self.rooms();
            let Some(room) = rooms.get(topic) else {
                return Vec::new();
            };
            room.participants
                .values()
                .filter(|p| {
                    self.echo == EchoPolicy::IncludeSender || &p.connection.id != sender_id
                })
                .map(|p| p.connection.clone())
                .collect()
        };

        let mut failures = Vec::new();
        for recipient in recipients {
            if let Err(error) = recipient.send(frame.clone()) {
                failures.push(DeliveryFailure {
                    connection_id: recipient.id.clone(),
                    error,
                });
            }
        }

        if !failures.is_empty() {
            let evicted = self.evict(topic, &failures);
            for connection in evicted {
                warn!("Evicted unreachable {} from {}", connection.id, topic);
                connection.close();
            }
        }

        failures
    }

    fn evict(&self, topic: &str, failures: &[DeliveryFailure]) -> Vec<Connection> {
        let mut rooms = self.rooms();
        let Some(room) = rooms.get_mut(topic) else {
            return Vec::new();
        };

        let evicted: Vec<Connection> = failures
            .iter()
            .filter_map(|f| room.remove(&f.connection_id))
            .map(|p| p.connection)
            .collect();

        if room.is_empty() {
            rooms.remove(topic);
        }
        evicted
    }

    /// Number of participants currently in `topic`.
    pub fn occupancy(&self, topic: &str) -> usize {
        self.rooms()
            .get(topic)
            .map(|room| room.participants.len())
            .unwrap_or(0)
    }

    pub fn contains(&self, topic: &str, connection_id: &ConnectionId) -> bool {
        self.rooms()
            .get(topic)
            .is_some_and(|room| room.contains(connection_id))
    }

    /// Number of rooms with at least one participant.
    pub fn room_count(&self) -> usize {
        self.rooms().len()
    }
}
