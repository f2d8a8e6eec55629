use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{EchoPolicy, ROOM_CAPACITY, Room, RoomError, RoomRegistry};
use crate::connection::Connection;
use tungstenite::protocol::Message as WsMessage;

fn text_of(frame: WsMessage) -> String {
    match frame {
        WsMessage::Text(text) => text.as_str().to_string(),
        other => panic!("Expected a text message, got {other:?}"),
    }
}

#[test]
fn test_room_new() {
    let room = Room::new("test_topic");
    assert_eq!(room.name, "test_topic");
    assert!(room.is_empty());
    assert!(!room.is_full());
}

#[test]
fn test_room_add_keeps_existing_username() {
    let mut room = Room::new("test_topic");
    let (conn, _rx) = Connection::channel();
    room.add(conn.clone());
    room.participants.get_mut(&conn.id).unwrap().username = "alice".to_string();

    room.add(conn.clone());
    assert_eq!(room.participants.len(), 1);
    assert_eq!(room.participants[&conn.id].username, "alice");
}

#[test]
fn test_registry_new() {
    let registry = RoomRegistry::default();
    assert_eq!(registry.room_count(), 0);
    assert_eq!(registry.echo_policy(), EchoPolicy::IncludeSender);
}

#[test]
fn test_echo_policy_from_flag() {
    assert_eq!(EchoPolicy::from_echo(true), EchoPolicy::IncludeSender);
    assert_eq!(EchoPolicy::from_echo(false), EchoPolicy::ExcludeSender);
}

#[test]
fn test_join_creates_room_with_empty_username() {
    let registry = RoomRegistry::default();
    let (conn, _rx) = Connection::channel();

    registry.join("T", &conn).unwrap();
    assert_eq!(registry.room_count(), 1);
    assert_eq!(registry.occupancy("T"), 1);
    assert!(registry.contains("T", &conn.id));
    assert_eq!(registry.username_of("T", &conn.id), "");
}

#[test]
fn test_join_rejects_empty_topic() {
    let registry = RoomRegistry::default();
    let (conn, _rx) = Connection::channel();

    assert_eq!(registry.join("", &conn), Err(RoomError::EmptyTopic));
    assert_eq!(registry.room_count(), 0);
}

#[test]
fn test_third_join_is_rejected() {
    let registry = RoomRegistry::default();
    let (a, _rx_a) = Connection::channel();
    let (b, _rx_b) = Connection::channel();
    let (c, _rx_c) = Connection::channel();

    registry.join("T", &a).unwrap();
    registry.join("T", &b).unwrap();
    assert_eq!(registry.join("T", &c), Err(RoomError::Full("T".to_string())));
    assert_eq!(registry.occupancy("T"), ROOM_CAPACITY);
    assert!(!registry.contains("T", &c.id));
}

#[test]
fn test_rejoin_same_room_is_idempotent() {
    let registry = RoomRegistry::default();
    let (a, _rx_a) = Connection::channel();
    let (b, _rx_b) = Connection::channel();
    registry.join("T", &a).unwrap();
    registry.join("T", &b).unwrap();
    registry.set_username("T", &a.id, "alice").unwrap();

    // already a member, so a full room does not reject it
    registry.join("T", &a).unwrap();
    assert_eq!(registry.occupancy("T"), 2);
    assert_eq!(registry.username_of("T", &a.id), "alice");
}

#[test]
fn test_rooms_are_independent() {
    let registry = RoomRegistry::default();
    let conns: Vec<_> = (0..4).map(|_| Connection::channel()).collect();

    registry.join("T1", &conns[0].0).unwrap();
    registry.join("T1", &conns[1].0).unwrap();
    registry.join("T2", &conns[2].0).unwrap();
    registry.join("T2", &conns[3].0).unwrap();
    assert_eq!(registry.room_count(), 2);
    assert_eq!(registry.occupancy("T1"), 2);
    assert_eq!(registry.occupancy("T2"), 2);
}

#[test]
fn test_concurrent_joins_admit_exactly_two() {
    let registry = Arc::new(RoomRegistry::default());
    let accepted = Arc::new(AtomicUsize::new(0));
    let rejected = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(std::sync::Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let registry = registry.clone();
            let accepted = accepted.clone();
            let rejected = rejected.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                let (conn, rx) = Connection::channel();
                barrier.wait();
                match registry.join("race", &conn) {
                    Ok(()) => accepted.fetch_add(1, Ordering::SeqCst),
                    Err(RoomError::Full(_)) => rejected.fetch_add(1, Ordering::SeqCst),
                    Err(e) => panic!("unexpected error: {e}"),
                };
                // keep the receiver alive past the join
                drop(rx);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(accepted.load(Ordering::SeqCst), 2);
    assert_eq!(rejected.load(Ordering::SeqCst), 14);
    assert_eq!(registry.occupancy("race"), 2);
}

#[test]
fn test_set_username_requires_membership() {
    let registry = RoomRegistry::default();
    let (a, _rx_a) = Connection::channel();
    let (b, _rx_b) = Connection::channel();
    registry.join("T", &a).unwrap();

    assert_eq!(
        registry.set_username("T", &b.id, "bob"),
        Err(RoomError::NotJoined("T".to_string()))
    );
    assert_eq!(
        registry.set_username("other", &a.id, "alice"),
        Err(RoomError::NotJoined("other".to_string()))
    );
    assert_eq!(registry.room_count(), 1);
}

#[test]
fn test_set_username_overwrites() {
    let registry = RoomRegistry::default();
    let (a, _rx_a) = Connection::channel();
    let (b, _rx_b) = Connection::channel();
    registry.join("T", &a).unwrap();
    registry.join("T", &b).unwrap();

    registry.set_username("T", &a.id, "alice").unwrap();
    registry.set_username("T", &a.id, "alicia").unwrap();
    // no uniqueness between the two participants
    registry.set_username("T", &b.id, "alicia").unwrap();

    assert_eq!(registry.username_of("T", &a.id), "alicia");
    assert_eq!(registry.username_of("T", &b.id), "alicia");
}

#[test]
fn test_username_of_unknown_is_empty() {
    let registry = RoomRegistry::default();
    assert_eq!(registry.username_of("nope", &"conn-x".to_string()), "");
}

#[test]
fn test_leave_is_idempotent_and_drops_empty_room() {
    let registry = RoomRegistry::default();
    let (a, _rx_a) = Connection::channel();
    let (b, _rx_b) = Connection::channel();
    registry.join("T", &a).unwrap();
    registry.join("T", &b).unwrap();

    registry.leave("T", &a.id);
    registry.leave("T", &a.id);
    registry.leave("missing", &a.id);
    assert_eq!(registry.occupancy("T"), 1);
    assert!(!registry.contains("T", &a.id));

    registry.leave("T", &b.id);
    assert_eq!(registry.room_count(), 0);
}

#[test]
fn test_leave_frees_a_seat() {
    let registry = RoomRegistry::default();
    let (a, _rx_a) = Connection::channel();
    let (b, _rx_b) = Connection::channel();
    let (c, _rx_c) = Connection::channel();
    registry.join("T", &a).unwrap();
    registry.join("T", &b).unwrap();

    registry.leave("T", &a.id);
    registry.join("T", &c).unwrap();
    assert!(registry.contains("T", &c.id));
}

#[test]
fn test_broadcast_includes_sender_by_default() {
    let registry = RoomRegistry::new(EchoPolicy::IncludeSender);
    let (a, mut rx_a) = Connection::channel();
    let (b, mut rx_b) = Connection::channel();
    registry.join("T", &a).unwrap();
    registry.join("T", &b).unwrap();

    let failures = registry.broadcast("T", &a.id, WsMessage::text("hello"));
    assert!(failures.is_empty());
    assert_eq!(text_of(rx_a.try_recv().unwrap()), "hello");
    assert_eq!(text_of(rx_b.try_recv().unwrap()), "hello");
}

#[test]
fn test_broadcast_excluding_sender() {
    let registry = RoomRegistry::new(EchoPolicy::ExcludeSender);
    let (a, mut rx_a) = Connection::channel();
    let (b, mut rx_b) = Connection::channel();
    registry.join("T", &a).unwrap();
    registry.join("T", &b).unwrap();

    let failures = registry.broadcast("T", &a.id, WsMessage::text("hello"));
    assert!(failures.is_empty());
    assert!(rx_a.try_recv().is_err());
    assert_eq!(text_of(rx_b.try_recv().unwrap()), "hello");
}

#[test]
fn test_broadcast_does_not_cross_rooms() {
    let registry = RoomRegistry::default();
    let (a, _rx_a) = Connection::channel();
    let (b, mut rx_b) = Connection::channel();
    registry.join("T1", &a).unwrap();
    registry.join("T2", &b).unwrap();

    registry.broadcast("T1", &a.id, WsMessage::text("hello"));
    assert!(rx_b.try_recv().is_err());
}

#[test]
fn test_broadcast_to_nonexistent_topic() {
    let registry = RoomRegistry::default();
    let failures = registry.broadcast("missing", &"conn-x".to_string(), WsMessage::text("hi"));
    assert!(failures.is_empty());
}

#[test]
fn test_broadcast_evicts_unreachable_peer() {
    let registry = RoomRegistry::new(EchoPolicy::ExcludeSender);
    let (a, mut rx_a) = Connection::channel();
    let (b, rx_b) = Connection::channel();
    registry.join("T", &a).unwrap();
    registry.join("T", &b).unwrap();

    // Drop the receiver to simulate the writer task dying
    drop(rx_b);

    let failures = registry.broadcast("T", &a.id, WsMessage::text("hello"));
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].connection_id, b.id);
    assert!(!registry.contains("T", &b.id));
    assert!(registry.contains("T", &a.id));

    // the next message reaches no one and reports nothing
    let failures = registry.broadcast("T", &a.id, WsMessage::text("anyone?"));
    assert!(failures.is_empty());
    assert!(rx_a.try_recv().is_err());
}

#[test]
fn test_broadcast_failure_does_not_stop_other_deliveries() {
    let registry = RoomRegistry::new(EchoPolicy::IncludeSender);
    let (a, rx_a) = Connection::channel();
    let (b, mut rx_b) = Connection::channel();
    registry.join("T", &a).unwrap();
    registry.join("T", &b).unwrap();

    // the sender's own channel is the dead one
    drop(rx_a);

    let failures = registry.broadcast("T", &a.id, WsMessage::text("hello"));
    assert_eq!(failures.len(), 1);
    assert_eq!(text_of(rx_b.try_recv().unwrap()), "hello");
    assert_eq!(registry.occupancy("T"), 1);
}

#[test]
fn test_evicting_last_participant_drops_room() {
    let registry = RoomRegistry::new(EchoPolicy::IncludeSender);
    let (a, rx_a) = Connection::channel();
    registry.join("T", &a).unwrap();
    drop(rx_a);

    registry.broadcast("T", &a.id, WsMessage::text("hello"));
    assert_eq!(registry.room_count(), 0);
}

#[test]
fn test_closed_receiver_counts_as_delivery_failure() {
    let registry = RoomRegistry::new(EchoPolicy::ExcludeSender);
    let (a, _rx_a) = Connection::channel();
    let (b, mut rx_b) = Connection::channel();
    registry.join("T", &a).unwrap();
    registry.join("T", &b).unwrap();

    // closing the receiver makes every later send fail
    rx_b.close();
    let failures = registry.broadcast("T", &a.id, WsMessage::text("hello"));
    assert_eq!(failures.len(), 1);
    assert!(!registry.contains("T", &b.id));
    assert!(rx_b.try_recv().is_err());
}
