//! Desired-subscription set
//!
//! The client remembers which rooms and events the caller wants, whatever
//! the connection is doing. The set is only changed by `join`/`leave`, and
//! is replayed in full each time a connection opens, since the server keeps
//! no subscription state between connections.
//!
//! Rooms are kept in first-join order and each room's events in first-join
//! order. A room with no events stands for the room's unqualified stream.

use roomlink_core::OutboundFrame;

/// One room and the events joined within it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Room identifier
    pub room: String,
    /// Joined events, without duplicates; empty means the whole room
    pub events: Vec<String>,
}

impl Subscription {
    fn new(room: &str) -> Self {
        Self {
            room: room.to_string(),
            events: Vec::new(),
        }
    }
}

/// Ordered, duplicate-free collection of room subscriptions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscriptions {
    rooms: Vec<Subscription>,
}

impl Subscriptions {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a join
    ///
    /// Ensures `room` exists and, if `event` is given, that it is listed
    /// once. Returns `true` if the set changed.
    pub fn join(&mut self, room: &str, event: Option<&str>) -> bool {
        let (entry, created) = match self.rooms.iter().position(|s| s.room == room) {
            Some(index) => (&mut self.rooms[index], false),
            None => {
                self.rooms.push(Subscription::new(room));
                let last = self.rooms.len() - 1;
                (&mut self.rooms[last], true)
            }
        };

        match event {
            Some(event) if !entry.events.iter().any(|e| e == event) => {
                entry.events.push(event.to_string());
                true
            }
            _ => created,
        }
    }

    /// Record a leave
    ///
    /// With an event, removes only that event and keeps the room even if
    /// its event list becomes empty. Without one, removes the whole room.
    /// Returns `true` if the set changed.
    pub fn leave(&mut self, room: &str, event: Option<&str>) -> bool {
        let Some(index) = self.rooms.iter().position(|s| s.room == room) else {
            return false;
        };

        match event {
            Some(event) => {
                let events = &mut self.rooms[index].events;
                let before = events.len();
                events.retain(|e| e != event);
                events.len() != before
            }
            None => {
                self.rooms.remove(index);
                true
            }
        }
    }

    /// Look up one room
    pub fn get(&self, room: &str) -> Option<&Subscription> {
        self.rooms.iter().find(|s| s.room == room)
    }

    /// Check whether a room (and optionally an event within it) is joined
    pub fn contains(&self, room: &str, event: Option<&str>) -> bool {
        match (self.get(room), event) {
            (Some(sub), Some(event)) => sub.events.iter().any(|e| e == event),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Iterate over rooms in join order
    pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.rooms.iter()
    }

    /// Number of rooms
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// True when no room is joined
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Frames to send after a connection opens
    ///
    /// One `join` per (room, event) pair, and a single event-less `join`
    /// for each room with no events. Every room is replayed.
    pub fn replay_frames(&self) -> Vec<OutboundFrame> {
        let mut frames = Vec::new();
        for sub in &self.rooms {
            if sub.events.is_empty() {
                frames.push(OutboundFrame::join(sub.room.as_str(), None));
                continue;
            }
            for event in &sub.events {
                frames.push(OutboundFrame::join(sub.room.as_str(), Some(event.as_str())));
            }
        }
        frames
    }
}
