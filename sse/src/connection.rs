use crate::channel::{SendOutcome, SubscriberChannel, Subscription, DEFAULT_QUEUE_CAPACITY};
use crate::message::Message;
use log::*;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Unique identifier for a connection (server-generated, never sent to clients)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-round delivery counts reported by [`ConnectionRegistry::broadcast`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub dropped: usize,
}

#[derive(Debug, Default)]
struct Connections {
    live: HashMap<ConnectionId, Arc<SubscriberChannel>>,
    // Set by `close_all`; later registrations are handed an already closed queue.
    closed: bool,
}

/// The authoritative set of live connections.
///
/// Register, unregister and every read of the set go through one `RwLock`.
/// Unregistering removes the entry and closes its queue inside the same write
/// section, so a broadcast sees a connection either fully open or not at all.
/// Nothing here awaits or takes a second lock while the map is held.
#[derive(Debug)]
pub struct ConnectionRegistry {
    queue_capacity: usize,
    connections: RwLock<Connections>,
}

impl ConnectionRegistry {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            queue_capacity,
            connections: RwLock::new(Connections::default()),
        }
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Register a new connection with an empty queue and hand back its read side - O(1)
    ///
    /// After [`ConnectionRegistry::close_all`] the queue comes back already closed
    /// and is never added to the live set, so its writer ends right after the
    /// welcome frame.
    pub fn register(&self) -> Subscription {
        let connection_id = ConnectionId::new();
        let (channel, subscription) =
            SubscriberChannel::new(connection_id.clone(), self.queue_capacity);

        let mut connections = self.write();
        if connections.closed {
            channel.close();
            debug!(
                "Registry closed, connection {} will end immediately",
                connection_id.as_str()
            );
            return subscription;
        }
        connections
            .live
            .insert(connection_id.clone(), Arc::new(channel));

        trace!("Registered connection {}", connection_id.as_str());
        subscription
    }

    /// Unregister a connection and close its queue - O(1)
    ///
    /// Returns `false` if the connection was already gone; that is not an error.
    pub fn unregister(&self, connection_id: &ConnectionId) -> bool {
        let mut connections = self.write();
        match connections.live.remove(connection_id) {
            Some(channel) => {
                channel.close();
                true
            }
            None => {
                trace!(
                    "Connection {} already unregistered",
                    connection_id.as_str()
                );
                false
            }
        }
    }

    /// Point-in-time copy of the live set.
    ///
    /// Entries unregistered after the copy is taken are closed, so sending to
    /// them through the copy is a harmless [`SendOutcome::Dropped`].
    pub fn snapshot(&self) -> Vec<Arc<SubscriberChannel>> {
        self.read().live.values().cloned().collect()
    }

    /// Attempt a non-blocking send to every live connection - O(n)
    ///
    /// Runs under the read lock so no unregister can interleave with the round.
    pub fn broadcast(&self, message: &Message) -> Delivery {
        let connections = self.read();
        let mut delivery = Delivery::default();

        for channel in connections.live.values() {
            match channel.try_send(message) {
                SendOutcome::Delivered => delivery.delivered += 1,
                SendOutcome::Dropped => delivery.dropped += 1,
            }
        }

        delivery
    }

    /// Remove and close every connection. Returns how many were live.
    ///
    /// The registry stays closed afterwards: connections registered later are
    /// closed on arrival.
    pub fn close_all(&self) -> usize {
        let mut connections = self.write();
        connections.closed = true;
        let closed = connections.live.len();

        for (_, channel) in connections.live.drain() {
            channel.close();
        }

        closed
    }

    pub fn is_closed(&self) -> bool {
        self.read().closed
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.read().live.contains_key(connection_id)
    }

    pub fn len(&self) -> usize {
        self.read().live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().live.is_empty()
    }

    // Nothing here holds an invariant a panicking holder could leave half-done, so
    // a poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, Connections> {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Connections> {
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
