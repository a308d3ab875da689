use crate::connection::ConnectionId;
use crate::message::Message;
use futures::Stream;
use log::*;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

/// Queue capacity used when none is configured.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Result of a non-blocking enqueue attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// The queue was full or already closed. The message is gone for this subscriber.
    Dropped,
}

/// Write side of one subscriber's bounded queue.
///
/// Owned by the registry entry. Producers only ever call [`SubscriberChannel::try_send`],
/// which never waits: a full queue drops the new message and keeps what is
/// already queued (drop-newest).
#[derive(Debug)]
pub struct SubscriberChannel {
    id: ConnectionId,
    // `None` once closed. Taking the sender is what lets the reader observe end-of-stream.
    sender: Mutex<Option<mpsc::Sender<Message>>>,
}

impl SubscriberChannel {
    /// Creates a queue holding at most `capacity` pending messages (at least one)
    /// and returns both halves.
    pub fn new(id: ConnectionId, capacity: usize) -> (Self, Subscription) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let channel = Self {
            id: id.clone(),
            sender: Mutex::new(Some(sender)),
        };
        (channel, Subscription { id, receiver })
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn try_send(&self, message: &Message) -> SendOutcome {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = sender.as_ref() else {
            trace!(
                "Dropping message for closed connection {}",
                self.id.as_str()
            );
            return SendOutcome::Dropped;
        };

        match sender.try_send(message.clone()) {
            Ok(()) => SendOutcome::Delivered,
            Err(TrySendError::Full(_)) => {
                debug!(
                    "Queue full for connection {}, dropping message",
                    self.id.as_str()
                );
                SendOutcome::Dropped
            }
            // The reader went away before the registry entry was removed.
            Err(TrySendError::Closed(_)) => SendOutcome::Dropped,
        }
    }

    /// Closes the queue. Returns `true` only for the call that actually closed it.
    ///
    /// Messages already queued stay readable; the reader sees end-of-stream once
    /// they are drained.
    pub fn close(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

/// Read side of one subscriber's queue, drained by exactly one connection writer.
#[derive(Debug)]
pub struct Subscription {
    id: ConnectionId,
    receiver: mpsc::Receiver<Message>,
}

impl Subscription {
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Waits for the next message. `None` means the queue is closed and empty.
    pub async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }

    /// Takes the next message if one is already queued.
    pub fn try_recv(&mut self) -> Option<Message> {
        match self.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Turns the drain into a stream that ends when the queue is closed.
    pub fn into_stream(mut self) -> impl Stream<Item = Message> {
        async_stream::stream! {
            while let Some(message) = self.receiver.recv().await {
                yield message;
            }
        }
    }
}
