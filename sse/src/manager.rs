use crate::channel::DEFAULT_QUEUE_CAPACITY;
use crate::connection::{ConnectionId, ConnectionRegistry};
use crate::message::Message;
use crate::writer::ConnectionWriter;
use log::*;
use std::sync::Arc;

/// Producer-facing side of the hub.
///
/// Built once at startup and shared as `Arc<Manager>`; every subscription and
/// every publish goes through the registry it owns.
#[derive(Debug)]
pub struct Manager {
    registry: Arc<ConnectionRegistry>,
}

impl Manager {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new(queue_capacity)),
        }
    }

    /// Register a new connection and return the writer that will drain it
    pub fn subscribe(&self) -> ConnectionWriter {
        let subscription = self.registry.register();
        info!(
            "Registered new SSE connection {} ({} live)",
            subscription.id().as_str(),
            self.registry.len()
        );
        ConnectionWriter::new(subscription, Arc::clone(&self.registry))
    }

    /// Unregister a connection by ID. Unknown IDs are ignored.
    pub fn unregister_connection(&self, connection_id: &ConnectionId) {
        if self.registry.unregister(connection_id) {
            info!("Unregistered SSE connection {}", connection_id.as_str());
        }
    }

    /// Send a message to every connection that is live right now.
    ///
    /// Never waits on a subscriber: each send is a non-blocking enqueue, and a
    /// subscriber whose queue is full simply misses this message.
    pub fn publish(&self, message: impl Into<Message>) {
        let message = message.into();
        let delivery = self.registry.broadcast(&message);

        debug!(
            "Published message to {} connection(s), dropped for {}",
            delivery.delivered, delivery.dropped
        );
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Close every live connection's queue so each writer drains and exits.
    ///
    /// Subscriptions made afterwards end right after their welcome event.
    pub fn shutdown(&self) -> usize {
        let closed = self.registry.close_all();
        info!("Closed {closed} SSE connection(s) for shutdown");
        closed
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::frame;
    use futures::StreamExt;
    use std::time::{Duration, Instant};
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_single_subscriber_receives_framed_message() {
        let manager = Manager::default();
        let writer = manager.subscribe();

        let (mut client, server) = tokio::io::duplex(1024);
        let handle = tokio::spawn(writer.run(server));

        let welcome = "data: {\"message\": \"Connected\"}\n\n";
        let mut buf = vec![0u8; welcome.len()];
        client.read_exact(&mut buf).await.unwrap();

        manager.publish("x");
        let mut buf = vec![0u8; "data: x\n\n".len()];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, b"data: x\n\n");

        manager.shutdown();
        assert!(handle.await.unwrap().is_ok());
        assert_eq!(manager.connection_count(), 0);
    }

    // The remaining tests read queues straight from the registry instead of
    // going through a transport.
    #[tokio::test]
    async fn test_unregistered_subscriber_misses_later_messages() {
        let manager = Manager::default();
        let mut a = manager.registry().register();
        let mut b = manager.registry().register();

        manager.publish("y");
        assert_eq!(a.try_recv().unwrap().as_str(), "y");
        assert_eq!(b.try_recv().unwrap().as_str(), "y");
        assert!(a.try_recv().is_none());
        assert!(b.try_recv().is_none());

        manager.unregister_connection(a.id());
        manager.publish("z");

        assert!(a.recv().await.is_none());
        assert_eq!(b.try_recv().unwrap().as_str(), "z");
        assert!(b.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_publish_after_immediate_unregister_delivers_nothing() {
        let manager = Manager::default();
        let mut a = manager.registry().register();

        manager.unregister_connection(a.id());
        manager.unregister_connection(a.id());
        manager.publish("w");

        assert!(a.recv().await.is_none());
        assert_eq!(manager.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_is_not_held_up_by_stalled_subscriber() {
        let manager = Manager::new(2);
        let _stalled = manager.registry().register();
        for i in 0..2 {
            manager.publish(format!("fill {i}"));
        }

        let mut fast = manager.registry().register();
        let started = Instant::now();
        for i in 0..100 {
            manager.publish(format!("tick {i}"));
            assert_eq!(fast.try_recv().unwrap().to_string(), format!("tick {i}"));
        }
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_capacity_plus_k_retains_first_capacity_messages() {
        let manager = Manager::new(3);
        let slow = manager.registry().register();

        for i in 0..5 {
            manager.publish(format!("m{i}"));
        }
        manager.shutdown();

        let received: Vec<String> = slow.into_stream().map(|m| m.to_string()).collect().await;
        assert_eq!(received, vec!["m0", "m1", "m2"]);
    }

    #[tokio::test]
    async fn test_round_trip_payload_is_byte_identical() {
        let manager = Manager::default();
        let mut subscriber = manager.registry().register();
        let payload = r##"<div hx-get="/static/fragments/fragment2.html" hx-trigger="load" hx-swap="innerHTML" hx-target="#content"></div>"##;

        manager.publish(payload);

        let received = subscriber.try_recv().unwrap();
        assert_eq!(received.as_str().as_bytes(), payload.as_bytes());
        assert_eq!(frame(received.as_str()), format!("data: {payload}\n\n"));
    }

    #[tokio::test]
    async fn test_concurrent_producers_each_message_arrives_once() {
        let manager = Arc::new(Manager::new(1000));
        let mut subscriber = manager.registry().register();

        let producers: Vec<_> = (0..4)
            .map(|p| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move {
                    for i in 0..50 {
                        manager.publish(format!("{p}-{i}"));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.await.unwrap();
        }
        manager.shutdown();

        let mut received = Vec::new();
        while let Some(message) = subscriber.recv().await {
            received.push(message.to_string());
        }
        assert_eq!(received.len(), 200);

        // Messages from one producer keep their publish order.
        for p in 0..4 {
            let prefix = format!("{p}-");
            let from_producer: Vec<&String> =
                received.iter().filter(|m| m.starts_with(&prefix)).collect();
            let expected: Vec<String> = (0..50).map(|i| format!("{p}-{i}")).collect();
            assert_eq!(
                from_producer,
                expected.iter().collect::<Vec<_>>()
            );
        }
    }

    #[tokio::test]
    async fn test_subscriber_arriving_after_shutdown_ends_after_welcome() {
        let manager = Manager::default();
        let _early = manager.subscribe();
        manager.shutdown();

        let late = manager.subscribe();
        assert_eq!(manager.connection_count(), 0);

        let events = tokio::time::timeout(
            Duration::from_millis(500),
            late.into_event_stream().collect::<Vec<_>>(),
        )
        .await
        .expect("stream of a late subscriber must end");
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_shutdown_reports_closed_connections() {
        let manager = Manager::default();
        let _a = manager.subscribe();
        let _b = manager.subscribe();

        assert_eq!(manager.connection_count(), 2);
        assert_eq!(manager.shutdown(), 2);
        assert_eq!(manager.connection_count(), 0);
    }
}
