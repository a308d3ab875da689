use crate::channel::Subscription;
use crate::connection::{ConnectionId, ConnectionRegistry};
use crate::error::Error;
use crate::message::{self, Message, WELCOME_PAYLOAD};
use axum::response::sse::Event;
use futures::Stream;
use log::*;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Lifecycle of one streaming connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Connecting,
    Streaming,
    Closed,
}

/// Unregisters a connection exactly once: on [`RegistrationGuard::release`] or on
/// drop, whichever happens first.
///
/// Dropping covers every exit path the writer can take, including the HTTP layer
/// dropping a stream after the client disconnected and unwinding from a panic.
#[derive(Debug)]
pub struct RegistrationGuard {
    registry: Arc<ConnectionRegistry>,
    connection_id: Option<ConnectionId>,
}

impl RegistrationGuard {
    pub fn new(registry: Arc<ConnectionRegistry>, connection_id: ConnectionId) -> Self {
        Self {
            registry,
            connection_id: Some(connection_id),
        }
    }

    /// Returns `true` if this call removed the registry entry.
    pub fn release(&mut self) -> bool {
        match self.connection_id.take() {
            Some(connection_id) => {
                let removed = self.registry.unregister(&connection_id);
                if removed {
                    info!("Unregistered SSE connection {}", connection_id.as_str());
                }
                removed
            }
            None => false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.connection_id.is_none()
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Drains one subscriber's queue onto its transport.
///
/// Created already registered, in [`WriterState::Connecting`]. It sends the
/// welcome frame on entering [`WriterState::Streaming`], then one frame per
/// queued message, and reaches [`WriterState::Closed`] when the queue is closed
/// or the transport fails.
#[derive(Debug)]
pub struct ConnectionWriter {
    subscription: Subscription,
    guard: RegistrationGuard,
    state: WriterState,
}

impl ConnectionWriter {
    pub(crate) fn new(subscription: Subscription, registry: Arc<ConnectionRegistry>) -> Self {
        let guard = RegistrationGuard::new(registry, subscription.id().clone());
        Self {
            subscription,
            guard,
            state: WriterState::Connecting,
        }
    }

    pub fn id(&self) -> &ConnectionId {
        self.subscription.id()
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Streams raw event-stream frames to `transport`, flushing after each one.
    ///
    /// Returns `Ok(())` once the queue has been closed and drained. A failed write
    /// or flush ends the connection with [`crate::error::ErrorKind::TransportWrite`].
    /// The connection is unregistered before this returns either way.
    pub async fn run<W>(mut self, mut transport: W) -> Result<(), Error>
    where
        W: AsyncWrite + Unpin,
    {
        let result = self.stream_frames(&mut transport).await;
        if let Err(e) = &result {
            warn!(
                "SSE connection {} failed, closing: {e}",
                self.id().as_str()
            );
        }
        self.close();
        result
    }

    async fn stream_frames<W>(&mut self, transport: &mut W) -> Result<(), Error>
    where
        W: AsyncWrite + Unpin,
    {
        self.state = WriterState::Streaming;
        write_frame(transport, &message::welcome_frame()).await?;

        while let Some(message) = self.subscription.recv().await {
            write_frame(transport, &message::frame(message.as_str())).await?;
        }

        debug!("SSE queue closed for connection {}", self.id().as_str());
        Ok(())
    }

    /// Adapts the writer into the event stream served by the HTTP layer.
    ///
    /// The stream ends when the queue is closed. If the HTTP layer drops it first
    /// (the client went away), the guard unregisters the connection.
    pub fn into_event_stream(self) -> impl Stream<Item = Result<Event, Infallible>> {
        let mut writer = self;
        async_stream::stream! {
            writer.state = WriterState::Streaming;
            yield Ok(Event::default().data(WELCOME_PAYLOAD));

            while let Some(message) = writer.subscription.recv().await {
                yield Ok(event_for(&message));
            }

            debug!("SSE queue closed for connection {}", writer.id().as_str());
            writer.close();
        }
    }

    fn close(&mut self) {
        self.state = WriterState::Closed;
        self.guard.release();
    }
}

fn event_for(message: &Message) -> Event {
    Event::default().data(message::normalize_line_breaks(message.as_str()))
}

async fn write_frame<W>(transport: &mut W, frame: &str) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    transport.write_all(frame.as_bytes()).await?;
    transport.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use futures::StreamExt;
    use tokio::io::AsyncReadExt;

    fn registry() -> Arc<ConnectionRegistry> {
        Arc::new(ConnectionRegistry::new(4))
    }

    fn writer(registry: &Arc<ConnectionRegistry>) -> ConnectionWriter {
        ConnectionWriter::new(registry.register(), Arc::clone(registry))
    }

    async fn read_frame<R: tokio::io::AsyncRead + Unpin>(reader: &mut R, expected: &str) {
        let mut buf = vec![0u8; expected.len()];
        reader.read_exact(&mut buf).await.unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), expected);
    }

    #[tokio::test]
    async fn test_run_streams_welcome_then_messages_until_closed() {
        let registry = registry();
        let writer = writer(&registry);
        let id = writer.id().clone();
        assert_eq!(writer.state(), WriterState::Connecting);

        let (mut client, server) = tokio::io::duplex(1024);
        let handle = tokio::spawn(writer.run(server));

        read_frame(&mut client, "data: {\"message\": \"Connected\"}\n\n").await;

        registry.broadcast(&Message::from("x"));
        read_frame(&mut client, "data: x\n\n").await;

        registry.broadcast(&Message::from("two\nlines"));
        read_frame(&mut client, "data: two\ndata: lines\n\n").await;

        registry.unregister(&id);
        assert!(handle.await.unwrap().is_ok());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_run_tears_down_on_transport_failure() {
        let registry = registry();
        let writer = writer(&registry);
        let id = writer.id().clone();

        let (client, server) = tokio::io::duplex(1024);
        drop(client);

        let err = writer.run(server).await.unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::TransportWrite);
        assert!(!registry.contains(&id));
    }

    #[tokio::test]
    async fn test_run_tears_down_when_client_leaves_mid_stream() {
        let registry = registry();
        let writer = writer(&registry);
        let id = writer.id().clone();

        let (mut client, server) = tokio::io::duplex(1024);
        let handle = tokio::spawn(writer.run(server));
        read_frame(&mut client, "data: {\"message\": \"Connected\"}\n\n").await;
        drop(client);

        registry.broadcast(&Message::from("after disconnect"));
        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::TransportWrite);
        assert!(!registry.contains(&id));
    }

    #[tokio::test]
    async fn test_dropping_writer_unregisters() {
        let registry = registry();
        let writer = writer(&registry);
        let id = writer.id().clone();
        assert!(registry.contains(&id));

        drop(writer);
        assert!(!registry.contains(&id));
    }

    #[tokio::test]
    async fn test_panicking_task_still_unregisters() {
        let registry = registry();
        let writer = writer(&registry);
        let id = writer.id().clone();

        let result = tokio::spawn(async move {
            let _writer = writer;
            panic!("boom");
        })
        .await;

        assert!(result.unwrap_err().is_panic());
        assert!(!registry.contains(&id));
    }

    #[tokio::test]
    async fn test_event_stream_yields_welcome_and_messages() {
        let registry = registry();
        let writer = writer(&registry);
        let id = writer.id().clone();

        registry.broadcast(&Message::from("y"));
        registry.broadcast(&Message::from("z"));
        registry.unregister(&id);

        let events: Vec<_> = writer.into_event_stream().collect().await;
        assert_eq!(events.len(), 3);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_dropping_event_stream_unregisters() {
        let registry = registry();
        let writer = writer(&registry);
        let id = writer.id().clone();

        let mut stream = Box::pin(writer.into_event_stream());
        assert!(stream.next().await.is_some());
        assert!(registry.contains(&id));

        drop(stream);
        assert!(!registry.contains(&id));
    }

    #[test]
    fn test_guard_releases_once() {
        let registry = registry();
        let subscription = registry.register();
        let mut guard = RegistrationGuard::new(Arc::clone(&registry), subscription.id().clone());

        assert!(guard.release());
        assert!(guard.is_released());
        assert!(!guard.release());
        drop(guard);
        assert!(registry.is_empty());
    }
}
