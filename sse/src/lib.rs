//! Server-Sent Events (SSE) broadcast hub.
//!
//! This crate fans notification messages out to every connected subscriber
//! without letting a slow or vanished subscriber hold up the producer or any
//! other subscriber.
//!
//! # Architecture
//!
//! - **Bounded per-subscriber queues**: each connection owns a small FIFO queue.
//!   Publishing is a non-blocking enqueue; when a queue is full the new message
//!   is dropped for that subscriber only.
//! - **Single-lock registry**: register, unregister and broadcast share one
//!   `RwLock`. Unregistering removes the entry and closes its queue in the same
//!   write section, so a publish never sees a half torn-down subscriber.
//! - **Guaranteed teardown**: every connection writer carries a guard that
//!   unregisters it exactly once, whether the queue closed, the transport
//!   failed, the client disconnected or the task panicked.
//! - **Ephemeral messages**: delivery is best-effort. A subscriber that
//!   connects after a publish, or whose queue was full, misses that message.
//!
//! # Message Flow
//!
//! 1. A client opens the `/events` endpoint; the web layer calls
//!    `Manager::subscribe` and serves the returned writer's event stream.
//! 2. The writer emits `data: {"message": "Connected"}` and starts draining.
//! 3. A producer calls `Manager::publish` with an already formatted payload.
//! 4. The registry attempts a non-blocking enqueue for every live connection.
//! 5. Each writer frames its queued messages as `data: <payload>\n\n`.
//!
//! # Example: Publishing a notification
//!
//! ```rust,ignore
//! // In a handler, after something worth telling every client happened
//! app_state.sse_manager.publish(instruction);
//! ```
//!
//! # Modules
//!
//! - `channel`: bounded subscriber queue with non-blocking send
//! - `connection`: `ConnectionRegistry` and the server-generated `ConnectionId`
//! - `manager`: producer-facing broadcaster
//! - `message`: payload type and event-stream framing
//! - `writer`: per-connection writer and its registration guard

pub mod channel;
pub mod connection;
pub mod error;
pub mod manager;
pub mod message;
pub mod writer;

pub use manager::Manager;
pub use message::Message;
