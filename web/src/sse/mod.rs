//! SSE HTTP handler for the web layer.
//!
//! This module contains only the Axum handler for the `/events` endpoint.
//! The hub itself (Manager, ConnectionRegistry, connection writers) lives in
//! the `sse` crate so producers can publish without depending on `web`.

pub mod handler;
