use crate::AppState;
use axum::extract::State;
use axum::response::sse::{KeepAlive, Sse};
use axum::response::IntoResponse;
use log::*;

/// SSE handler that establishes a long-lived connection for real-time updates.
/// The connection is registered for broadcasts until the client goes away or
/// the server shuts down.
#[utoipa::path(
    get,
    path = "/events",
    responses(
        (status = 200, description = "Event stream; first event is {\"message\": \"Connected\"}", content_type = "text/event-stream", body = String),
    )
)]
pub(crate) async fn sse_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let writer = app_state.sse_manager.subscribe();
    debug!("Establishing SSE connection {}", writer.id().as_str());

    let keep_alive = KeepAlive::new().interval(app_state.config.keep_alive_interval());

    // Sse sets `text/event-stream` and `no-cache`; the extra header stops
    // reverse proxies from buffering frames.
    (
        [("x-accel-buffering", "no")],
        Sse::new(writer.into_event_stream()).keep_alive(keep_alive),
    )
}
