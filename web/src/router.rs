use crate::controller::{health_check_controller, notification_controller};
use crate::{sse::handler as sse_handler, AppState};
use axum::{
    routing::{get, post},
    Json, Router,
};

use utoipa::OpenApi;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Event Hub API"
        ),
        paths(
            health_check_controller::health_check,
            notification_controller::send,
            notification_controller::scan,
            sse_handler::sse_handler,
        ),
        tags(
            (name = "event_hub", description = "Real-time event broadcast hub")
        )
    )]
pub struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(sse_routes(app_state.clone()))
        .merge(notification_routes(app_state))
        .merge(api_doc_routes())
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn sse_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/events", get(sse_handler::sse_handler))
        .with_state(app_state)
}

fn notification_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/send", post(notification_controller::send))
        .route("/scans", post(notification_controller::scan))
        .with_state(app_state)
}

fn api_doc_routes() -> Router {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}
