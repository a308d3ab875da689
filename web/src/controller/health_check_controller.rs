use axum::http::StatusCode;
use axum::response::IntoResponse;

/// GET report that the hub is up
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Event hub is up and responding to requests", body = String),
    )
)]
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "healthy")
}
