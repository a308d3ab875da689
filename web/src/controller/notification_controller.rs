use axum::extract::State;
use axum::response::IntoResponse;
use axum::Form;

use crate::directory;
use crate::params::notification::{ScanParams, SendParams};
use crate::{AppState, Error};
use log::*;

/// Fragment shown after a scan that matched at least one employee.
const EMPLOYEE_FRAGMENT: &str = "fragment2";
/// Fragment shown after a scan that matched nothing.
const NO_RESULTS_FRAGMENT: &str = "error";

/// Builds the htmx snippet that makes a browser fetch `fragment` into `#content`.
pub(crate) fn fragment_instruction(fragment: &str) -> String {
    format!(
        r##"<div hx-get="/static/fragments/{fragment}.html" hx-trigger="load" hx-swap="innerHTML" hx-target="#content"></div>"##
    )
}

// Fragment names end up inside an HTML attribute on every client.
fn is_valid_fragment_name(fragment: &str) -> bool {
    fragment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// POST tell every connected client to load a fragment
#[utoipa::path(
    post,
    path = "/send",
    request_body(content = SendParams, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Instruction published to all connected clients", body = String),
        (status = 400, description = "Missing or invalid fragment name"),
    )
)]
pub async fn send(
    State(app_state): State<AppState>,
    Form(params): Form<SendParams>,
) -> Result<impl IntoResponse, Error> {
    let fragment = params.fragment;
    if fragment.is_empty() {
        return Err(Error::missing_parameter("Fragment parameter required"));
    }
    if !is_valid_fragment_name(&fragment) {
        return Err(Error::invalid_parameter(format!(
            "Invalid fragment name: {fragment}"
        )));
    }

    debug!("POST /send fragment {fragment}");
    app_state
        .sse_manager
        .publish(fragment_instruction(&fragment));

    Ok(format!("Fragment {fragment} sent to all connected clients"))
}

/// POST look up scanned employee IDs and refresh every client
#[utoipa::path(
    post,
    path = "/scans",
    request_body(content = ScanParams, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Number of employees found; the matching fragment was published", body = String),
    )
)]
pub async fn scan(
    State(app_state): State<AppState>,
    Form(params): Form<ScanParams>,
) -> impl IntoResponse {
    let found = directory::find_all(&params.ids);
    debug!("POST /scans ids [{}] matched {}", params.ids, found.len());

    let fragment = if found.is_empty() {
        NO_RESULTS_FRAGMENT
    } else {
        EMPLOYEE_FRAGMENT
    };
    app_state
        .sse_manager
        .publish(fragment_instruction(fragment));

    format!("Found {} employees", found.len())
}
