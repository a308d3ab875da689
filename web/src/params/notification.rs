use serde::Deserialize;
use utoipa::ToSchema;

/// Form body for `POST /send`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub(crate) struct SendParams {
    /// Name of the fragment every connected client should load, e.g. `fragment1`.
    #[serde(default)]
    pub(crate) fragment: String,
}

/// Form body for `POST /scans`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub(crate) struct ScanParams {
    /// Comma separated employee IDs, e.g. `123, 535`.
    #[serde(default)]
    pub(crate) ids: String,
}
