// GET: describe the endpoint.
//
// Built only from configuration, so repeated calls return identical bodies.

use axum::Json;

use crate::web::envelope::{CoreInfo, InfoEnvelope};
use crate::web::AppState;

pub const INFO_MESSAGE: &str = "Feedback endpoint. POST a JSON object with a \"body\" field.";

pub fn get_info(state: &AppState) -> Json<InfoEnvelope<'_>> {
    Json(InfoEnvelope {
        message: INFO_MESSAGE,
        core: CoreInfo {
            version: env!("CARGO_PKG_VERSION"),
            perspective_enabled: state.config.perspective_enabled,
            akismet_enabled: state.config.akismet_enabled,
        },
        backend: state.backend_attributes.as_deref(),
    })
}
