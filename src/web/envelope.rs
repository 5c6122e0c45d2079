// Success-side response bodies. The error body lives with FeedbackError.

use serde::Serialize;
use serde_json::Value;

use crate::backend::BackendAttributes;

/// GET response: what this endpoint is and which checks are on.
#[derive(Debug, Serialize)]
pub struct InfoEnvelope<'a> {
    pub message: &'static str,
    pub core: CoreInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<&'a BackendAttributes>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreInfo {
    pub version: &'static str,
    pub perspective_enabled: bool,
    pub akismet_enabled: bool,
}

/// POST response: whatever the backend returned.
#[derive(Debug, Serialize)]
pub struct SuccessEnvelope<'a> {
    pub result: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<&'a BackendAttributes>,
}
