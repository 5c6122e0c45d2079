// Backend delegate: whatever actually does something with accepted feedback
// (send an email, open an issue, post to chat).
//
// The dispatcher calls the backend only after moderation passes. Its return
// value becomes the `result` of the 201 response; its error, with whatever
// status it carries, becomes the error response.

use std::future::Future;

use async_trait::async_trait;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::FeedbackError;
use crate::pipeline::ModerationContext;

/// Static description of the backend, echoed as `backend` in every
/// success and info response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Anything else the backend wants to advertise.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The caller-supplied feedback handler.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Handle one moderated submission.
    ///
    /// `request` is the head of the inbound request. Headers inserted into
    /// `response_headers` are added to the 201 response.
    async fn handle(
        &self,
        context: ModerationContext,
        request: &Parts,
        response_headers: &mut HeaderMap,
    ) -> Result<Value, FeedbackError>;
}

/// Adapter turning an async closure over the moderation context into a Backend.
pub struct FnBackend<F> {
    f: F,
}

/// Wrap an async closure as a Backend. The closure sees only the context.
pub fn backend_fn<F, Fut>(f: F) -> FnBackend<F>
where
    F: Fn(ModerationContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, FeedbackError>> + Send + 'static,
{
    FnBackend { f }
}

#[async_trait]
impl<F, Fut> Backend for FnBackend<F>
where
    F: Fn(ModerationContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, FeedbackError>> + Send + 'static,
{
    async fn handle(
        &self,
        context: ModerationContext,
        _request: &Parts,
        _response_headers: &mut HeaderMap,
    ) -> Result<Value, FeedbackError> {
        (self.f)(context).await
    }
}

/// Backend used by `feedback-core serve`: writes each submission to the log.
pub struct LogBackend;

impl LogBackend {
    pub fn attributes() -> BackendAttributes {
        BackendAttributes {
            name: Some("log".to_string()),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
            description: Some("Writes accepted feedback to the server log".to_string()),
            extra: Map::new(),
        }
    }
}

#[async_trait]
impl Backend for LogBackend {
    async fn handle(
        &self,
        context: ModerationContext,
        request: &Parts,
        _response_headers: &mut HeaderMap,
    ) -> Result<Value, FeedbackError> {
        info!(
            uri = %request.uri,
            body = %context.input.body,
            extra = %serde_json::Value::Object(context.input.extra.clone()),
            toxicity = ?context.toxicity.map(|t| t.toxicity),
            spam = ?context.akismet.map(|s| s.spam),
            "Feedback received"
        );
        Ok(serde_json::json!({ "status": "ok" }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_skip_missing_fields_and_flatten_extra() {
        let mut extra = Map::new();
        extra.insert("repo".to_string(), Value::String("acme/app".to_string()));
        let attrs = BackendAttributes {
            name: Some("github".to_string()),
            extra,
            ..BackendAttributes::default()
        };
        assert_eq!(
            serde_json::to_value(&attrs).unwrap(),
            serde_json::json!({ "name": "github", "repo": "acme/app" })
        );
    }
}
