// Request-level error type and the `{ status, message }` envelope it renders to.
//
// Every failure that reaches the client goes through FeedbackError: parse and
// validation errors from the dispatcher, the spam block from the moderation
// pipeline, and whatever the backend delegate returns. Advisory check failures
// never become a FeedbackError; the pipeline absorbs them.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// An error carrying the HTTP status it should be rendered with.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct FeedbackError {
    pub status: StatusCode,
    pub message: String,
    /// Underlying cause, logged in development mode and never sent to the client.
    #[source]
    pub source: Option<anyhow::Error>,
}

/// The JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: u16,
    pub message: String,
}

impl FeedbackError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause without changing the client-facing message.
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn method_not_allowed(method: &str) -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("Method {method} not allowed."),
        )
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, message)
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            status: self.status.as_u16(),
            message: self.message.clone(),
        }
    }

    /// Full failure detail including the cause chain, for operational logs.
    pub fn detail(&self) -> String {
        match &self.source {
            Some(source) => format!("{}: {:?}", self.message, source),
            None => self.message.clone(),
        }
    }
}

/// Errors without an explicit status are server errors.
impl From<anyhow::Error> for FeedbackError {
    fn from(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl IntoResponse for FeedbackError {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope())).into_response()
    }
}
