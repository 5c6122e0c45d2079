// POST: accept a feedback submission.
//
// Returns 201 with the backend's result on success.
// Returns 400 for unparseable JSON, an unreadable body or a spam block,
// 413 for oversized bodies, 422 when "body" is missing or falsy, and
// whatever the backend's error says.

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Request};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http_body_util::LengthLimitError;
use serde_json::Value;

use crate::error::FeedbackError;
use crate::pipeline::{FeedbackInput, RequestMeta};
use crate::web::envelope::SuccessEnvelope;
use crate::web::AppState;

/// Largest request body accepted, in bytes.
pub const BODY_LIMIT: usize = 1024 * 1024;

pub const BODY_REQUIRED: &str = "\"body\" is required in request payload";
pub const BODY_NOT_STRING: &str = "\"body\" must be a string";

pub async fn submit(state: &AppState, request: Request) -> Result<Response, FeedbackError> {
    let (parts, body) = request.into_parts();

    let bytes = axum::body::to_bytes(body, BODY_LIMIT)
        .await
        .map_err(body_read_error)?;

    let input = parse_feedback(&bytes)?;
    let meta = request_meta(&parts);

    let context = state.pipeline.run(input, &meta).await?;

    let mut headers = HeaderMap::new();
    let result = state.backend.handle(context, &parts, &mut headers).await?;

    Ok((
        StatusCode::CREATED,
        headers,
        Json(SuccessEnvelope {
            result,
            backend: state.backend_attributes.as_deref(),
        }),
    )
        .into_response())
}

/// 413 when the body hit the size limit, 400 for any other read failure
/// (e.g. the client went away mid-upload).
fn body_read_error(err: axum::Error) -> FeedbackError {
    let err = anyhow::Error::new(err);
    let over_limit = err.chain().any(|e| e.is::<LengthLimitError>());

    let rejection = if over_limit {
        FeedbackError::payload_too_large("Body exceeded 1mb limit")
    } else {
        FeedbackError::bad_request("Failed to read request body")
    };
    rejection.with_source(err)
}

/// Parse and validate a submission body.
///
/// "body" must be present and truthy in the JavaScript sense; a truthy
/// non-string value is rejected separately. Every other field is kept.
pub fn parse_feedback(bytes: &Bytes) -> Result<FeedbackInput, FeedbackError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| FeedbackError::bad_request("Invalid JSON").with_source(e))?;

    let Value::Object(mut fields) = value else {
        return Err(FeedbackError::unprocessable(BODY_REQUIRED));
    };

    match fields.remove("body") {
        Some(Value::String(body)) if !body.is_empty() => Ok(FeedbackInput {
            body,
            extra: fields,
        }),
        Some(other) if is_truthy(&other) => Err(FeedbackError::unprocessable(BODY_NOT_STRING)),
        _ => Err(FeedbackError::unprocessable(BODY_REQUIRED)),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Collect what the spam check needs from the request head.
///
/// The client IP is the first X-Forwarded-For entry when present (the
/// service usually sits behind a proxy), else the socket peer address.
pub fn request_meta(parts: &Parts) -> RequestMeta {
    let client_ip = header_value(parts, "x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
        .filter(|ip| !ip.is_empty())
        .or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        });

    RequestMeta {
        origin: header_value(parts, "origin"),
        client_ip,
        user_agent: header_value(parts, "user-agent"),
        referrer: header_value(parts, "referer"),
    }
}

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
