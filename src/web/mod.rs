// Web server: the feedback endpoint.
//
// Every path and method lands in `dispatch`, which picks behavior by method:
// GET describes the service, POST runs a submission through moderation and
// the backend. `dispatch` is also the one place errors become responses, so
// every failure renders as the same `{ status, message }` envelope.
//
// CORS is permissive: any origin, GET/POST/OPTIONS. The CORS layer answers
// every OPTIONS request itself, so `dispatch` never sees one.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::{Request, State};
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::backend::{Backend, BackendAttributes};
use crate::config::Config;
use crate::error::FeedbackError;
use crate::pipeline::moderation::ModerationPipeline;

pub mod envelope;
pub mod handlers;

/// Methods advertised on every response.
pub const ALLOWED_METHODS: &str = "GET,POST,OPTIONS";

/// Request headers browsers may send cross-origin.
pub const ALLOWED_HEADERS: &str =
    "content-type,authorization,accept,x-requested-with,x-http-method-override";

/// How long browsers may cache a preflight answer.
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Shared application state threaded through all requests. Read-only.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<ModerationPipeline>,
    pub backend: Arc<dyn Backend>,
    pub backend_attributes: Option<Arc<BackendAttributes>>,
}

impl AppState {
    /// Wire up `backend` behind the moderation pipeline `config` describes.
    pub fn new(config: Config, backend: Arc<dyn Backend>) -> Result<Self> {
        let pipeline = ModerationPipeline::from_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            backend,
            backend_attributes: None,
        })
    }

    /// Replace the configured pipeline (e.g. with in-process checkers).
    pub fn with_pipeline(mut self, pipeline: ModerationPipeline) -> Self {
        self.pipeline = Arc::new(pipeline);
        self
    }

    pub fn with_backend_attributes(mut self, attributes: BackendAttributes) -> Self {
        self.backend_attributes = Some(Arc::new(attributes));
        self
    }
}

/// Start the server and block until it exits.
pub async fn run_server(state: AppState, port: u16, bind: &str) -> Result<()> {
    let stages = state.pipeline.stage_names();
    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!(stages = ?stages, "Feedback endpoint listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static("x-http-method-override"),
        ])
        .max_age(PREFLIGHT_MAX_AGE);

    // CorsLayer only lists methods and headers on preflights; these put them
    // on every response.
    Router::new()
        .fallback(dispatch)
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Entry point for every request, and the only error boundary.
async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let method = request.method().clone();
    match route(&state, request).await {
        Ok(response) => response,
        Err(err) => render_error(&state.config, &method, err),
    }
}

async fn route(state: &AppState, request: Request) -> Result<Response, FeedbackError> {
    let method = request.method().clone();
    match method {
        Method::GET => Ok(handlers::info::get_info(state).into_response()),
        Method::POST => handlers::submit::submit(state, request).await,
        other => Err(FeedbackError::method_not_allowed(other.as_str())),
    }
}

fn render_error(config: &Config, method: &Method, err: FeedbackError) -> Response {
    let status = err.status.as_u16();
    if config.dev_mode {
        error!(status, method = %method, detail = %err.detail(), "Request failed");
    } else if err.status.is_server_error() {
        warn!(status, method = %method, error = %err.message, "Request failed");
    } else {
        debug!(status, method = %method, error = %err.message, "Request rejected");
    }
    err.into_response()
}
